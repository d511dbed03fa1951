//! # Design
//!
//! - Centralize application-level errors for bootstrap.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for application bootstrap operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: appads_config::ConfigError,
    },
    /// The tiered cache failed to initialise.
    #[error("cache operation failed")]
    Cache {
        /// Operation identifier.
        operation: &'static str,
        /// Source cache error.
        source: appads_cache::CacheError,
    },
    /// Telemetry (logging, metrics) setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: anyhow::Error,
    },
    /// HTTP listener binding or the server loop failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source server error.
        source: anyhow::Error,
    },
    /// IO failed while bootstrapping (e.g. creating the cache directory).
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
    /// A configuration value failed validation at bind time.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Field name that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// The address that was rejected, if applicable.
        addr: Option<SocketAddr>,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: appads_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn cache(operation: &'static str, source: appads_cache::CacheError) -> Self {
        Self::Cache { operation, source }
    }

    pub(crate) fn telemetry(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) fn api_server(operation: &'static str, source: anyhow::Error) -> Self {
        Self::ApiServer { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_helper_builds_the_config_variant() {
        let err = AppError::config(
            "settings.validate",
            appads_config::ConfigError::OutOfRange {
                name: "worker_min",
                constraint: "greater than zero",
                value: "0".to_string(),
            },
        );
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn telemetry_helper_builds_the_telemetry_variant() {
        let err = AppError::telemetry("logging.init", anyhow::anyhow!("boom"));
        assert!(matches!(err, AppError::Telemetry { .. }));
    }
}
