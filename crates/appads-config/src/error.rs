//! Configuration validation errors.

use thiserror::Error;

/// Errors raised while loading or validating [`crate::settings::Settings`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("environment variable {name} has an invalid value: {value}")]
    InvalidEnvValue {
        /// The offending variable name.
        name: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },
    /// A numeric setting fell outside its documented bounds.
    #[error("setting {name} must be {constraint}, got {value}")]
    OutOfRange {
        /// The setting name.
        name: &'static str,
        /// A human-readable description of the required range.
        constraint: &'static str,
        /// The rejected value, rendered for diagnostics.
        value: String,
    },
}

/// Convenience alias for fallible configuration construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
