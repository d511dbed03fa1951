//! Runtime settings loaded once from the process environment at startup.
//!
//! This system keeps no persistent configuration database (§1 non-goals), so
//! `Settings` is process-lifetime: loaded once in `appads-app`'s bootstrap and
//! handed to every component by value or `Arc`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable prefix for every setting below.
const PREFIX: &str = "APPADS_";

/// Process-lifetime runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to (`host:port`).
    pub bind_addr: String,
    /// Directory the on-disk cache tier writes into.
    pub cache_dir: PathBuf,
    /// Maximum items retained in the in-memory cache tier.
    pub memory_max_items: usize,
    /// Interval between on-disk cache cleanup sweeps.
    pub disk_cleanup_interval: Duration,
    /// Number of files processed per on-disk cleanup batch.
    pub disk_cleanup_batch_size: usize,
    /// Consecutive remote-tier failures before it is marked unavailable.
    pub remote_unhealthy_threshold: u32,
    /// Interval between background health probes of the remote cache tier.
    pub remote_probe_interval: Duration,
    /// Minimum resident workers in the bounded worker pool.
    pub worker_min: usize,
    /// Maximum resident workers in the bounded worker pool.
    pub worker_max: usize,
    /// How long an idle worker may sit before being torn down.
    pub worker_idle_timeout: Duration,
    /// Per-task execution deadline before a worker is cancelled.
    pub worker_task_timeout: Duration,
    /// RSS guard, in megabytes, before a worker is terminated.
    pub worker_max_rss_mb: u64,
    /// Heap guard, in megabytes, before a worker is terminated.
    pub worker_max_heap_mb: u64,
    /// Content length at or below which app-ads.txt is parsed synchronously.
    pub sync_threshold_bytes: u64,
    /// HEAD-reported content length above which the stream path is selected.
    pub stream_threshold_bytes: u64,
    /// Maximum response body size accepted from any outbound fetch.
    pub response_size_cap_bytes: u64,
    /// Maximum bytes of raw content retained as a caller-facing sample.
    pub content_sample_bytes: usize,
    /// Maximum overall retained search matches under normal memory pressure.
    pub max_matches_total: usize,
    /// Maximum overall retained search matches while memory-pressured.
    pub max_matches_reduced: usize,
    /// Maximum retained matches for any single search term.
    pub max_matches_per_term: usize,
    /// Per-attempt timeout for a full-body text fetch.
    pub fetch_text_timeout: Duration,
    /// Per-attempt timeout for a HEAD request.
    pub fetch_head_timeout: Duration,
    /// Maximum retry attempts for a single outbound fetch.
    pub fetch_retry_attempts: u32,
    /// Base linear backoff applied between retries (multiplied by attempt).
    pub fetch_retry_backoff: Duration,
    /// Outbound connection pool size.
    pub connection_pool_size: usize,
    /// Maximum bundle ids accepted by a non-export batch request.
    pub batch_max_ids: usize,
    /// Maximum bundle ids accepted by a CSV export request.
    pub csv_max_ids: usize,
    /// Concurrency ceiling for non-export batch processing.
    pub batch_concurrency: usize,
    /// Concurrency ceiling for CSV export processing.
    pub csv_concurrency: usize,
    /// Minimum accepted page size.
    pub page_size_min: usize,
    /// Maximum accepted page size.
    pub page_size_max: usize,
    /// Maximum accepted request body size.
    pub request_json_cap_bytes: usize,
    /// TTL applied to a cached, unpaginated batch result.
    pub batch_result_cache_ttl: Duration,
    /// Grace period allowed to drain in-flight work during shutdown.
    pub shutdown_drain_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            cache_dir: PathBuf::from("./cache"),
            memory_max_items: 1_000,
            disk_cleanup_interval: Duration::from_secs(3_600),
            disk_cleanup_batch_size: 100,
            remote_unhealthy_threshold: 10,
            remote_probe_interval: Duration::from_secs(30),
            worker_min: 1,
            worker_max: 4,
            worker_idle_timeout: Duration::from_secs(120),
            worker_task_timeout: Duration::from_secs(60),
            worker_max_rss_mb: 512,
            worker_max_heap_mb: 256,
            sync_threshold_bytes: 100 * 1024,
            stream_threshold_bytes: 1024 * 1024,
            response_size_cap_bytes: 20 * 1024 * 1024,
            content_sample_bytes: 100 * 1024,
            max_matches_total: 1_000,
            max_matches_reduced: 500,
            max_matches_per_term: 1_000,
            fetch_text_timeout: Duration::from_secs(15),
            fetch_head_timeout: Duration::from_secs(5),
            fetch_retry_attempts: 3,
            fetch_retry_backoff: Duration::from_secs(1),
            connection_pool_size: 64,
            batch_max_ids: 100,
            csv_max_ids: 200,
            batch_concurrency: 4,
            csv_concurrency: 6,
            page_size_min: 5,
            page_size_max: 50,
            request_json_cap_bytes: 1024 * 1024,
            batch_result_cache_ttl: Duration::from_secs(5 * 60),
            shutdown_drain_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, falling back to defaults
    /// for anything unset, and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a set environment variable cannot be parsed
    /// or a numeric setting fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        let mut settings = Self::default();

        if let Some(value) = env_var("BIND_ADDR") {
            settings.bind_addr = value;
        }
        if let Some(value) = env_var("CACHE_DIR") {
            settings.cache_dir = PathBuf::from(value);
        }
        settings.memory_max_items = env_usize("MEMORY_MAX_ITEMS", settings.memory_max_items)?;
        settings.worker_min = env_usize("WORKER_MIN", settings.worker_min)?;
        settings.worker_max = env_usize("WORKER_MAX", settings.worker_max)?;
        settings.sync_threshold_bytes =
            env_u64("SYNC_THRESHOLD_BYTES", settings.sync_threshold_bytes)?;
        settings.stream_threshold_bytes =
            env_u64("STREAM_THRESHOLD_BYTES", settings.stream_threshold_bytes)?;
        settings.response_size_cap_bytes =
            env_u64("RESPONSE_SIZE_CAP_BYTES", settings.response_size_cap_bytes)?;
        settings.batch_max_ids = env_usize("BATCH_MAX_IDS", settings.batch_max_ids)?;
        settings.csv_max_ids = env_usize("CSV_MAX_IDS", settings.csv_max_ids)?;
        settings.batch_concurrency = env_usize("BATCH_CONCURRENCY", settings.batch_concurrency)?;
        settings.csv_concurrency = env_usize("CSV_CONCURRENCY", settings.csv_concurrency)?;
        settings.page_size_max = env_usize("PAGE_SIZE_MAX", settings.page_size_max)?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.worker_min > self.worker_max {
            return Err(ConfigError::OutOfRange {
                name: "WORKER_MIN",
                constraint: "less than or equal to WORKER_MAX",
                value: self.worker_min.to_string(),
            });
        }
        if self.page_size_min > self.page_size_max {
            return Err(ConfigError::OutOfRange {
                name: "PAGE_SIZE_MAX",
                constraint: "greater than or equal to PAGE_SIZE_MIN",
                value: self.page_size_max.to_string(),
            });
        }
        if self.batch_max_ids == 0 || self.csv_max_ids == 0 {
            return Err(ConfigError::OutOfRange {
                name: "BATCH_MAX_IDS",
                constraint: "greater than zero",
                value: self.batch_max_ids.to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &'static str) -> Option<String> {
    env::var(format!("{PREFIX}{name}")).ok()
}

fn env_usize(name: &'static str, default: usize) -> ConfigResult<usize> {
    match env_var(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidEnvValue { name, value }),
    }
}

fn env_u64(name: &'static str, default: u64) -> ConfigResult<u64> {
    match env_var(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidEnvValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_worker_bounds() {
        let mut settings = Settings::default();
        settings.worker_min = 8;
        settings.worker_max = 2;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_batch_cap() {
        let mut settings = Settings::default();
        settings.batch_max_ids = 0;
        assert!(settings.validate().is_err());
    }
}
