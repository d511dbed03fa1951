//! Shared application state handed to every handler: the per-bundle
//! orchestrator (C7), the batch result cache (§4.8), the raw cache/http/
//! analyser handles needed for the domain-direct endpoints, and tunables
//! copied out of `appads-config::Settings`.

use std::sync::Arc;
use std::time::Instant;

use appads_analyser::{Analyser, MatchLimits};
use appads_batch::ResultCache;
use appads_cache::TieredCache;
use appads_config::Settings;
use appads_httpclient::HttpClient;
use appads_orchestrator::{FetchLimits, Orchestrator};
use appads_telemetry::Metrics;
use appads_worker::WorkerPool;

/// Everything a handler needs, cloned cheaply (every field is an `Arc` or
/// `Copy`) and shared across every connection.
#[derive(Clone)]
pub struct ApiState {
    /// Per-bundle resolution pipeline, used by `/api/extract` and the batch
    /// endpoints.
    pub orchestrator: Orchestrator,
    /// The 5-minute complete-batch-result cache.
    pub result_cache: Arc<ResultCache>,
    /// The tiered cache, shared with `orchestrator` and used directly by
    /// `/api/check-app-ads` and `/api/structured-search`, which fetch a
    /// domain's app-ads.txt without going through the store-resolution
    /// chain.
    pub cache: Arc<TieredCache>,
    /// Outbound HTTP client, shared with `orchestrator`.
    pub http: Arc<HttpClient>,
    /// The line parser/search matcher, shared with `orchestrator`.
    pub analyser: Arc<Analyser>,
    /// The bounded worker pool backing `analyser`, surfaced separately so
    /// `/api/stats` and `/health` can report queue depth and active tasks.
    pub worker_pool: Arc<WorkerPool>,
    /// Prometheus collectors.
    pub metrics: Metrics,
    /// Process-lifetime tunables.
    pub settings: Arc<Settings>,
    /// When the process started, for uptime reporting.
    pub started_at: Instant,
}

impl ApiState {
    /// Build the search-match limits from `settings`, reduced to
    /// `max_matches_reduced` while the worker pool reports memory pressure
    /// (§4.5's memory-threshold backoff).
    #[must_use]
    pub fn match_limits(&self) -> MatchLimits {
        let max_total = if self.worker_pool.is_over_budget() {
            self.settings.max_matches_reduced
        } else {
            self.settings.max_matches_total
        };
        MatchLimits {
            max_total,
            max_per_term: self.settings.max_matches_per_term,
        }
    }

    /// Build the app-ads.txt fetch thresholds from `settings`.
    #[must_use]
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            stream_threshold_bytes: self.settings.stream_threshold_bytes,
            sync_threshold_bytes: self.settings.sync_threshold_bytes,
            content_sample_bytes: self.settings.content_sample_bytes,
        }
    }

    /// Seconds elapsed since process start.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_secs()).unwrap_or(u64::MAX)
    }
}
