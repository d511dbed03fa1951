//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges relevant to the resolution pipeline: HTTP
//!   request volume, cache tier hit/miss rates, rate-limiter throttling,
//!   worker-pool saturation and store/app-ads.txt fetch outcomes.

use std::convert::TryFrom;
use std::time::Duration;

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: std::sync::Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    cache_lookups_total: IntCounterVec,
    store_extractions_total: IntCounterVec,
    app_ads_fetch_total: IntCounterVec,
    worker_queue_depth: IntGauge,
    worker_active: IntGauge,
    worker_timeouts_total: IntCounter,
    worker_oom_total: IntCounter,
    rate_limit_throttled_total: IntCounter,
    rate_limit_backoff_events_total: IntCounter,
    batch_jobs_active: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Current depth of the bounded worker pool's pending queue.
    pub worker_queue_depth: i64,
    /// Current number of actively executing worker tasks.
    pub worker_active: i64,
    /// Total worker tasks killed for exceeding their timeout.
    pub worker_timeouts_total: u64,
    /// Total worker tasks killed for exceeding their memory guard.
    pub worker_oom_total: u64,
    /// Total requests throttled by the outbound or inbound rate limiters.
    pub rate_limit_throttled_total: u64,
    /// Total adaptive-backoff escalations triggered by sustained 429s/503s.
    pub rate_limit_backoff_events_total: u64,
    /// Current number of in-flight batch jobs.
    pub batch_jobs_active: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )?;
        let cache_lookups_total = IntCounterVec::new(
            Opts::new(
                "cache_lookups_total",
                "Cache lookups by tier and outcome (hit/miss)",
            ),
            &["tier", "outcome"],
        )?;
        let store_extractions_total = IntCounterVec::new(
            Opts::new(
                "store_extractions_total",
                "Store-page extraction attempts by store and outcome",
            ),
            &["store", "outcome"],
        )?;
        let app_ads_fetch_total = IntCounterVec::new(
            Opts::new(
                "app_ads_fetch_total",
                "app-ads.txt fetch attempts by outcome",
            ),
            &["outcome"],
        )?;
        let worker_queue_depth = IntGauge::with_opts(Opts::new(
            "worker_queue_depth",
            "Pending tasks queued in the bounded worker pool",
        ))?;
        let worker_active = IntGauge::with_opts(Opts::new(
            "worker_active",
            "Worker-pool tasks currently executing",
        ))?;
        let worker_timeouts_total = IntCounter::with_opts(Opts::new(
            "worker_timeouts_total",
            "Worker-pool tasks terminated for exceeding their timeout",
        ))?;
        let worker_oom_total = IntCounter::with_opts(Opts::new(
            "worker_oom_total",
            "Worker-pool tasks terminated for exceeding their memory guard",
        ))?;
        let rate_limit_throttled_total = IntCounter::with_opts(Opts::new(
            "rate_limit_throttled_total",
            "Requests rejected due to rate limiting",
        ))?;
        let rate_limit_backoff_events_total = IntCounter::with_opts(Opts::new(
            "rate_limit_backoff_events_total",
            "Adaptive backoff escalations triggered by sustained upstream throttling",
        ))?;
        let batch_jobs_active = IntGauge::with_opts(Opts::new(
            "batch_jobs_active",
            "Batch processing jobs currently in flight",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(cache_lookups_total.clone()))?;
        registry.register(Box::new(store_extractions_total.clone()))?;
        registry.register(Box::new(app_ads_fetch_total.clone()))?;
        registry.register(Box::new(worker_queue_depth.clone()))?;
        registry.register(Box::new(worker_active.clone()))?;
        registry.register(Box::new(worker_timeouts_total.clone()))?;
        registry.register(Box::new(worker_oom_total.clone()))?;
        registry.register(Box::new(rate_limit_throttled_total.clone()))?;
        registry.register(Box::new(rate_limit_backoff_events_total.clone()))?;
        registry.register(Box::new(batch_jobs_active.clone()))?;

        Ok(Self {
            inner: std::sync::Arc::new(MetricsInner {
                registry,
                http_requests_total,
                cache_lookups_total,
                store_extractions_total,
                app_ads_fetch_total,
                worker_queue_depth,
                worker_active,
                worker_timeouts_total,
                worker_oom_total,
                rate_limit_throttled_total,
                rate_limit_backoff_events_total,
                batch_jobs_active,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record a cache lookup outcome (`"hit"` or `"miss"`) for the given tier.
    pub fn inc_cache_lookup(&self, tier: &str, outcome: &str) {
        self.inner
            .cache_lookups_total
            .with_label_values(&[tier, outcome])
            .inc();
    }

    /// Record a store-page extraction attempt for the given store and outcome.
    pub fn inc_store_extraction(&self, store: &str, outcome: &str) {
        self.inner
            .store_extractions_total
            .with_label_values(&[store, outcome])
            .inc();
    }

    /// Record an app-ads.txt fetch attempt outcome.
    pub fn inc_app_ads_fetch(&self, outcome: &str) {
        self.inner
            .app_ads_fetch_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the worker-pool pending queue depth gauge.
    pub fn set_worker_queue_depth(&self, depth: i64) {
        self.inner.worker_queue_depth.set(depth);
    }

    /// Set the worker-pool active-task gauge.
    pub fn set_worker_active(&self, count: i64) {
        self.inner.worker_active.set(count);
    }

    /// Increment the worker-pool timeout counter.
    pub fn inc_worker_timeout(&self) {
        self.inner.worker_timeouts_total.inc();
    }

    /// Increment the worker-pool memory-guard kill counter.
    pub fn inc_worker_oom(&self) {
        self.inner.worker_oom_total.inc();
    }

    /// Increment the rate limiter throttle counter.
    pub fn inc_rate_limit_throttled(&self) {
        self.inner.rate_limit_throttled_total.inc();
    }

    /// Increment the adaptive-backoff escalation counter.
    pub fn inc_rate_limit_backoff_event(&self) {
        self.inner.rate_limit_backoff_events_total.inc();
    }

    /// Set the in-flight batch job gauge.
    pub fn set_batch_jobs_active(&self, count: i64) {
        self.inner.batch_jobs_active.set(count);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            worker_queue_depth: self.inner.worker_queue_depth.get(),
            worker_active: self.inner.worker_active.get(),
            worker_timeouts_total: self.inner.worker_timeouts_total.get(),
            worker_oom_total: self.inner.worker_oom_total.get(),
            rate_limit_throttled_total: self.inner.rate_limit_throttled_total.get(),
            rate_limit_backoff_events_total: self.inner.rate_limit_backoff_events_total.get(),
            batch_jobs_active: self.inner.batch_jobs_active.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn duration_to_ms_saturates_on_large_values() {
        let duration = Duration::from_secs(u64::MAX / 2);
        assert_eq!(Metrics::duration_to_ms(duration), i64::MAX);
    }

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/api/v1/extract", 200);
        metrics.inc_cache_lookup("memory", "hit");
        metrics.inc_store_extraction("google_play", "success");
        metrics.inc_app_ads_fetch("found");
        metrics.set_worker_queue_depth(7);
        metrics.set_worker_active(3);
        metrics.inc_worker_timeout();
        metrics.inc_worker_oom();
        metrics.inc_rate_limit_throttled();
        metrics.inc_rate_limit_backoff_event();
        metrics.set_batch_jobs_active(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.worker_queue_depth, 7);
        assert_eq!(snapshot.worker_active, 3);
        assert_eq!(snapshot.worker_timeouts_total, 1);
        assert_eq!(snapshot.worker_oom_total, 1);
        assert_eq!(snapshot.rate_limit_throttled_total, 1);
        assert_eq!(snapshot.rate_limit_backoff_events_total, 1);
        assert_eq!(snapshot.batch_jobs_active, 2);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("store_extractions_total"));
        assert!(rendered.contains("app_ads_fetch_total"));
        Ok(())
    }
}
