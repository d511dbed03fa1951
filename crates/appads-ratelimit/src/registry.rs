//! Keyed registry of [`KeyLimiter`]s shared across the process.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tokio::time::sleep;

use crate::limiter::{KeyLimiter, RateLimitStatus, WindowLimit};

/// Process-global table of per-resource-key rate limiters.
///
/// Each key (a store kind, or `"app-ads-txt"`) gets its own independent
/// fixed-window counter, created lazily on first use.
pub struct RateLimiterRegistry {
    limiters: Mutex<HashMap<String, KeyLimiter>>,
}

impl RateLimiterRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a slot for `key`, registering it with `default_limit` if this
    /// is the first acquisition seen for that key. Blocks (without holding
    /// any lock across the wait) until a slot becomes available; the slot is
    /// considered released the moment the window rolls, regardless of
    /// whether the caller's subsequent request succeeds.
    pub async fn acquire(&self, key: &str, default_limit: WindowLimit) -> RateLimitStatus {
        loop {
            let status = self.evaluate(key, default_limit);
            if status.allowed {
                return status;
            }
            sleep(status.retry_after.max(std::time::Duration::from_millis(1))).await;
        }
    }

    /// Record that a request against `key` was rejected with `429` or `403`,
    /// halving the effective rate for the remainder of this window and the
    /// next.
    pub fn report_error(&self, key: &str, http_status: u16) {
        if http_status != 429 && http_status != 403 {
            return;
        }
        let mut limiters = self.limiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(limiter) = limiters.get_mut(key) {
            limiter.report_error();
        }
    }

    /// Record that a request against `key` succeeded, nudging a previously
    /// throttled key back toward its full rate.
    pub fn report_success(&self, key: &str) {
        let mut limiters = self.limiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(limiter) = limiters.get_mut(key) {
            limiter.report_success();
        }
    }

    fn evaluate(&self, key: &str, default_limit: WindowLimit) -> RateLimitStatus {
        let now = Instant::now();
        let mut limiters = self.limiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let limiter = limiters
            .entry(key.to_string())
            .or_insert_with(|| KeyLimiter::new(default_limit, now));
        limiter.evaluate(now)
    }
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limit(requests: u32, window_ms: u64) -> WindowLimit {
        WindowLimit {
            requests,
            window: Duration::from_millis(window_ms),
        }
    }

    #[tokio::test]
    async fn acquire_grants_immediately_under_the_cap() {
        let registry = RateLimiterRegistry::new();
        let status = registry.acquire("googleplay", limit(5, 1_000)).await;
        assert!(status.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_the_window_to_roll_when_saturated() {
        let registry = RateLimiterRegistry::new();
        let key = "app-ads-txt";
        let cfg = limit(1, 50);
        assert!(registry.acquire(key, cfg).await.allowed);

        let started = Instant::now();
        assert!(registry.acquire(key, cfg).await.allowed);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn independent_keys_do_not_share_a_window() {
        let registry = RateLimiterRegistry::new();
        assert!(registry.acquire("googleplay", limit(1, 1_000)).await.allowed);
        assert!(registry.acquire("appstore", limit(1, 1_000)).await.allowed);
    }
}
