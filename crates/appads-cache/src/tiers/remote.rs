//! Optional remote key/value tier with health tracking (§4.3).
//!
//! The tier is pluggable: callers supply any [`RemoteBackend`] implementation
//! (a Redis client, an HTTP-backed KV store, etc). This crate ships no
//! concrete backend — only the health-tracking wrapper that falls back to
//! memory+disk automatically when the backend is unhealthy.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CacheError;

/// A pluggable remote key/value backend.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetch a raw JSON value for `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
    /// Store a raw JSON value for `key`, expiring at `expiry_unix_ms`.
    async fn set(&self, key: &str, value: &Value, expiry_unix_ms: i64) -> Result<(), CacheError>;
    /// Remove `key`.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Wraps a [`RemoteBackend`] with consecutive-failure health tracking: after
/// `unhealthy_threshold` consecutive failures the tier is marked unavailable
/// and skipped until a background probe (driven by the cache owner) succeeds.
pub struct RemoteTier {
    backend: Box<dyn RemoteBackend>,
    unhealthy_threshold: u32,
    consecutive_failures: AtomicU32,
    healthy: AtomicBool,
    last_probe: Mutex<Instant>,
    probe_interval: Duration,
}

impl RemoteTier {
    /// Wrap `backend`, marking it unavailable after `unhealthy_threshold`
    /// consecutive failures and re-probing every `probe_interval`.
    #[must_use]
    pub fn new(
        backend: Box<dyn RemoteBackend>,
        unhealthy_threshold: u32,
        probe_interval: Duration,
    ) -> Self {
        Self {
            backend,
            unhealthy_threshold,
            consecutive_failures: AtomicU32::new(0),
            healthy: AtomicBool::new(true),
            last_probe: Mutex::new(Instant::now()),
            probe_interval,
        }
    }

    /// Whether the tier currently accepts reads/writes.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn due_for_probe(&self) -> bool {
        let mut last_probe = self.last_probe.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if last_probe.elapsed() >= self.probe_interval {
            *last_probe = Instant::now();
            true
        } else {
            false
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.healthy.store(true, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.unhealthy_threshold {
            self.healthy.store(false, Ordering::SeqCst);
        }
    }

    /// Read `key`, skipping the call entirely (returning `None`) when the
    /// tier is unhealthy and not due for a re-probe.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.is_healthy() && !self.due_for_probe() {
            return None;
        }
        match self.backend.get(key).await {
            Ok(value) => {
                self.record_success();
                value
            }
            Err(_) => {
                self.record_failure();
                None
            }
        }
    }

    /// Write `key`, skipping the call when the tier is unhealthy and not due
    /// for a re-probe. Failures are swallowed: the remote tier is always
    /// best-effort.
    pub async fn set(&self, key: &str, value: &Value, expiry_unix_ms: i64) {
        if !self.is_healthy() && !self.due_for_probe() {
            return;
        }
        match self.backend.set(key, value, expiry_unix_ms).await {
            Ok(()) => self.record_success(),
            Err(_) => self.record_failure(),
        }
    }

    /// Delete `key`, best-effort.
    pub async fn delete(&self, key: &str) {
        if !self.is_healthy() && !self.due_for_probe() {
            return;
        }
        let _ = self.backend.delete(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct FlakyBackend {
        fail_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RemoteBackend for FlakyBackend {
        async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            if self.fail_calls.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(CacheError::Remote("simulated failure".to_string()))
            } else {
                Ok(None)
            }
        }

        async fn set(&self, _key: &str, _value: &Value, _expiry_unix_ms: i64) -> Result<(), CacheError> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn marks_unhealthy_after_threshold_consecutive_failures() {
        let backend = FlakyBackend {
            fail_calls: Arc::new(AtomicUsize::new(10)),
        };
        let tier = RemoteTier::new(Box::new(backend), 3, Duration::from_secs(30));

        for _ in 0..3 {
            tier.get("k").await;
        }
        assert!(!tier.is_healthy());
    }
}
