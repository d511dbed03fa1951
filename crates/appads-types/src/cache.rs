//! TTL classes and the cache entry envelope shared by every cache tier.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Symbolic TTL durations from §4.3 / §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TtlClass {
    /// Successful store-page extraction: 24h.
    StoreSuccess,
    /// Failed store-page extraction: 1h.
    StoreError,
    /// app-ads.txt was found: 12h.
    AppAdsTxtFound,
    /// app-ads.txt was confirmed missing: 6h.
    AppAdsTxtMissing,
    /// app-ads.txt fetch/parse error: 1h.
    AppAdsTxtError,
    /// Cached batch analysis results: 48h.
    AnalysisResults,
    /// Anything not covered by a more specific class: 24h.
    Default,
}

impl TtlClass {
    /// The wall-clock duration this class expires after.
    #[must_use]
    pub const fn duration(self) -> Duration {
        let hours = match self {
            Self::StoreSuccess => 24,
            Self::StoreError => 1,
            Self::AppAdsTxtFound => 12,
            Self::AppAdsTxtMissing => 6,
            Self::AppAdsTxtError => 1,
            Self::AnalysisResults => 48,
            Self::Default => 24,
        };
        Duration::from_secs(hours * 3600)
    }
}

/// A cache record as persisted by any tier: `{key, expiryTime, value}`.
///
/// Invariant: `expiry_time > creation_time`; a present entry whose
/// `expiry_time` has passed must be treated as absent by every reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cache key this entry was stored under.
    pub key: String,
    /// Absolute wall-clock expiry.
    pub expiry_time: DateTime<Utc>,
    /// The cached value.
    pub value: T,
}

impl<T> CacheEntry<T> {
    /// Construct a new entry expiring `ttl` from now.
    #[must_use]
    pub fn new(key: impl Into<String>, value: T, ttl: TtlClass) -> Self {
        let expiry_time = Utc::now()
            + chrono::Duration::from_std(ttl.duration()).unwrap_or(chrono::Duration::zero());
        Self {
            key: key.into(),
            expiry_time,
            value,
        }
    }

    /// Whether this entry has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_durations_match_spec_hours() {
        assert_eq!(TtlClass::StoreSuccess.duration(), Duration::from_secs(24 * 3600));
        assert_eq!(TtlClass::StoreError.duration(), Duration::from_secs(3600));
        assert_eq!(TtlClass::AppAdsTxtFound.duration(), Duration::from_secs(12 * 3600));
        assert_eq!(TtlClass::AppAdsTxtMissing.duration(), Duration::from_secs(6 * 3600));
        assert_eq!(TtlClass::AnalysisResults.duration(), Duration::from_secs(48 * 3600));
    }

    #[test]
    fn entry_expiry_is_strictly_after_creation() {
        let entry = CacheEntry::new("k", 42, TtlClass::StoreError);
        assert!(entry.expiry_time > Utc::now());
    }

    #[test]
    fn expired_entry_is_detected() {
        let mut entry = CacheEntry::new("k", 42, TtlClass::StoreError);
        entry.expiry_time = Utc::now() - chrono::Duration::seconds(1);
        assert!(entry.is_expired_at(Utc::now()));
    }
}
