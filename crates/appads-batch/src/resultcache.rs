//! The complete, unpaginated batch result cache (§4.8): a short-lived entry
//! keyed by [`batch_cache_key`](crate::cachekey::batch_cache_key).
//!
//! `appads_types::TtlClass` only carries the fixed durations used by the
//! per-bundle pipeline (1h/6h/12h/24h/48h); this cache's 5-minute default
//! (`appads_config::Settings::batch_result_cache_ttl`) has no matching
//! variant, so it keeps its own small in-process map built directly on
//! `CacheEntry` rather than going through `TieredCache::set`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use appads_types::CacheEntry;
use chrono::Utc;

use crate::BatchResult;

/// In-process cache of complete batch results, independent of `TieredCache`.
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry<BatchResult>>>,
    ttl: Duration,
}

impl ResultCache {
    /// Construct an empty cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a cached result, treating an expired entry as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<BatchResult> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if !entry.is_expired_at(Utc::now()) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key` with a fresh expiry.
    pub fn set(&self, key: String, value: BatchResult) {
        let expiry_time = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::minutes(5));
        let entry = CacheEntry {
            expiry_time,
            key: key.clone(),
            value,
        };
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Counts;

    fn sample() -> BatchResult {
        BatchResult {
            results: Vec::new(),
            counts: Counts::default(),
            search_stats: Vec::new(),
            domain_analysis: crate::stats::DomainAnalysis::default(),
        }
    }

    #[test]
    fn a_fresh_entry_is_returned_and_an_expired_one_is_not() {
        let cache = ResultCache::new(Duration::from_secs(300));
        cache.set("k".to_string(), sample());
        assert!(cache.get("k").is_some());

        let mut entries = cache.entries.lock().unwrap();
        entries.get_mut("k").unwrap().expiry_time = Utc::now() - chrono::Duration::seconds(1);
        drop(entries);
        assert!(cache.get("k").is_none());
    }
}
