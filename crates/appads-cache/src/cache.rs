//! Tiered cache: memory → disk → remote, with promotion on a slower-tier hit.

use appads_types::{CacheEntry, TtlClass};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::tiers::{DiskTier, MemoryTier, RemoteTier};

/// Aggregate hit/miss counters across all three tiers, suitable for metrics
/// export.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of reads satisfied by the memory tier.
    pub memory_hits: u64,
    /// Number of reads satisfied by the disk tier.
    pub disk_hits: u64,
    /// Number of reads satisfied by the remote tier.
    pub remote_hits: u64,
    /// Number of reads satisfied by none of the three tiers.
    pub misses: u64,
}

/// Composes the memory, disk, and optional remote tiers into one cache.
///
/// Reads consult memory, then disk, then remote, in that order, returning on
/// the first hit and promoting the value into every faster tier it skipped.
/// Writes go to memory and disk unconditionally, and to remote when the
/// remote tier is present and healthy.
pub struct TieredCache {
    memory: MemoryTier,
    disk: DiskTier,
    remote: Option<RemoteTier>,
    stats: std::sync::Mutex<CacheStats>,
}

impl TieredCache {
    /// Build a cache with the given memory capacity and on-disk directory.
    /// `remote` is `None` when no remote backend is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk cache directory cannot be created.
    pub fn new(
        memory_max_items: usize,
        cache_dir: impl Into<std::path::PathBuf>,
        remote: Option<RemoteTier>,
    ) -> Result<Self, crate::error::CacheError> {
        Ok(Self {
            memory: MemoryTier::new(memory_max_items),
            disk: DiskTier::new(cache_dir)?,
            remote,
            stats: std::sync::Mutex::new(CacheStats::default()),
        })
    }

    /// Fetch and deserialise a value, consulting tiers in order and
    /// promoting on a slower-tier hit. Returns `None` on a full miss or a
    /// deserialisation failure (treated the same as a miss, and logged).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(value) = self.memory.get(key) {
            self.record_hit(|s| &mut s.memory_hits);
            return decode(value, key);
        }

        if let Some(value) = self.disk.get(key) {
            self.record_hit(|s| &mut s.disk_hits);
            self.memory.set(CacheEntry::new(key, value.clone(), TtlClass::Default));
            return decode(value, key);
        }

        if let Some(remote) = &self.remote {
            if let Some(value) = remote.get(key).await {
                self.record_hit(|s| &mut s.remote_hits);
                self.memory.set(CacheEntry::new(key, value.clone(), TtlClass::Default));
                let expiry_ms = (chrono::Utc::now() + TtlClass::Default.duration_as_chrono())
                    .timestamp_millis();
                if let Err(err) = self.disk.set(key, &value, expiry_ms) {
                    warn!(%key, %err, "failed to promote remote cache hit to disk tier");
                }
                return decode(value, key);
            }
        }

        self.record_hit(|s| &mut s.misses);
        None
    }

    /// Serialise and store a value under `key` with the given TTL class,
    /// writing through every present tier.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: TtlClass) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(%key, %err, "failed to serialise cache value, skipping write");
                return;
            }
        };

        let entry = CacheEntry::new(key, json.clone(), ttl);
        let expiry_ms = entry.expiry_time.timestamp_millis();
        self.memory.set(entry);
        if let Err(err) = self.disk.set(key, &json, expiry_ms) {
            warn!(%key, %err, "failed to write cache value to disk tier");
        }
        if let Some(remote) = &self.remote {
            remote.set(key, &json, expiry_ms).await;
        }
    }

    /// Remove `key` from every tier.
    pub async fn delete(&self, key: &str) {
        self.memory.delete(key);
        self.disk.delete(key);
        if let Some(remote) = &self.remote {
            remote.delete(key).await;
        }
    }

    /// Clear the memory and disk tiers. The remote tier is left untouched:
    /// it may be shared with other instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk directory cannot be read.
    pub fn clear_local(&self) -> Result<(), crate::error::CacheError> {
        self.memory.clear();
        self.disk.clear()
    }

    /// Sweep up to `batch_size` disk files, reclaiming expired entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk directory cannot be read.
    pub fn disk_cleanup_batch(&self, batch_size: usize) -> Result<usize, crate::error::CacheError> {
        self.disk.cleanup_batch(batch_size)
    }

    /// A snapshot of the hit/miss counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record_hit(&self, field: impl FnOnce(&mut CacheStats) -> &mut u64) {
        let mut stats = self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *field(&mut stats) += 1;
    }
}

fn decode<T: DeserializeOwned>(value: Value, key: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(%key, %err, "cached value failed to deserialise, treating as a miss");
            None
        }
    }
}

trait TtlClassExt {
    fn duration_as_chrono(self) -> chrono::Duration;
}

impl TtlClassExt for TtlClass {
    fn duration_as_chrono(self) -> chrono::Duration {
        chrono::Duration::from_std(self.duration()).unwrap_or(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        a: u32,
    }

    #[tokio::test]
    async fn round_trips_through_memory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TieredCache::new(10, dir.path(), None).unwrap();
        cache.set("k", &Payload { a: 1 }, TtlClass::Default).await;
        let got: Option<Payload> = cache.get("k").await;
        assert_eq!(got, Some(Payload { a: 1 }));
        assert_eq!(cache.stats().memory_hits, 1);
    }

    #[tokio::test]
    async fn disk_hit_is_promoted_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TieredCache::new(10, dir.path(), None).unwrap();
        cache.set("k", &Payload { a: 2 }, TtlClass::Default).await;
        cache.memory.clear();

        let got: Option<Payload> = cache.get("k").await;
        assert_eq!(got, Some(Payload { a: 2 }));
        assert_eq!(cache.stats().disk_hits, 1);

        // second read should now be a memory hit
        let got_again: Option<Payload> = cache.get("k").await;
        assert_eq!(got_again, Some(Payload { a: 2 }));
        assert_eq!(cache.stats().memory_hits, 1);
    }

    #[tokio::test]
    async fn missing_key_is_a_full_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TieredCache::new(10, dir.path(), None).unwrap();
        let got: Option<Payload> = cache.get("nope").await;
        assert_eq!(got, None);
        assert_eq!(cache.stats().misses, 1);
    }
}
