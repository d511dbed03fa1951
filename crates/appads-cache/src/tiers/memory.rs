//! In-memory cache tier: a bounded map with expiry-aware eviction (§4.3).

use std::collections::HashMap;
use std::sync::Mutex;

use appads_types::CacheEntry;
use chrono::Utc;
use serde_json::Value;

/// Bounded, expiry-aware in-memory cache tier.
///
/// On overflow, already-expired entries are evicted first; if that alone
/// does not free enough room, the oldest 20% by expiry time are evicted next.
pub struct MemoryTier {
    entries: Mutex<HashMap<String, CacheEntry<Value>>>,
    max_items: usize,
}

impl MemoryTier {
    /// Construct an empty tier bounded to `max_items`.
    #[must_use]
    pub fn new(max_items: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_items,
        }
    }

    /// Fetch a value, treating an expired entry as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
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

    /// Insert or overwrite `key`, evicting to make room if over capacity.
    pub fn set(&self, entry: CacheEntry<Value>) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(entry.key.clone(), entry);
        if entries.len() > self.max_items {
            evict(&mut entries, self.max_items);
        }
    }

    /// Remove a key unconditionally.
    pub fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.clear();
    }

    /// Current number of resident entries, including any not yet reclaimed
    /// as expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Whether the tier currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn evict(entries: &mut HashMap<String, CacheEntry<Value>>, max_items: usize) {
    let now = Utc::now();
    let expired_keys: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect();
    for key in expired_keys {
        entries.remove(&key);
    }

    if entries.len() <= max_items {
        return;
    }

    let evict_count = (entries.len() * 20) / 100;
    let mut by_expiry: Vec<(String, chrono::DateTime<Utc>)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.expiry_time))
        .collect();
    by_expiry.sort_by_key(|(_, expiry)| *expiry);
    for (key, _) in by_expiry.into_iter().take(evict_count.max(1)) {
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_types::TtlClass;
    use serde_json::json;

    #[test]
    fn round_trips_a_live_value() {
        let tier = MemoryTier::new(10);
        tier.set(CacheEntry::new("k", json!({"a": 1}), TtlClass::Default));
        assert_eq!(tier.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let tier = MemoryTier::new(10);
        let mut entry = CacheEntry::new("k", json!(1), TtlClass::Default);
        entry.expiry_time = Utc::now() - chrono::Duration::seconds(1);
        tier.set(entry);
        assert_eq!(tier.get("k"), None);
        assert!(tier.is_empty());
    }

    #[test]
    fn overflow_evicts_down_to_the_cap() {
        let tier = MemoryTier::new(5);
        for i in 0..10 {
            tier.set(CacheEntry::new(
                format!("k{i}"),
                json!(i),
                TtlClass::Default,
            ));
        }
        assert!(tier.len() <= 5);
    }
}
