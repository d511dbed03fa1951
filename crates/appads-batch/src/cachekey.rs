//! Cache key derivation for a complete, unpaginated batch result (§4.8):
//! a hash of the sorted bundle ids plus sorted search term labels.

use appads_types::SearchTerm;
use sha2::{Digest, Sha256};

/// Derive the `batch:<hex>` cache key for `ids`/`terms`, independent of
/// input order.
#[must_use]
pub fn batch_cache_key(ids: &[String], terms: &[SearchTerm]) -> String {
    let mut sorted_ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted_ids.sort_unstable();

    let mut sorted_terms: Vec<String> = terms.iter().map(SearchTerm::label).collect();
    sorted_terms.sort();

    let mut hasher = Sha256::new();
    hasher.update(sorted_ids.join("\u{1}"));
    hasher.update([0u8]);
    hasher.update(sorted_terms.join("\u{1}"));
    format!("batch:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_independent_of_input_order() {
        let a = batch_cache_key(
            &["com.b".to_string(), "com.a".to_string()],
            &[SearchTerm::Plain("y".into()), SearchTerm::Plain("x".into())],
        );
        let b = batch_cache_key(
            &["com.a".to_string(), "com.b".to_string()],
            &[SearchTerm::Plain("x".into()), SearchTerm::Plain("y".into())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn different_ids_produce_different_keys() {
        let a = batch_cache_key(&["com.a".to_string()], &[]);
        let b = batch_cache_key(&["com.b".to_string()], &[]);
        assert_ne!(a, b);
    }
}
