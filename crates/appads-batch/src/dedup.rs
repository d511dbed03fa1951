//! Case-sensitive, post-trim deduplication and length capping (§4.8).

use std::collections::HashSet;

/// Trim every id, drop empties, deduplicate case-sensitively preserving
/// first-seen order, then truncate to `max_ids`. Returns the kept ids and
/// the count dropped purely for exceeding the cap (duplicates/empties are
/// not counted as "skipped" — they are simply never submitted).
#[must_use]
pub fn dedup_and_cap(raw_ids: &[String], max_ids: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(raw_ids.len());
    let mut kept = Vec::with_capacity(raw_ids.len().min(max_ids));

    for raw in raw_ids {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            kept.push(trimmed.to_string());
            if kept.len() >= max_ids {
                break;
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_empty_and_whitespace_only_entries() {
        let ids = vec![" ".to_string(), "com.a".to_string(), "".to_string()];
        assert_eq!(dedup_and_cap(&ids, 10), vec!["com.a".to_string()]);
    }

    #[test]
    fn dedup_is_case_sensitive_and_trims_first() {
        let ids = vec!["  com.a ".to_string(), "com.a".to_string(), "COM.A".to_string()];
        assert_eq!(dedup_and_cap(&ids, 10), vec!["com.a".to_string(), "COM.A".to_string()]);
    }

    #[test]
    fn stops_once_the_cap_is_reached() {
        let ids: Vec<String> = (0..10).map(|i| format!("id-{i}")).collect();
        assert_eq!(dedup_and_cap(&ids, 3).len(), 3);
    }
}
