//! Search matching over already-parsed app-ads.txt lines (§4.5).
//!
//! Plain terms form a single AND-group; each structured term forms its own
//! AND-group over its non-empty sub-fields. Groups combine with OR at the
//! line level. Per-term accounting is tracked independently of grouping.

use appads_types::{AppAdsLine, SearchResult, SearchTerm, TermMatch};

const DEFAULT_MAX_MATCHES_TOTAL: usize = 1_000;
const DEFAULT_MAX_MATCHES_PER_TERM: usize = 1_000;

/// Caps applied while accumulating match output.
#[derive(Debug, Clone, Copy)]
pub struct MatchLimits {
    /// Overall retained match cap across all groups.
    pub max_total: usize,
    /// Retained match cap for any single term.
    pub max_per_term: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_MATCHES_TOTAL,
            max_per_term: DEFAULT_MAX_MATCHES_PER_TERM,
        }
    }
}

/// Evaluate `terms` against `lines`, producing the combined search result.
#[must_use]
pub fn search(lines: &[AppAdsLine], terms: &[SearchTerm], limits: MatchLimits) -> SearchResult {
    if terms.is_empty() {
        return SearchResult {
            terms: Vec::new(),
            per_term: Vec::new(),
            matching_lines: Vec::new(),
            count: 0,
            truncated: None,
            original_count: None,
        };
    }

    let labels: Vec<String> = terms.iter().map(SearchTerm::label).collect();
    let predicates: Vec<Box<dyn Fn(&str) -> bool>> = terms.iter().map(predicate_for).collect();
    let plain_indices: Vec<usize> = terms
        .iter()
        .enumerate()
        .filter(|(_, term)| matches!(term, SearchTerm::Plain(_)))
        .map(|(index, _)| index)
        .collect();
    let structured_indices: Vec<usize> = terms
        .iter()
        .enumerate()
        .filter(|(_, term)| matches!(term, SearchTerm::Structured { .. }))
        .map(|(index, _)| index)
        .collect();

    let mut per_term_counts = vec![0usize; terms.len()];
    let mut per_term_lines: Vec<Vec<usize>> = vec![Vec::new(); terms.len()];
    let mut overall_lines = Vec::new();
    let mut overall_count = 0usize;

    for line in lines {
        let lower_content = line.content.to_ascii_lowercase();
        let mut hits = vec![false; terms.len()];

        for (index, predicate) in predicates.iter().enumerate() {
            if predicate(&lower_content) {
                hits[index] = true;
                per_term_counts[index] += 1;
                if per_term_lines[index].len() < limits.max_per_term {
                    per_term_lines[index].push(line.line_number);
                }
            }
        }

        let plain_group_matches = !plain_indices.is_empty() && plain_indices.iter().all(|&i| hits[i]);
        let structured_group_matches = structured_indices.iter().any(|&i| hits[i]);

        if plain_group_matches || structured_group_matches {
            overall_count += 1;
            if overall_lines.len() < limits.max_total {
                overall_lines.push(line.line_number);
            }
        }
    }

    let per_term = labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let true_count = per_term_counts[index];
            let truncated = true_count > limits.max_per_term;
            TermMatch {
                term: label.clone(),
                matching_lines: per_term_lines[index].clone(),
                count: true_count,
                truncated: truncated.then_some(true),
                original_count: truncated.then_some(true_count),
            }
        })
        .collect();

    let overall_truncated = overall_count > limits.max_total;
    SearchResult {
        terms: labels,
        per_term,
        matching_lines: overall_lines,
        count: overall_count,
        truncated: overall_truncated.then_some(true),
        original_count: overall_truncated.then_some(overall_count),
    }
}

/// Build a case-insensitive substring predicate for one term. The input
/// passed to the returned predicate must already be lower-cased.
fn predicate_for(term: &SearchTerm) -> Box<dyn Fn(&str) -> bool> {
    match term {
        SearchTerm::Plain(value) => {
            let needle = value.to_ascii_lowercase();
            Box::new(move |lower_line: &str| lower_line.contains(&needle))
        }
        SearchTerm::Structured {
            domain,
            publisher_id,
            relationship,
            tag_id,
        } => {
            let conditions: Vec<String> = [domain, publisher_id, relationship, tag_id]
                .into_iter()
                .flatten()
                .map(|value| value.to_ascii_lowercase())
                .collect();
            Box::new(move |lower_line: &str| {
                !conditions.is_empty() && conditions.iter().all(|needle| lower_line.contains(needle.as_str()))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_types::{AppAdsFields, Relationship};

    fn line(number: usize, content: &str, exchange_domain: &str, publisher_id: &str, relationship: Relationship) -> AppAdsLine {
        AppAdsLine {
            line_number: number,
            content: content.to_string(),
            fields: AppAdsFields {
                exchange_domain: exchange_domain.to_string(),
                publisher_id: publisher_id.to_string(),
                relationship,
                tag_id: None,
            },
        }
    }

    #[test]
    fn plain_terms_and_together_within_one_group() {
        let lines = vec![
            line(1, "google.com, pub-1, DIRECT", "google.com", "pub-1", Relationship::Direct),
            line(2, "google.com, pub-2, DIRECT", "google.com", "pub-2", Relationship::Direct),
        ];
        let terms = vec![SearchTerm::Plain("google.com".into()), SearchTerm::Plain("pub-1".into())];
        let result = search(&lines, &terms, MatchLimits::default());
        assert_eq!(result.matching_lines, vec![1]);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn structured_term_matches_all_of_its_own_subfields() {
        let lines = vec![
            line(1, "google.com, pub-1, DIRECT", "google.com", "pub-1", Relationship::Direct),
            line(2, "google.com, pub-2, RESELLER", "google.com", "pub-2", Relationship::Reseller),
        ];
        let terms = vec![SearchTerm::Structured {
            domain: Some("google.com".into()),
            publisher_id: None,
            relationship: Some("reseller".into()),
            tag_id: None,
        }];
        let result = search(&lines, &terms, MatchLimits::default());
        assert_eq!(result.matching_lines, vec![2]);
    }

    #[test]
    fn groups_combine_with_or() {
        let lines = vec![
            line(1, "google.com, pub-1, DIRECT", "google.com", "pub-1", Relationship::Direct),
            line(2, "facebook.com, pub-9, RESELLER", "facebook.com", "pub-9", Relationship::Reseller),
        ];
        let terms = vec![
            SearchTerm::Plain("google.com".into()),
            SearchTerm::Structured {
                domain: Some("facebook.com".into()),
                publisher_id: None,
                relationship: None,
                tag_id: None,
            },
        ];
        let result = search(&lines, &terms, MatchLimits::default());
        assert_eq!(result.matching_lines, vec![1, 2]);
    }

    #[test]
    fn per_term_matches_are_tracked_independent_of_group_result() {
        let lines = vec![line(1, "google.com, pub-1, DIRECT", "google.com", "pub-1", Relationship::Direct)];
        let terms = vec![SearchTerm::Plain("google.com".into()), SearchTerm::Plain("nonexistent".into())];
        let result = search(&lines, &terms, MatchLimits::default());
        assert_eq!(result.count, 0, "AND-group requires both plain terms to match");
        assert_eq!(result.per_term[0].count, 1, "the matching term is still counted individually");
        assert_eq!(result.per_term[1].count, 0);
    }

    #[test]
    fn overall_matches_beyond_the_cap_are_marked_truncated() {
        let lines: Vec<AppAdsLine> = (1..=5)
            .map(|n| line(n, "google.com, pub-1, DIRECT", "google.com", "pub-1", Relationship::Direct))
            .collect();
        let limits = MatchLimits { max_total: 2, max_per_term: 2 };
        let result = search(&lines, &[SearchTerm::Plain("google.com".into())], limits);
        assert_eq!(result.matching_lines.len(), 2);
        assert_eq!(result.count, 5);
        assert_eq!(result.truncated, Some(true));
        assert_eq!(result.original_count, Some(5));
    }
}
