//! Parsed app-ads.txt records and the analysis/search result shapes in §3.

use serde::{Deserialize, Serialize};

/// The relationship field of an app-ads.txt record, bucketed per §4.5 step 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// `DIRECT`, case-insensitive.
    Direct,
    /// `RESELLER`, case-insensitive.
    Reseller,
    /// Any other value in the relationship field.
    Other,
}

impl Relationship {
    /// Classify a raw, already-trimmed relationship field value.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "direct" => Self::Direct,
            "reseller" => Self::Reseller,
            _ => Self::Other,
        }
    }
}

/// One successfully parsed, non-comment, non-empty app-ads.txt line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAdsLine {
    /// 1-based line number within the original file.
    pub line_number: usize,
    /// The raw (trimmed) line content, for display/search-result purposes.
    pub content: String,
    /// `[exchangeDomain, publisherId, relationship, tagId?]`, lower-cased
    /// where §4.5 specifies lower-casing.
    pub fields: AppAdsFields,
}

/// The four comma-separated fields of an app-ads.txt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAdsFields {
    /// Exchange/advertising-system domain (field 0).
    pub exchange_domain: String,
    /// Publisher id within that exchange (field 1).
    pub publisher_id: String,
    /// Relationship (field 2), classified into [`Relationship`].
    pub relationship: Relationship,
    /// Optional certification authority id (field 3).
    pub tag_id: Option<String>,
}

/// A sample of a rejected line, kept for caller diagnostics (§4.5 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidLineSample {
    /// 1-based line number of the rejected line.
    pub line_number: usize,
    /// The line content, truncated to a caller-friendly length.
    pub truncated_content: String,
    /// Why the line was rejected.
    pub reason: &'static str,
}

/// Bucketed relationship counters, always satisfying
/// `valid_lines == direct + reseller + other` (testable property #2).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RelationshipCounts {
    /// Count of `DIRECT` records.
    pub direct: u64,
    /// Count of `RESELLER` records.
    pub reseller: u64,
    /// Count of any other relationship value.
    pub other: u64,
}

impl RelationshipCounts {
    /// Increment the bucket matching `relationship`.
    pub fn record(&mut self, relationship: Relationship) {
        match relationship {
            Relationship::Direct => self.direct += 1,
            Relationship::Reseller => self.reseller += 1,
            Relationship::Other => self.other += 1,
        }
    }

    /// Sum of all three buckets.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.direct + self.reseller + self.other
    }
}

/// Aggregate counters produced by the line parser (§3, §8 invariant #1/#2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppAdsAnalysis {
    /// Total lines seen, including blank and comment lines.
    pub total_lines: usize,
    /// Lines with at least 3 well-formed, comma-separated fields.
    pub valid_lines: usize,
    /// Lines whose first non-whitespace character is `#`.
    pub comment_lines: usize,
    /// Lines that are empty after trimming (or become empty once the
    /// trailing comment is stripped).
    pub empty_lines: usize,
    /// Lines with fewer than 3 fields after splitting on `,`.
    pub invalid_lines: usize,
    /// Distinct lower-cased publisher ids seen across valid lines.
    pub unique_publishers: usize,
    /// Relationship bucket totals.
    pub relationships: RelationshipCounts,
    /// Up to 5 samples of rejected lines, for caller diagnostics.
    #[serde(default)]
    pub invalid_samples: Vec<InvalidLineSample>,
    /// Set when the analysis aborted early due to I/O or memory failure;
    /// counters above are then a partial, best-effort snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-term match accounting within a [`SearchResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermMatch {
    /// A label identifying the term (see `SearchTerm::label`).
    pub term: String,
    /// Matching line numbers for this term alone, bounded by §4.5 limits.
    pub matching_lines: Vec<usize>,
    /// Count of matches, possibly larger than `matching_lines.len()` when
    /// truncated.
    pub count: usize,
    /// Set when this term's matches were truncated against the per-term cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    /// The true match count before truncation, when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
}

/// Outcome of matching a group of search terms against an app-ads.txt body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Labels of every term considered, in caller-supplied order.
    pub terms: Vec<String>,
    /// Per-term accounting (§4.5).
    pub per_term: Vec<TermMatch>,
    /// Line numbers matching the OR-of-AND-groups predicate overall.
    pub matching_lines: Vec<usize>,
    /// Overall match count, possibly larger than `matching_lines.len()`.
    pub count: usize,
    /// Set when the overall match set was truncated against the global cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    /// The true overall match count before truncation, when truncated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_classify_is_case_insensitive() {
        assert!(matches!(Relationship::classify("Direct"), Relationship::Direct));
        assert!(matches!(Relationship::classify("RESELLER"), Relationship::Reseller));
        assert!(matches!(Relationship::classify("sponsored"), Relationship::Other));
    }

    #[test]
    fn relationship_counts_total_matches_valid_lines_invariant() {
        let mut counts = RelationshipCounts::default();
        counts.record(Relationship::Direct);
        counts.record(Relationship::Direct);
        counts.record(Relationship::Reseller);
        counts.record(Relationship::Other);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.direct, 2);
    }
}
