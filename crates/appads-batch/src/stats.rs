//! Post-batch statistics: success/error/skip counts, per-term search totals,
//! and domain/relationship analytics (§4.8).

use std::collections::HashMap;

use appads_types::{ExtractionResult, SearchTerm};
use serde::{Deserialize, Serialize};

/// Success/error/skip/app-ads-present tallies across a full batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    /// Bundle ids that resolved successfully.
    pub success: usize,
    /// Bundle ids that entered the pipeline but failed.
    pub error: usize,
    /// Bundle ids rejected before entering the pipeline (invalid id).
    pub skipped: usize,
    /// Bundle ids whose domain had an app-ads.txt file present.
    pub app_ads_present: usize,
}

/// Aggregate match count for one search term label across the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermStat {
    /// The term's stable label (see [`SearchTerm::label`]).
    pub term: String,
    /// Summed match count for this term across every bundle's result.
    pub total_matches: usize,
}

/// A registrable domain shared by more than one bundle id in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDomain {
    /// The shared domain.
    pub domain: String,
    /// Every bundle id that resolved to it.
    pub bundle_ids: Vec<String>,
}

/// Domain- and relationship-level analytics across a full batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAnalysis {
    /// Domains resolved by more than one bundle id.
    pub shared_domains: Vec<SharedDomain>,
    /// Total `DIRECT` relationship lines across every analysed app-ads.txt.
    pub direct: u64,
    /// Total `RESELLER` relationship lines across every analysed app-ads.txt.
    pub reseller: u64,
    /// Total lines with any other relationship value.
    pub other: u64,
}

/// Compute [`Counts`] for a batch, given which results were skipped before
/// reaching the pipeline. `results` may include a synthetic failed entry for
/// each skipped id (folded in so every input id surfaces in the output);
/// those are tallied only once, as `skipped`, not also as `error`.
#[must_use]
pub fn compute_counts(results: &[ExtractionResult], skipped_ids: &[String]) -> Counts {
    let mut counts = Counts {
        skipped: skipped_ids.len(),
        ..Counts::default()
    };
    for result in results {
        if skipped_ids.iter().any(|id| id == &result.bundle_id) {
            continue;
        }
        if result.success {
            counts.success += 1;
        } else {
            counts.error += 1;
        }
        if result.app_ads_txt.as_ref().is_some_and(|report| report.exists) {
            counts.app_ads_present += 1;
        }
    }
    counts
}

/// Sum per-term match counts across every result that carries a search
/// outcome, keyed by term label so counts from independent bundles combine.
#[must_use]
pub fn compute_search_stats(results: &[ExtractionResult], terms: &[SearchTerm]) -> Vec<TermStat> {
    let labels: Vec<String> = terms.iter().map(SearchTerm::label).collect();
    let mut totals: HashMap<String, usize> = labels.iter().map(|label| (label.clone(), 0)).collect();

    for result in results {
        let Some(search) = result.app_ads_txt.as_ref().and_then(|report| report.search.as_ref()) else {
            continue;
        };
        for term_match in &search.per_term {
            if let Some(total) = totals.get_mut(&term_match.term) {
                *total += term_match.count;
            }
        }
    }

    labels
        .into_iter()
        .map(|term| {
            let total_matches = totals.remove(&term).unwrap_or(0);
            TermStat { term, total_matches }
        })
        .collect()
}

/// Group successful resolutions by shared domain and sum relationship
/// counts across every analysed app-ads.txt file.
#[must_use]
pub fn compute_domain_analysis(results: &[ExtractionResult]) -> DomainAnalysis {
    let mut by_domain: HashMap<String, Vec<String>> = HashMap::new();
    let mut direct = 0u64;
    let mut reseller = 0u64;
    let mut other = 0u64;

    for result in results {
        if let Some(domain) = &result.domain {
            by_domain.entry(domain.clone()).or_default().push(result.bundle_id.clone());
        }
        if let Some(counts) = result
            .app_ads_txt
            .as_ref()
            .and_then(|report| report.analysed.as_ref())
            .map(|analysis| &analysis.relationships)
        {
            direct += counts.direct;
            reseller += counts.reseller;
            other += counts.other;
        }
    }

    let mut shared_domains: Vec<SharedDomain> = by_domain
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(domain, bundle_ids)| SharedDomain { domain, bundle_ids })
        .collect();
    shared_domains.sort_by(|a, b| a.domain.cmp(&b.domain));

    DomainAnalysis {
        shared_domains,
        direct,
        reseller,
        other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_types::{AppAdsAnalysis, AppAdsReport, ProcessingMethod, RelationshipCounts};
    use chrono::Utc;

    fn result(bundle_id: &str, success: bool, domain: Option<&str>) -> ExtractionResult {
        ExtractionResult {
            bundle_id: bundle_id.to_string(),
            store_kind: appads_types::StoreKind::Googleplay,
            success,
            developer_url: None,
            domain: domain.map(str::to_string),
            app_ads_txt: domain.map(|_| AppAdsReport {
                exists: true,
                url: None,
                content_sample: None,
                content_length: None,
                analysed: Some(AppAdsAnalysis {
                    relationships: RelationshipCounts {
                        direct: 1,
                        reseller: 2,
                        other: 0,
                    },
                    ..AppAdsAnalysis::default()
                }),
                search: None,
                fetch_errors: None,
                error: None,
                processing_method: ProcessingMethod::Sync,
            }),
            error: None,
            timestamp: Utc::now(),
            processing_method: ProcessingMethod::Sync,
            processing_time_ms: 1,
        }
    }

    #[test]
    fn counts_tally_success_error_and_skip() {
        let results = vec![result("a", true, Some("x.com")), result("b", false, None)];
        let counts = compute_counts(&results, &["c".to_string()]);
        assert_eq!(counts.success, 1);
        assert_eq!(counts.error, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.app_ads_present, 1);
    }

    #[test]
    fn a_skipped_entry_folded_into_results_is_not_double_counted_as_error() {
        let skipped = ExtractionResult {
            bundle_id: "not-a-bundle-id".to_string(),
            store_kind: appads_types::StoreKind::Unknown,
            success: false,
            developer_url: None,
            domain: None,
            app_ads_txt: None,
            error: Some("invalid bundle id".to_string()),
            timestamp: Utc::now(),
            processing_method: ProcessingMethod::None,
            processing_time_ms: 0,
        };
        let results = vec![result("a", true, Some("x.com")), skipped];
        let counts = compute_counts(&results, &["not-a-bundle-id".to_string()]);
        assert_eq!(counts.success, 1);
        assert_eq!(counts.error, 0);
        assert_eq!(counts.skipped, 1);
    }

    #[test]
    fn domains_shared_by_multiple_bundles_are_grouped() {
        let results = vec![
            result("a", true, Some("x.com")),
            result("b", true, Some("x.com")),
            result("c", true, Some("y.com")),
        ];
        let analysis = compute_domain_analysis(&results);
        assert_eq!(analysis.shared_domains.len(), 1);
        assert_eq!(analysis.shared_domains[0].domain, "x.com");
        assert_eq!(analysis.shared_domains[0].bundle_ids, vec!["a", "b"]);
        assert_eq!(analysis.direct, 3);
        assert_eq!(analysis.reseller, 6);
    }
}
