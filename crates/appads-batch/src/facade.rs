//! `resolve_many`: the batch entry point composing dedup, concurrency-
//! ceilinged fan-out over the per-bundle orchestrator (C7), stats, and the
//! 5-minute result cache (§4.8).

use appads_analyser::MatchLimits;
use appads_orchestrator::Orchestrator;
use appads_types::{BundleId, ExtractionResult, ProcessingMethod, SearchTerm, StoreKind};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cachekey::batch_cache_key;
use crate::dedup::dedup_and_cap;
use crate::resultcache::ResultCache;
use crate::stats::{compute_counts, compute_domain_analysis, compute_search_stats, Counts, DomainAnalysis, TermStat};

/// The complete, unpaginated outcome of a batch resolution (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// One result per valid, deduplicated bundle id, in input order.
    pub results: Vec<ExtractionResult>,
    /// Success/error/skip/app-ads-present tallies.
    pub counts: Counts,
    /// Per-term match totals across the batch.
    pub search_stats: Vec<TermStat>,
    /// Shared-domain and relationship analytics.
    pub domain_analysis: DomainAnalysis,
}

/// Resolve a batch of bundle ids: dedup/cap, validate, fan out over
/// `orchestrator` with at most `concurrency` resolutions in flight at once,
/// then compute stats and cache the complete result for 5 minutes.
///
/// A cache hit on the derived key short-circuits the entire fan-out and
/// returns the prior result unchanged.
pub async fn resolve_many(
    orchestrator: &Orchestrator,
    raw_ids: &[String],
    terms: &[SearchTerm],
    max_ids: usize,
    concurrency: usize,
    match_limits: MatchLimits,
    result_cache: &ResultCache,
) -> BatchResult {
    let deduped = dedup_and_cap(raw_ids, max_ids);
    let cache_key = batch_cache_key(&deduped, terms);

    if let Some(cached) = result_cache.get(&cache_key) {
        return cached;
    }

    let mut valid_ids: Vec<(usize, BundleId)> = Vec::with_capacity(deduped.len());
    let mut skipped_ids: Vec<String> = Vec::new();
    let mut indexed_results: Vec<(usize, ExtractionResult)> = Vec::with_capacity(deduped.len());
    for (index, raw) in deduped.iter().enumerate() {
        match BundleId::parse(raw.clone()) {
            Ok(bundle_id) => valid_ids.push((index, bundle_id)),
            Err(err) => {
                warn!(bundle_id = %raw, error = %err, "skipping invalid bundle id in batch");
                skipped_ids.push(raw.clone());
                indexed_results.push((index, skipped_result(raw.clone())));
            }
        }
    }

    let resolved: Vec<(usize, ExtractionResult)> = stream::iter(valid_ids)
        .map(|(index, bundle_id)| {
            let orchestrator = orchestrator.clone();
            let terms = terms.to_vec();
            async move {
                let result = orchestrator.resolve(&bundle_id, &terms, match_limits).await;
                (index, result)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed_results.extend(resolved);
    indexed_results.sort_by_key(|(index, _)| *index);

    let results: Vec<ExtractionResult> = indexed_results.into_iter().map(|(_, result)| result).collect();

    let counts = compute_counts(&results, &skipped_ids);
    let search_stats = compute_search_stats(&results, terms);
    let domain_analysis = compute_domain_analysis(&results);

    let batch_result = BatchResult {
        results,
        counts,
        search_stats,
        domain_analysis,
    };
    result_cache.set(cache_key, batch_result.clone());
    batch_result
}

/// The result folded in for a bundle id that failed `BundleId::parse`,
/// keeping it present in `results` at its original index per §8's "every
/// input id appears in the output" property.
fn skipped_result(raw_id: String) -> ExtractionResult {
    ExtractionResult {
        bundle_id: raw_id,
        store_kind: StoreKind::Unknown,
        success: false,
        developer_url: None,
        domain: None,
        app_ads_txt: None,
        error: Some("invalid bundle id".to_string()),
        timestamp: Utc::now(),
        processing_method: ProcessingMethod::None,
        processing_time_ms: 0,
    }
}
