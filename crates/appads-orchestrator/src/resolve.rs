//! `resolve`: per-bundle pipeline composing the store extractor (C6) and the
//! app-ads.txt analyser (C5), with a fixed-order store-fallback chain (§4.7).

use std::sync::Arc;
use std::time::Instant;

use appads_analyser::{Analyser, MatchLimits};
use appads_cache::TieredCache;
use appads_httpclient::HttpClient;
use appads_store::{extract_domain, StoreDeps};
use appads_types::{BundleId, ExtractionResult, ProcessingMethod, SearchTerm, StoreKind};

use crate::appads_fetch::{fetch_and_analyse, FetchLimits};

/// Every dependency `resolve` needs, bundled so the orchestrator can be
/// constructed once at bootstrap and shared across every request.
#[derive(Clone)]
pub struct Orchestrator {
    store_deps: StoreDeps,
    cache: Arc<TieredCache>,
    http: Arc<HttpClient>,
    analyser: Arc<Analyser>,
    fetch_limits: FetchLimits,
}

impl Orchestrator {
    /// Build an orchestrator from its constituent services.
    #[must_use]
    pub fn new(store_deps: StoreDeps, cache: Arc<TieredCache>, http: Arc<HttpClient>, analyser: Arc<Analyser>, fetch_limits: FetchLimits) -> Self {
        Self {
            store_deps,
            cache,
            http,
            analyser,
            fetch_limits,
        }
    }

    /// Resolve `bundle_id` to a developer domain and analyse its app-ads.txt
    /// file for `terms`, walking the fixed store-fallback chain on failure.
    /// Never panics or propagates an error to the caller: every failure is
    /// folded into a failed [`ExtractionResult`].
    pub async fn resolve(&self, bundle_id: &BundleId, terms: &[SearchTerm], match_limits: MatchLimits) -> ExtractionResult {
        let started = Instant::now();
        let detected = StoreKind::detect(bundle_id);
        let candidates = candidate_order(detected);

        let mut errors: Vec<String> = Vec::new();

        for store in candidates {
            match extract_domain(bundle_id, store, &self.store_deps).await {
                Ok(domain) => {
                    let report = fetch_and_analyse(
                        &domain,
                        terms,
                        self.fetch_limits,
                        match_limits,
                        &self.cache,
                        &self.http,
                        &self.analyser,
                    )
                    .await;
                    let processing_method = report.processing_method;
                    return ExtractionResult {
                        bundle_id: bundle_id.as_str().to_string(),
                        store_kind: store,
                        success: true,
                        developer_url: report.url.clone(),
                        domain: Some(domain.as_str().to_string()),
                        app_ads_txt: Some(report),
                        error: None,
                        timestamp: chrono::Utc::now(),
                        processing_method,
                        processing_time_ms: elapsed_ms(started),
                    };
                }
                Err(err) => errors.push(format!("{}: {err}", store.as_str())),
            }
        }

        ExtractionResult {
            bundle_id: bundle_id.as_str().to_string(),
            store_kind: detected,
            success: false,
            developer_url: None,
            domain: None,
            app_ads_txt: None,
            error: Some(if errors.is_empty() {
                "no stores attempted".to_string()
            } else {
                errors.join("; ")
            }),
            timestamp: chrono::Utc::now(),
            processing_method: ProcessingMethod::None,
            processing_time_ms: elapsed_ms(started),
        }
    }
}

/// Build the fixed-order fallback chain (§4.7): the detected store first
/// (when recognised), then every remaining store in `fallback_order`.
fn candidate_order(detected: StoreKind) -> Vec<StoreKind> {
    let mut candidates: Vec<StoreKind> = Vec::with_capacity(5);
    if detected != StoreKind::Unknown {
        candidates.push(detected);
    }
    candidates.extend(StoreKind::fallback_order().into_iter().filter(|kind| *kind != detected));
    candidates
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_store_is_tried_first_then_every_other_store_once() {
        let order = candidate_order(StoreKind::Amazon);
        assert_eq!(order[0], StoreKind::Amazon);
        assert_eq!(order.len(), 5);
        assert_eq!(order.iter().filter(|kind| **kind == StoreKind::Amazon).count(), 1);
    }

    #[test]
    fn unknown_detection_still_walks_the_full_fixed_order() {
        let order = candidate_order(StoreKind::Unknown);
        assert_eq!(order, StoreKind::fallback_order().to_vec());
    }
}
