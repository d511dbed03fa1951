//! `/api/extract`, `GET /api/check-app-ads`, and `/api/structured-search`:
//! the three single-target endpoints (§6).

use axum::Json;
use axum::extract::{Query, State};

use appads_orchestrator::fetch_and_analyse;
use appads_types::{BundleId, Domain};

use crate::dto::{
    decode_plain_term_list, decode_search_terms, CheckAppAdsQuery, CheckAppAdsResponse, ExtractRequest, ExtractResponse,
    ResultEnvelope, StructuredSearchRequest, StructuredSearchResponse,
};
use crate::errors::ApiError;
use crate::state::ApiState;

/// `POST /api/extract`: resolve a single bundle id through the full
/// store-fallback pipeline.
pub async fn extract(
    State(state): State<ApiState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let bundle_id = BundleId::parse(request.bundle_id).map_err(|err| ApiError::bad_request(err.to_string()))?;
    let terms = decode_search_terms(request.search_terms.as_ref())?;

    let result = state
        .orchestrator
        .resolve(&bundle_id, &terms, state.match_limits())
        .await;

    Ok(Json(ResultEnvelope::new(result)))
}

/// `GET /api/check-app-ads`: fetch and analyse a domain's `app-ads.txt`
/// directly, bypassing store resolution entirely.
pub async fn check_app_ads(
    State(state): State<ApiState>,
    Query(query): Query<CheckAppAdsQuery>,
) -> Result<Json<CheckAppAdsResponse>, ApiError> {
    let domain = Domain::parse(query.domain).map_err(|err| ApiError::bad_request(err.to_string()))?;
    let terms = decode_plain_term_list(query.search_terms.as_deref())?;

    let report = fetch_and_analyse(
        &domain,
        &terms,
        state.fetch_limits(),
        state.match_limits(),
        &state.cache,
        &state.http,
        &state.analyser,
    )
    .await;

    Ok(Json(ResultEnvelope::new(report)))
}

/// `POST /api/structured-search`: fetch a domain's `app-ads.txt` and return
/// just the match set for a single query term.
pub async fn structured_search(
    State(state): State<ApiState>,
    Json(request): Json<StructuredSearchRequest>,
) -> Result<Json<StructuredSearchResponse>, ApiError> {
    let domain = Domain::parse(request.domain).map_err(|err| ApiError::bad_request(err.to_string()))?;
    let terms = decode_search_terms(Some(&request.query))?;
    if terms.is_empty() {
        return Err(ApiError::bad_request("query must supply at least one search term"));
    }

    let report = fetch_and_analyse(
        &domain,
        &terms,
        state.fetch_limits(),
        state.match_limits(),
        &state.cache,
        &state.http,
        &state.analyser,
    )
    .await;

    let search = report.search.unwrap_or_else(|| appads_types::SearchResult {
        terms: terms.iter().map(appads_types::SearchTerm::label).collect(),
        per_term: Vec::new(),
        matching_lines: Vec::new(),
        count: 0,
        truncated: None,
        original_count: None,
    });

    Ok(Json(ResultEnvelope::new(search)))
}
