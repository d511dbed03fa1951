//! `POST /api/stream/extract-multiple` and `POST /api/stream/export-csv`:
//! the streaming counterparts of `extract-multiple`/`export-csv` that flush
//! each bundle's result as soon as it completes (§4.9) instead of buffering
//! the whole batch.

use axum::extract::State;
use axum::response::Response;
use axum::Json;

use appads_batch::dedup_and_cap;
use appads_types::BundleId;

use crate::dto::{decode_search_terms, BatchRequest};
use crate::errors::ApiError;
use crate::state::ApiState;
use crate::streaming::{csv_stream_response, extraction_stream_response};

/// Resolve the flexible `bundleIds` shape down to the parsed, deduplicated,
/// capped [`BundleId`] list plus a count of entries dropped for failing
/// `BundleId::parse` (not exceeding the cap, which `dedup_and_cap` already
/// enforces on the raw strings).
fn parse_bundle_ids(raw: &serde_json::Value, max_ids: usize) -> Result<(Vec<BundleId>, usize), ApiError> {
    let raw_ids = crate::dto::decode_bundle_ids(raw)?;
    if raw_ids.is_empty() {
        return Err(ApiError::bad_request("bundleIds must not be empty"));
    }
    let capped = dedup_and_cap(&raw_ids, max_ids);

    let mut valid = Vec::with_capacity(capped.len());
    let mut skipped = 0usize;
    for raw_id in capped {
        match BundleId::parse(raw_id) {
            Ok(id) => valid.push(id),
            Err(_) => skipped += 1,
        }
    }
    Ok((valid, skipped))
}

/// `POST /api/stream/extract-multiple`.
pub async fn stream_extract_multiple(State(state): State<ApiState>, Json(request): Json<BatchRequest>) -> Result<Response, ApiError> {
    let (valid_ids, skipped) = parse_bundle_ids(&request.bundle_ids, state.settings.batch_max_ids)?;

    let mut terms = decode_search_terms(request.search_terms.as_ref())?;
    terms.extend(decode_search_terms(request.structured_params.as_ref())?);

    Ok(extraction_stream_response(
        state.orchestrator.clone(),
        valid_ids,
        skipped,
        terms,
        state.match_limits(),
        state.settings.batch_concurrency,
    ))
}

/// `POST /api/stream/export-csv`: same shape as the streaming JSON endpoint,
/// but over `csv_max_ids`/no pagination, since an export is meant to cover
/// the whole requested set.
pub async fn stream_export_csv(State(state): State<ApiState>, Json(request): Json<BatchRequest>) -> Result<Response, ApiError> {
    let (valid_ids, _skipped) = parse_bundle_ids(&request.bundle_ids, state.settings.csv_max_ids)?;

    let mut terms = decode_search_terms(request.search_terms.as_ref())?;
    terms.extend(decode_search_terms(request.structured_params.as_ref())?);

    Ok(csv_stream_response(
        state.orchestrator.clone(),
        valid_ids,
        terms,
        state.match_limits(),
        state.settings.csv_concurrency,
    ))
}
