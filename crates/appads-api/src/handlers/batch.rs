//! `POST /api/extract-multiple`: deduplicated, paginated batch resolution
//! over the per-bundle orchestrator (§4.8, §6).

use axum::Json;
use axum::extract::State;

use appads_batch::{paginate, resolve_many};

use crate::dto::{BatchRequest, BatchResponse};
use crate::errors::ApiError;
use crate::state::ApiState;
use crate::validation::{clamp_page_size, validate_batch};

/// Resolve every requested bundle id (deduplicated and capped at
/// `Settings::batch_max_ids`), then return the requested page of the
/// complete, 5-minute-cached result.
pub async fn extract_multiple(
    State(state): State<ApiState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let validated = validate_batch(
        &request.bundle_ids,
        request.search_terms.as_ref(),
        request.structured_params.as_ref(),
        state.settings.batch_max_ids,
    )?;

    let batch_result = resolve_many(
        &state.orchestrator,
        &validated.bundle_ids,
        &validated.search_terms,
        state.settings.batch_max_ids,
        state.settings.batch_concurrency,
        state.match_limits(),
        &state.result_cache,
    )
    .await;

    let page_size = clamp_page_size(request.page_size, state.settings.page_size_min, state.settings.page_size_max);
    let page = request.page.unwrap_or(1);
    let (results, pagination) = paginate(&batch_result.results, page, page_size);

    Ok(Json(BatchResponse {
        success: true,
        results,
        pagination,
        counts: batch_result.counts,
        search_stats: batch_result.search_stats,
        domain_analysis: batch_result.domain_analysis,
    }))
}
