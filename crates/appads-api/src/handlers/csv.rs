//! `POST /api/export-csv`: the non-streaming CSV export, covering the full
//! (uncapped-by-pagination) batch at `Settings::csv_max_ids`/`csv_concurrency`
//! (§6).

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use appads_batch::resolve_many;

use crate::csv::{row_for, HEADER};
use crate::dto::BatchRequest;
use crate::errors::ApiError;
use crate::state::ApiState;
use crate::validation::validate_batch;

/// Resolve every requested bundle id and render the complete result set as
/// a single CSV document.
pub async fn export_csv(State(state): State<ApiState>, Json(request): Json<BatchRequest>) -> Result<Response, ApiError> {
    let validated = validate_batch(
        &request.bundle_ids,
        request.search_terms.as_ref(),
        request.structured_params.as_ref(),
        state.settings.csv_max_ids,
    )?;

    let batch_result = resolve_many(
        &state.orchestrator,
        &validated.bundle_ids,
        &validated.search_terms,
        state.settings.csv_max_ids,
        state.settings.csv_concurrency,
        state.match_limits(),
        &state.result_cache,
    )
    .await;

    let mut body = String::from(HEADER);
    for result in &batch_result.results {
        body.push_str(&row_for(result));
    }

    let mut response = body.into_response();
    response.headers_mut().insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/csv"));
    Ok(response)
}
