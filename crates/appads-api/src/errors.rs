//! The RFC 9457-shaped problem response returned for every request-boundary
//! failure (§7). Per-bundle failures never reach here: they are folded into
//! an [`appads_types::ExtractionResult`]/[`appads_types::AppAdsReport`] by
//! the orchestrator and returned with a `200` envelope instead.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use appads_types::ErrorKind;

/// A request-boundary error, carrying enough detail to build both the HTTP
/// status and the problem body.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    detail: String,
    invalid_params: Option<Value>,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Malformed or missing request fields.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::BadRequest, detail)
    }

    /// Every id in a batch request was invalid after filtering; `invalid_params`
    /// carries the counts the caller needs to see (§7).
    #[must_use]
    pub fn validation_rejected(detail: impl Into<String>, invalid_params: Value) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorKind::ValidationRejected, detail).with_invalid_params(invalid_params)
    }

    /// The caller exceeded the local API rate limit.
    #[must_use]
    pub fn rate_limited(detail: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, ErrorKind::RateLimited, detail).with_retry_after(retry_after_secs)
    }

    /// An unanticipated failure. Logged with its source at the call site;
    /// never carries a partial cache write (§7).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal, detail)
    }

    fn new(status: StatusCode, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            detail: detail.into(),
            invalid_params: None,
            retry_after_secs: None,
        }
    }

    fn with_invalid_params(mut self, value: Value) -> Self {
        self.invalid_params = Some(value);
        self
    }

    fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

#[derive(Debug, Serialize)]
struct ProblemBody {
    success: bool,
    #[serde(rename = "errorKind")]
    error_kind: ErrorKind,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "invalidParams")]
    invalid_params: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemBody {
            success: false,
            error_kind: self.kind,
            error: self.detail,
            invalid_params: self.invalid_params,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
