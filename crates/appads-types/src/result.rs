//! Per-bundle pipeline results: [`ExtractionResult`] and [`AppAdsReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appads::{AppAdsAnalysis, SearchResult};
use crate::store::StoreKind;

/// How an app-ads.txt body ended up being analysed, per §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    /// Parsed in the caller's own task; small enough to not need isolation.
    Sync,
    /// Parsed inside the bounded worker pool.
    Worker,
    /// Parsed incrementally from a streaming HTTP body.
    Stream,
    /// No app-ads.txt was fetched (store-extraction failed, or not checked).
    None,
}

/// Error taxonomy surfaced to callers, per §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Missing/invalid request fields, or too many ids.
    BadRequest,
    /// Every id in a batch request was invalid after filtering.
    ValidationRejected,
    /// All retry/protocol fallbacks for a target URL were exhausted.
    UpstreamFetchFailed,
    /// The caller exceeded the local API rate limit.
    RateLimited,
    /// `StoreKind::Unknown` for the supplied bundle id.
    StoreNotRecognised,
    /// A worker-pool parse task timed out.
    WorkerTimeout,
    /// A worker-pool parse task exceeded its memory guard.
    WorkerOom,
    /// The remote file exceeded the response size cap.
    ResponseTooLarge,
    /// An unanticipated failure.
    Internal,
}

/// A single app-ads.txt fetch attempt's outcome, used to populate
/// [`AppAdsReport::fetch_errors`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAttemptError {
    /// The URL attempted (e.g. `https://example.com/app-ads.txt`).
    pub url: String,
    /// HTTP status code, if a response was received at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable failure description.
    pub message: String,
}

/// Report on the app-ads.txt file for a resolved domain (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAdsReport {
    /// Whether an app-ads.txt file was found at the domain root.
    pub exists: bool,
    /// The URL the file was ultimately fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// A head-sample of the raw content, bounded per §4.5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sample: Option<String>,
    /// Total byte length of the content, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    /// Line-level analysis, absent when the file could not be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysed: Option<AppAdsAnalysis>,
    /// Search-term matches, absent when no search terms were supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchResult>,
    /// Per-attempt fetch failures (e.g. both https and http returned 404).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_errors: Option<Vec<FetchAttemptError>>,
    /// A top-level error description when the whole report failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Which execution path analysed the body.
    pub processing_method: ProcessingMethod,
}

/// The full per-bundle pipeline result (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The bundle id this result is for.
    pub bundle_id: String,
    /// The store the bundle id was resolved against.
    pub store_kind: StoreKind,
    /// Whether the overall pipeline succeeded for this bundle.
    pub success: bool,
    /// The developer URL discovered on the store listing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_url: Option<String>,
    /// The canonical registrable domain derived from `developer_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// The app-ads.txt report for `domain`, if one was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_ads_txt: Option<AppAdsReport>,
    /// A top-level error description when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When this result was produced.
    pub timestamp: DateTime<Utc>,
    /// How the app-ads.txt body (if any) was processed.
    pub processing_method: ProcessingMethod,
    /// Wall-clock processing time for this bundle, in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Construct a failure result carrying just an error description.
    #[must_use]
    pub fn failure(
        bundle_id: impl Into<String>,
        store_kind: StoreKind,
        error: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            store_kind,
            success: false,
            developer_url: None,
            domain: None,
            app_ads_txt: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            processing_method: ProcessingMethod::None,
            processing_time_ms,
        }
    }
}
