//! Request/response shapes for the HTTP surface (§6), including the
//! string/array-of-string/array-of-object normalisation the boundary accepts
//! for `bundleIds` and `searchTerms`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use appads_batch::{Counts, DomainAnalysis, PageInfo, TermStat};
use appads_types::{AppAdsReport, ExtractionResult, SearchResult, SearchTerm};

use crate::errors::ApiError;

/// Body shared by `/api/extract-multiple`, `/api/stream/extract-multiple`,
/// `/api/export-csv`, and `/api/stream/export-csv`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Accepts a bare string or an array of strings.
    pub bundle_ids: Value,
    /// Accepts a bare string, a single structured object, or an array
    /// mixing both forms. Absent entirely when omitted.
    #[serde(default)]
    pub search_terms: Option<Value>,
    /// Additional structured constraints, folded into `search_terms`.
    #[serde(default)]
    pub structured_params: Option<Value>,
    /// 1-based page number; only consulted by the non-streaming,
    /// non-export batch endpoint.
    #[serde(default)]
    pub page: Option<usize>,
    /// Page size; only consulted by the non-streaming, non-export batch
    /// endpoint.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Reserved for callers that want the unabridged per-bundle analysis
    /// instead of the default caller-facing summary; currently a no-op,
    /// since every path already returns full analysis.
    #[serde(default)]
    pub full_analysis: Option<bool>,
}

/// Body for `/api/extract`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// The single bundle id to resolve.
    pub bundle_id: String,
    /// Accepts the same flexible shapes as [`BatchRequest::search_terms`].
    #[serde(default)]
    pub search_terms: Option<Value>,
}

/// Query for `GET /api/check-app-ads`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAppAdsQuery {
    /// The registrable domain to fetch `app-ads.txt` for.
    pub domain: String,
    /// A comma-separated list of plain search terms.
    #[serde(default)]
    pub search_terms: Option<String>,
}

/// Body for `/api/structured-search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSearchRequest {
    /// The registrable domain to fetch `app-ads.txt` for.
    pub domain: String,
    /// A single structured or plain search term.
    pub query: Value,
}

/// Envelope wrapping a single successful result (§6).
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope<T> {
    /// Always `true`; failures use [`ApiError`] instead.
    pub success: bool,
    /// The payload.
    pub result: T,
}

impl<T> ResultEnvelope<T> {
    /// Wrap `result` in a successful envelope.
    #[must_use]
    pub const fn new(result: T) -> Self {
        Self { success: true, result }
    }
}

/// Response body for `/api/extract-multiple`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// `true` on every non-error response; a whole-batch failure is not
    /// representable, since per-bundle failures never abort the batch.
    pub success: bool,
    /// The page of results requested.
    pub results: Vec<ExtractionResult>,
    /// Pagination metadata for `results`.
    pub pagination: PageInfo,
    /// Success/error/skip/app-ads-present tallies across the whole batch.
    pub counts: Counts,
    /// Per-term match totals across the whole batch.
    pub search_stats: Vec<TermStat>,
    /// Shared-domain and relationship analytics across the whole batch.
    pub domain_analysis: DomainAnalysis,
}

/// Response body for `/api/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Always `true`.
    pub success: bool,
    /// Aggregate process stats.
    pub stats: StatsBody,
}

/// The `stats` payload of [`StatsResponse`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    /// Tiered-cache hit/miss counters.
    pub cache: CacheStatsBody,
    /// Worker-pool queue depth and active task count.
    pub workers: WorkerStatsBody,
    /// Process uptime, in seconds.
    pub uptime_seconds: u64,
}

/// Cache hit/miss counters surfaced on `/api/stats` and `/health`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsBody {
    /// Reads satisfied by the in-memory tier.
    pub memory_hits: u64,
    /// Reads satisfied by the on-disk tier.
    pub disk_hits: u64,
    /// Reads satisfied by the remote tier.
    pub remote_hits: u64,
    /// Reads satisfied by none of the above.
    pub misses: u64,
}

/// Worker-pool occupancy surfaced on `/api/stats`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatsBody {
    /// Tasks queued but not yet running.
    pub queue_depth: i64,
    /// Tasks currently executing.
    pub active: i64,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"up"`; the process does not serve this response while
    /// draining.
    pub status: &'static str,
    /// Process uptime, in seconds.
    pub uptime: u64,
    /// Tiered-cache hit/miss counters.
    pub cache_stats: CacheStatsBody,
    /// The build identifier recorded at logging init.
    pub version: &'static str,
}

/// Decode the flexible `bundleIds` shape into a plain list of strings,
/// without validating or deduplicating individual ids (that happens in
/// `appads-batch::dedup_and_cap` and `BundleId::parse`).
///
/// # Errors
///
/// Returns [`ApiError::bad_request`] if `raw` is neither a string nor an
/// array of strings.
pub fn decode_bundle_ids(raw: &Value) -> Result<Vec<String>, ApiError> {
    match raw {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("bundleIds entries must be strings"))
            })
            .collect(),
        _ => Err(ApiError::bad_request("bundleIds must be a string or an array of strings")),
    }
}

/// Decode the flexible `searchTerms`/`structuredParams`/`query` shape
/// (absent, a bare string, a single structured object, or an array mixing
/// both) into a list of [`SearchTerm`], normalising each one.
///
/// # Errors
///
/// Returns [`ApiError::bad_request`] if any entry fails to deserialise as a
/// [`SearchTerm`], or [`ApiError::validation_rejected`] if a structured
/// entry has every sub-field empty.
pub fn decode_search_terms(raw: Option<&Value>) -> Result<Vec<SearchTerm>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let values: Vec<Value> = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };

    values
        .into_iter()
        .map(|value| {
            let term: SearchTerm = serde_json::from_value(value)
                .map_err(|err| ApiError::bad_request(format!("invalid search term: {err}")))?;
            term.normalise()
                .map_err(|err| ApiError::validation_rejected(err.to_string(), serde_json::json!({"reason": err.to_string()})))
        })
        .collect()
}

/// Decode a comma-separated plain-term query string (used by
/// `GET /api/check-app-ads`) into normalised [`SearchTerm`]s.
///
/// # Errors
///
/// Propagates [`ApiError`] from term normalisation, though plain terms only
/// ever fail on an empty entry after trimming, which is filtered out first.
pub fn decode_plain_term_list(raw: Option<&str>) -> Result<Vec<SearchTerm>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            SearchTerm::Plain(term.to_string())
                .normalise()
                .map_err(|err| ApiError::bad_request(err.to_string()))
        })
        .collect()
}

/// Response body for `/api/check-app-ads`.
pub type CheckAppAdsResponse = ResultEnvelope<AppAdsReport>;
/// Response body for `/api/structured-search`.
pub type StructuredSearchResponse = ResultEnvelope<SearchResult>;
/// Response body for `/api/extract`.
pub type ExtractResponse = ResultEnvelope<ExtractionResult>;
