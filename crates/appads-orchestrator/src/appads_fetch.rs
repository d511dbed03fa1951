//! Fetches and caches the app-ads.txt file for a resolved domain, then hands
//! it to the analyser over whichever of the three execution paths (§4.5)
//! the body's size calls for.

use appads_analyser::{should_stream, Analyser, AnalysisOutcome, MatchLimits};
use appads_cache::TieredCache;
use appads_httpclient::{FetchOptions, HttpClient};
use appads_types::{AppAdsReport, Domain, FetchAttemptError, ProcessingMethod, SearchTerm, TtlClass};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What the cache layer retains about one domain's app-ads.txt fetch,
/// independent of any search terms so a later request with different terms
/// can re-run the matcher without re-fetching. `content` is only populated
/// for the buffered (`sync`/`worker`) paths; a streamed body is never
/// resident, so a cache hit on a streamed fetch (`content: None`,
/// `exists: true`) re-fetches rather than replaying a stale search.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedAppAds {
    exists: bool,
    content: Option<String>,
    content_length: Option<u64>,
    url: Option<String>,
    error: Option<String>,
}

/// Thresholds governing execution-path selection and content retention.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// HEAD-reported length above which the `stream` path is used.
    pub stream_threshold_bytes: u64,
    /// Buffered-body length above which the `worker` path is used.
    pub sync_threshold_bytes: u64,
    /// Bound on the raw-content sample exposed on the report.
    pub content_sample_bytes: usize,
}

/// Fetch `domain`'s app-ads.txt file (or reuse the cached copy), analyse it
/// against `terms`, and return the caller-facing report.
pub async fn fetch_and_analyse(
    domain: &Domain,
    terms: &[SearchTerm],
    limits: FetchLimits,
    match_limits: MatchLimits,
    cache: &TieredCache,
    http: &HttpClient,
    analyser: &Analyser,
) -> AppAdsReport {
    let cache_key = format!("appads:{domain}");

    let cached: Option<CachedAppAds> = cache.get(&cache_key).await;
    if let Some(record) = cached.filter(|record| record.content.is_some() || !record.exists) {
        return build_report_from_content(
            record,
            terms,
            match_limits,
            limits.sync_threshold_bytes,
            limits.content_sample_bytes,
            analyser,
        )
        .await;
    }

    let url = format!("https://{domain}/app-ads.txt");
    let head = http.head(&url, &FetchOptions::default()).await.ok();
    let wants_stream = head
        .as_ref()
        .is_some_and(|head| should_stream(head.content_length, limits.stream_threshold_bytes));

    if wants_stream {
        return fetch_and_analyse_streamed(domain, &url, terms, match_limits, cache, &cache_key, http, analyser).await;
    }

    let record = fetch_buffered(domain, &url, http).await;
    let ttl = ttl_for(&record);
    cache.set(&cache_key, &record, ttl).await;
    build_report_from_content(
        record,
        terms,
        match_limits,
        limits.sync_threshold_bytes,
        limits.content_sample_bytes,
        analyser,
    )
    .await
}

fn ttl_for(record: &CachedAppAds) -> TtlClass {
    match (&record.error, record.exists) {
        (Some(_), _) => TtlClass::AppAdsTxtError,
        (None, true) => TtlClass::AppAdsTxtFound,
        (None, false) => TtlClass::AppAdsTxtMissing,
    }
}

async fn fetch_buffered(domain: &Domain, url: &str, http: &HttpClient) -> CachedAppAds {
    match http.fetch_text(url, &FetchOptions::default()).await {
        Ok(fetched) if fetched.status == 200 => CachedAppAds {
            exists: true,
            content_length: Some(fetched.body.len() as u64),
            content: Some(fetched.body),
            url: Some(fetched.final_url),
            error: None,
        },
        Ok(fetched) if fetched.status == 404 => CachedAppAds {
            exists: false,
            content: None,
            content_length: None,
            url: Some(fetched.final_url),
            error: None,
        },
        Ok(fetched) => CachedAppAds {
            exists: false,
            content: None,
            content_length: None,
            url: Some(fetched.final_url),
            error: Some(format!("unexpected status {}", fetched.status)),
        },
        Err(err) => {
            warn!(%domain, %err, "app-ads.txt fetch failed");
            CachedAppAds {
                exists: false,
                content: None,
                content_length: None,
                url: Some(url.to_string()),
                error: Some(err.to_string()),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn fetch_and_analyse_streamed(
    domain: &Domain,
    url: &str,
    terms: &[SearchTerm],
    match_limits: MatchLimits,
    cache: &TieredCache,
    cache_key: &str,
    http: &HttpClient,
    analyser: &Analyser,
) -> AppAdsReport {
    let stream = match http.fetch_stream(url, &FetchOptions::default()).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%domain, %err, "app-ads.txt stream fetch failed");
            let record = CachedAppAds {
                exists: false,
                content: None,
                content_length: None,
                url: Some(url.to_string()),
                error: Some(err.to_string()),
            };
            cache.set(cache_key, &record, TtlClass::AppAdsTxtError).await;
            return AppAdsReport {
                exists: false,
                url: Some(url.to_string()),
                content_sample: None,
                content_length: None,
                analysed: None,
                search: None,
                fetch_errors: Some(vec![FetchAttemptError {
                    url: url.to_string(),
                    status: None,
                    message: err.to_string(),
                }]),
                error: Some(err.to_string()),
                processing_method: ProcessingMethod::None,
            };
        }
    };

    let outcome = analyser.analyse_streaming(stream, terms, match_limits).await;
    let exists = outcome.analysis.error.is_none();

    let record = CachedAppAds {
        exists,
        content: None,
        content_length: None,
        url: Some(url.to_string()),
        error: outcome.analysis.error.clone(),
    };
    cache.set(cache_key, &record, ttl_for(&record)).await;

    AppAdsReport {
        exists,
        url: Some(url.to_string()),
        content_sample: outcome
            .head_sample
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        content_length: None,
        error: outcome.analysis.error.clone(),
        analysed: Some(outcome.analysis),
        search: outcome.search,
        fetch_errors: None,
        processing_method: outcome.processing_method,
    }
}

async fn build_report_from_content(
    record: CachedAppAds,
    terms: &[SearchTerm],
    match_limits: MatchLimits,
    sync_threshold_bytes: u64,
    content_sample_bytes: usize,
    analyser: &Analyser,
) -> AppAdsReport {
    let Some(content) = record.content else {
        return AppAdsReport {
            exists: record.exists,
            url: record.url,
            content_sample: None,
            content_length: record.content_length,
            analysed: None,
            search: None,
            fetch_errors: record.error.clone().map(|message| {
                vec![FetchAttemptError {
                    url: "app-ads.txt".to_string(),
                    status: None,
                    message,
                }]
            }),
            error: record.error,
            processing_method: ProcessingMethod::None,
        };
    };

    let content_sample = Some(truncate_sample(&content, content_sample_bytes));

    let outcome: AnalysisOutcome = if content.len() as u64 > sync_threshold_bytes {
        match analyser
            .analyse_on_worker(content.clone(), terms.to_vec(), match_limits)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "worker analysis failed, falling back to synchronous parse");
                Analyser::analyse_sync(&content, terms, match_limits)
            }
        }
    } else {
        Analyser::analyse_sync(&content, terms, match_limits)
    };

    AppAdsReport {
        exists: record.exists,
        url: record.url,
        content_sample,
        content_length: record.content_length,
        analysed: Some(outcome.analysis),
        search: outcome.search,
        fetch_errors: None,
        error: None,
        processing_method: outcome.processing_method,
    }
}

/// Bound `content` to at most `limit` bytes, trimmed back to the nearest
/// char boundary so the sample stays valid UTF-8 (mirrors the streaming
/// path's `head_sample` truncation).
fn truncate_sample(content: &str, limit: usize) -> String {
    if content.len() <= limit {
        return content.to_string();
    }
    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    content[..end].to_string()
}
