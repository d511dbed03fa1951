//! The bespoke JSON chunk-streaming envelope (§4.9): `/api/stream/extract-multiple`
//! and `/api/stream/export-csv` never buffer the whole batch in memory.
//! Results are flushed to the connection as each bundle's resolution
//! completes (completion order, not input order), with a `/* ... */`
//! heartbeat comment inserted whenever more than [`HEARTBEAT_INTERVAL`]
//! passes without a new result, so the connection stays alive through a
//! slow upstream fetch. A single bundle's failure never closes the
//! connection: `Orchestrator::resolve` already folds it into a failed
//! `ExtractionResult`.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

use appads_analyser::MatchLimits;
use appads_orchestrator::Orchestrator;
use appads_types::{BundleId, ExtractionResult, SearchTerm};

use crate::csv;

/// How long the stream waits for the next completed result before emitting
/// a heartbeat comment to keep the connection alive.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Build the streaming-envelope response for `/api/stream/extract-multiple`.
/// `concurrency` bounds how many `valid_ids` are in flight at once, matching
/// the ceiling `appads-batch::resolve_many` applies to the non-streaming path.
#[must_use]
pub fn extraction_stream_response(
    orchestrator: Orchestrator,
    valid_ids: Vec<BundleId>,
    skipped: usize,
    terms: Vec<SearchTerm>,
    match_limits: MatchLimits,
    concurrency: usize,
) -> Response {
    let total = valid_ids.len();

    let body = stream! {
        yield Ok::<Bytes, Infallible>(Bytes::from_static(b"{\"success\":true,\"results\":["));

        let concurrency = concurrency.max(1);
        let mut pending = valid_ids.into_iter();
        let mut in_flight = FuturesUnordered::new();
        for bundle_id in pending.by_ref().take(concurrency) {
            let orchestrator = orchestrator.clone();
            let terms = terms.clone();
            in_flight.push(async move { orchestrator.resolve(&bundle_id, &terms, match_limits).await });
        }

        let mut first = true;
        while !in_flight.is_empty() {
            match tokio::time::timeout(HEARTBEAT_INTERVAL, in_flight.next()).await {
                Ok(Some(result)) => {
                    if let Some(bundle_id) = pending.next() {
                        let orchestrator = orchestrator.clone();
                        let terms = terms.clone();
                        in_flight.push(async move { orchestrator.resolve(&bundle_id, &terms, match_limits).await });
                    }
                    yield Ok(json_chunk(&result, &mut first));
                }
                Ok(None) => break,
                Err(_) => yield Ok(Bytes::from_static(b"/* ... */")),
            }
        }

        let footer = format!("],\"totalProcessed\":{total},\"skipped\":{skipped}}}");
        yield Ok(Bytes::from(footer));
    };

    let mut response = Response::new(Body::from_stream(body));
    response.headers_mut().insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    response
}

/// Build the streaming-envelope response for `/api/stream/export-csv`: the
/// same completion-order, heartbeat-bearing stream, rendered as CSV rows
/// instead of JSON objects, with the full (uncapped-by-pagination) result
/// set and no trailing metadata object. `concurrency` bounds in-flight
/// fetches the same way `extraction_stream_response` does.
#[must_use]
pub fn csv_stream_response(
    orchestrator: Orchestrator,
    valid_ids: Vec<BundleId>,
    terms: Vec<SearchTerm>,
    match_limits: MatchLimits,
    concurrency: usize,
) -> Response {
    let body = stream! {
        yield Ok::<Bytes, Infallible>(Bytes::from(csv::HEADER));

        let concurrency = concurrency.max(1);
        let mut pending = valid_ids.into_iter();
        let mut in_flight = FuturesUnordered::new();
        for bundle_id in pending.by_ref().take(concurrency) {
            let orchestrator = orchestrator.clone();
            let terms = terms.clone();
            in_flight.push(async move { orchestrator.resolve(&bundle_id, &terms, match_limits).await });
        }

        while !in_flight.is_empty() {
            match tokio::time::timeout(HEARTBEAT_INTERVAL, in_flight.next()).await {
                Ok(Some(result)) => {
                    if let Some(bundle_id) = pending.next() {
                        let orchestrator = orchestrator.clone();
                        let terms = terms.clone();
                        in_flight.push(async move { orchestrator.resolve(&bundle_id, &terms, match_limits).await });
                    }
                    yield Ok(Bytes::from(csv::row_for(&result)));
                }
                Ok(None) => break,
                Err(_) => yield Ok(Bytes::from_static(b"# heartbeat\n")),
            }
        }
    };

    let mut response = Response::new(Body::from_stream(body));
    response.headers_mut().insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/csv"));
    response
}

fn json_chunk(result: &ExtractionResult, first: &mut bool) -> Bytes {
    let encoded = serde_json::to_vec(result).unwrap_or_default();
    if *first {
        *first = false;
        Bytes::from(encoded)
    } else {
        let mut chunk = Vec::with_capacity(encoded.len() + 1);
        chunk.push(b',');
        chunk.extend_from_slice(&encoded);
        Bytes::from(chunk)
    }
}
