//! `GET /health`, `GET /api/stats`, and `GET /metrics`: process and
//! pipeline observability (§6), grounded on the cache/worker-pool stats
//! accessors rather than anything handler-local.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use appads_telemetry::build_sha;

use crate::dto::{CacheStatsBody, HealthResponse, StatsBody, StatsResponse, WorkerStatsBody};
use crate::state::ApiState;

fn cache_stats_body(state: &ApiState) -> CacheStatsBody {
    let stats = state.cache.stats();
    CacheStatsBody {
        memory_hits: stats.memory_hits,
        disk_hits: stats.disk_hits,
        remote_hits: stats.remote_hits,
        misses: stats.misses,
    }
}

fn worker_stats_body(state: &ApiState) -> WorkerStatsBody {
    WorkerStatsBody {
        queue_depth: i64::try_from(state.worker_pool.queue_depth()).unwrap_or(i64::MAX),
        active: i64::try_from(state.worker_pool.active_workers()).unwrap_or(i64::MAX),
    }
}

/// `GET /health`: a liveness probe that also surfaces cache hit rates, so a
/// flatlined memory-hit counter is visible without a full `/api/stats` call.
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "up",
        uptime: state.uptime_secs(),
        cache_stats: cache_stats_body(&state),
        version: build_sha(),
    })
}

/// `GET /api/stats`: cache, worker-pool, and uptime stats for dashboards.
pub async fn stats(State(state): State<ApiState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: StatsBody {
            cache: cache_stats_body(&state),
            workers: worker_stats_body(&state),
            uptime_seconds: state.uptime_secs(),
        },
    })
}

/// `GET /metrics`: the Prometheus text-exposition scrape target.
pub async fn metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(body) => {
            let mut response = body.into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain; version=0.0.4"));
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to render metrics");
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}
