//! `ApiServer`: route assembly and the bind/serve loop.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use appads_telemetry::{propagate_request_id_layer, set_request_id_layer};

use crate::handlers::{batch, csv, extract, health, stream};
use crate::state::ApiState;

/// The bound HTTP surface: the router plus the listening address it was
/// built for.
pub struct ApiServer {
    router: Router,
    bind_addr: String,
    drain_timeout: Duration,
}

impl ApiServer {
    /// Assemble the router over `state`, layering request-id propagation,
    /// request tracing, and a permissive CORS policy (the same order the
    /// teacher's HTTP surface uses: id layers closest to the connection,
    /// tracing around everything, CORS outermost).
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let bind_addr = state.settings.bind_addr.clone();
        let drain_timeout = state.settings.shutdown_drain_timeout;
        let cap = usize::try_from(state.settings.request_json_cap_bytes).unwrap_or(usize::MAX);

        let router = Router::new()
            .route("/api/extract", post(extract::extract))
            .route("/api/check-app-ads", get(extract::check_app_ads))
            .route("/api/structured-search", post(extract::structured_search))
            .route("/api/extract-multiple", post(batch::extract_multiple))
            .route("/api/export-csv", post(csv::export_csv))
            .route("/api/stream/extract-multiple", post(stream::stream_extract_multiple))
            .route("/api/stream/export-csv", post(stream::stream_export_csv))
            .route("/health", get(health::health))
            .route("/api/stats", get(health::stats))
            .route("/metrics", get(health::metrics))
            .layer(DefaultBodyLimit::max(cap))
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        Self { router, bind_addr, drain_timeout }
    }

    /// Bind and serve until `shutdown_signal` resolves, then stop accepting
    /// new connections and give in-flight ones up to the configured drain
    /// timeout to finish before returning, forcing the return if they
    /// haven't by then.
    pub async fn serve(self, shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr: SocketAddr = self.bind_addr.parse().with_context(|| format!("invalid bind address {}", self.bind_addr))?;
        let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(%addr, "listening");

        let drain_timeout = self.drain_timeout;
        let (drain_tx, drain_rx) = tokio::sync::oneshot::channel();
        let graceful = async move {
            shutdown_signal.await;
            tracing::info!("shutdown signal received, draining in-flight requests");
            let _ = drain_tx.send(());
        };

        let serve_future = axum::serve(listener, self.router).with_graceful_shutdown(graceful);
        let forced_deadline = async move {
            if drain_rx.await.is_ok() {
                tokio::time::sleep(drain_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = serve_future => result.context("server error"),
            () = forced_deadline => {
                tracing::warn!(?drain_timeout, "drain timeout elapsed, forcing shutdown");
                Ok(())
            }
        }
    }
}
