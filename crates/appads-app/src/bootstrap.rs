use std::sync::Arc;

use appads_analyser::Analyser;
use appads_api::{ApiServer, ApiState};
use appads_batch::ResultCache;
use appads_cache::TieredCache;
use appads_config::Settings;
use appads_httpclient::HttpClient;
use appads_orchestrator::{FetchLimits, Orchestrator};
use appads_ratelimit::RateLimiterRegistry;
use appads_store::StoreDeps;
use appads_telemetry::{LoggingConfig, Metrics, init_logging};
use appads_worker::{WorkerPool, WorkerPoolConfig};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the application, built once from
/// [`Settings`] and handed to [`ApiServer::new`].
pub(crate) struct BootstrapDependencies {
    settings: Arc<Settings>,
    cache: Arc<TieredCache>,
    api_state: ApiState,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) async fn from_env() -> AppResult<Self> {
        let settings = Settings::from_env().map_err(|err| AppError::config("settings.from_env", err))?;
        let settings = Arc::new(settings);

        let metrics = Metrics::new().map_err(|err| AppError::telemetry("metrics.new", err))?;

        let http = Arc::new(HttpClient::new());
        let rate_limiter = Arc::new(RateLimiterRegistry::new());
        let cache = Arc::new(
            TieredCache::new(settings.memory_max_items, settings.cache_dir.clone(), None)
                .map_err(|err| AppError::cache("tiered_cache.new", err))?,
        );

        let worker_pool = Arc::new(WorkerPool::new(WorkerPoolConfig {
            min_workers: settings.worker_min,
            max_workers: settings.worker_max,
            idle_timeout: settings.worker_idle_timeout,
            task_timeout: settings.worker_task_timeout,
            max_rss_mb: settings.worker_max_rss_mb,
            max_heap_mb: settings.worker_max_heap_mb,
            ..WorkerPoolConfig::default()
        }));

        let analyser = Arc::new(Analyser::new(Arc::clone(&worker_pool), settings.content_sample_bytes));

        let store_deps = StoreDeps {
            cache: Arc::clone(&cache),
            http: Arc::clone(&http),
            rate_limiter,
        };
        let fetch_limits = FetchLimits {
            stream_threshold_bytes: settings.stream_threshold_bytes,
            sync_threshold_bytes: settings.sync_threshold_bytes,
            content_sample_bytes: settings.content_sample_bytes,
        };
        let orchestrator = Orchestrator::new(store_deps, Arc::clone(&cache), Arc::clone(&http), Arc::clone(&analyser), fetch_limits);

        let result_cache = Arc::new(ResultCache::new(settings.batch_result_cache_ttl));

        let api_state = ApiState {
            orchestrator,
            result_cache,
            cache: Arc::clone(&cache),
            http,
            analyser,
            worker_pool,
            metrics,
            settings: Arc::clone(&settings),
            started_at: std::time::Instant::now(),
        };

        Ok(Self { settings, cache, api_state })
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or the HTTP server fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env().await?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies to simplify testing.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let logging = LoggingConfig::default();
    init_logging(&logging).map_err(|err| AppError::telemetry("logging.init", err))?;

    info!(bind_addr = %dependencies.settings.bind_addr, "app-ads.txt resolver starting");

    tokio::spawn(disk_cleanup_loop(Arc::clone(&dependencies.cache), Arc::clone(&dependencies.settings)));

    let server = ApiServer::new(dependencies.api_state);

    server
        .serve(shutdown_signal())
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;

    info!("server shutdown complete");
    Ok(())
}

/// Periodically sweeps the on-disk cache tier's expired entries in batches,
/// mirroring the remote tier's own probe-interval background task.
async fn disk_cleanup_loop(cache: Arc<TieredCache>, settings: Arc<Settings>) {
    let mut ticker = tokio::time::interval(settings.disk_cleanup_interval);
    loop {
        ticker.tick().await;
        match cache.disk_cleanup_batch(settings.disk_cleanup_batch_size) {
            Ok(removed) => info!(removed, "disk cache cleanup batch completed"),
            Err(err) => warn!(%err, "disk cache cleanup batch failed"),
        }
    }
}

/// Resolves on SIGTERM or SIGINT (Ctrl-C), whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            std::future::pending::<()>().await;
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_dependencies_build_from_default_environment() {
        let dependencies = BootstrapDependencies::from_env().await;
        assert!(dependencies.is_ok());
    }
}
