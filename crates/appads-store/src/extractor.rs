//! `extract_domain`: the per-store scrape pipeline from §4.6 steps 1-4 and 6.
//!
//! Step 5 (calling the app-ads.txt analyser for the derived domain) is the
//! orchestrator's responsibility, not this crate's; this module only
//! resolves a bundle id to a developer domain, caching the result under
//! `store:<kind>:<id>`.

use std::sync::Arc;

use appads_cache::TieredCache;
use appads_config::store_config;
use appads_httpclient::{FetchOptions, HttpClient};
use appads_ratelimit::{RateLimiterRegistry, WindowLimit};
use appads_types::{BundleId, Domain, StoreKind, TtlClass};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::canonical::canonicalise;
use crate::error::StoreError;
use crate::html::find_developer_url;

/// Cached outcome of resolving one `(store, bundle id)` pair to a developer
/// domain, independent of any search terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreExtraction {
    /// The developer URL discovered on the store listing, if any.
    pub developer_url: Option<String>,
    /// The canonical domain derived from `developer_url`.
    pub domain: Option<String>,
    /// Failure description, present only when extraction failed.
    pub error: Option<String>,
}

impl StoreExtraction {
    fn success(developer_url: String, domain: Domain) -> Self {
        Self {
            developer_url: Some(developer_url),
            domain: Some(domain.as_str().to_string()),
            error: None,
        }
    }

    fn failure(error: StoreError) -> Self {
        Self {
            developer_url: None,
            domain: None,
            error: Some(error.to_string()),
        }
    }
}

/// Dependencies `extract_domain` needs, bundled for convenient threading
/// through the orchestrator's fallback chain.
#[derive(Clone)]
pub struct StoreDeps {
    /// Shared tiered cache.
    pub cache: Arc<TieredCache>,
    /// Shared outbound HTTP client.
    pub http: Arc<HttpClient>,
    /// Shared per-resource-key rate limiter registry.
    pub rate_limiter: Arc<RateLimiterRegistry>,
}

/// Resolve `bundle_id`'s developer domain against `store`, consulting and
/// populating the `store:<kind>:<id>` cache entry (§4.6 steps 1-4, 6).
///
/// A cache hit always short-circuits the store-page fetch: the cached
/// extraction's domain is reused regardless of search terms, since this
/// crate does not carry search terms through the fetch path at all (the
/// orchestrator re-runs the app-ads.txt analysis separately per §4.6 step 2).
pub async fn extract_domain(
    bundle_id: &BundleId,
    store: StoreKind,
    deps: &StoreDeps,
) -> Result<Domain, StoreError> {
    if store == StoreKind::Unknown {
        return Err(StoreError::UnrecognisedStore);
    }

    let cache_key = format!("store:{}:{}", store.as_str(), bundle_id.as_str());
    if let Some(cached) = deps.cache.get::<StoreExtraction>(&cache_key).await {
        return match cached.domain {
            Some(domain) => Domain::parse(domain).map_err(|err| StoreError::InvalidDomain(err.to_string())),
            None => Err(cached
                .error
                .map(StoreError::Fetch)
                .unwrap_or(StoreError::NoDeveloperUrl)),
        };
    }

    let result = fetch_and_extract(bundle_id, store, deps).await;

    let (entry, ttl) = match &result {
        Ok(domain) => {
            let config = store_config(store);
            (
                StoreExtraction::success(config.listing_url(bundle_id), domain.clone()),
                TtlClass::StoreSuccess,
            )
        }
        Err(err) => (StoreExtraction::failure(err.clone()), TtlClass::StoreError),
    };
    deps.cache.set(&cache_key, &entry, ttl).await;

    result
}

async fn fetch_and_extract(
    bundle_id: &BundleId,
    store: StoreKind,
    deps: &StoreDeps,
) -> Result<Domain, StoreError> {
    let config = store_config(store);
    let url = config.listing_url(bundle_id);

    deps.rate_limiter
        .acquire(
            store.as_str(),
            WindowLimit {
                requests: config.rate_limit.requests,
                window: std::time::Duration::from_millis(config.rate_limit.window_ms),
            },
        )
        .await;

    let fetched = deps
        .http
        .fetch_text(&url, &FetchOptions::default())
        .await
        .map_err(|err| StoreError::Fetch(err.to_string()))?;

    if fetched.status >= 400 {
        deps.rate_limiter.report_error(store.as_str(), fetched.status);
        return Err(StoreError::Fetch(format!("listing page returned status {}", fetched.status)));
    }
    deps.rate_limiter.report_success(store.as_str());

    let developer_url = find_developer_url(&fetched.body, config).ok_or(StoreError::NoDeveloperUrl)?;
    let domain = canonicalise(&developer_url)?;
    info!(store = store.as_str(), bundle_id = %bundle_id.as_str(), domain = %domain, "resolved developer domain");
    Ok(domain)
}
