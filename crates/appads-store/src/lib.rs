#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]

//! Per-store URL templating, HTML extraction, and domain canonicalisation
//! (§4.6).
//!
//! Layout: `html.rs` (regex-then-DOM-selector developer-URL extraction),
//! `canonical.rs` (public-suffix-aware domain canonicalisation), `error.rs`
//! (failure taxonomy), `extractor.rs` (`extract_domain`, the composed
//! per-store pipeline, with its own `store:<kind>:<id>` cache entry).

mod canonical;
mod error;
mod extractor;
mod html;

pub use canonical::canonicalise;
pub use error::StoreError;
pub use extractor::{extract_domain, StoreDeps, StoreExtraction};
pub use html::find_developer_url;

#[cfg(test)]
mod tests {
    use super::*;
    use appads_cache::TieredCache;
    use appads_httpclient::HttpClient;
    use appads_ratelimit::RateLimiterRegistry;
    use appads_types::{BundleId, StoreKind};
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_store_is_rejected_without_any_fetch() {
        let deps = StoreDeps {
            cache: Arc::new(TieredCache::new(10, std::env::temp_dir().join("appads-store-test"), None).unwrap()),
            http: Arc::new(HttpClient::new()),
            rate_limiter: Arc::new(RateLimiterRegistry::new()),
        };
        let bundle_id = BundleId::parse("com.example.app").unwrap();
        let err = extract_domain(&bundle_id, StoreKind::Unknown, &deps).await.unwrap_err();
        assert_eq!(err, StoreError::UnrecognisedStore);
    }
}
