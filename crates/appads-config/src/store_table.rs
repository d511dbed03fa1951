//! The static per-store configuration table from §3/§6: URL templates,
//! ordered HTML extractor patterns, DOM-selector fallbacks, and rate-limit
//! parameters. Built once at process startup and never mutated afterwards.

use appads_types::{BundleId, StoreKind};

/// Rate-limit parameters for a single resource key (§4.2).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitParams {
    /// Maximum acquisitions granted within `window_ms`.
    pub requests: u32,
    /// Window length, in milliseconds.
    pub window_ms: u64,
}

/// Per-store scraping configuration (§3 `StoreConfig`, §4.6).
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// `StoreKind` this configuration applies to.
    pub kind: StoreKind,
    /// URL template; `{id}` is substituted with the bundle id (or, for the
    /// App Store, with the numeric id prefixed by `id`).
    pub url_template: &'static str,
    /// Ordered regex extractor patterns against the HTML body. The first
    /// pattern producing a non-empty capture wins.
    pub extractors: &'static [&'static str],
    /// Fallback DOM selectors, tried in order if no regex extractor matched.
    pub dom_selectors: &'static [&'static str],
    /// Outbound rate-limit parameters for this store's listing pages.
    pub rate_limit: RateLimitParams,
}

impl StoreConfig {
    /// Render the store-listing URL for `bundle_id` per this store's template.
    #[must_use]
    pub fn listing_url(&self, bundle_id: &BundleId) -> String {
        match self.kind {
            StoreKind::Appstore => self
                .url_template
                .replace("{id}", &format!("id{}", bundle_id.as_str())),
            _ => self.url_template.replace("{id}", bundle_id.as_str()),
        }
    }
}

const GOOGLEPLAY: StoreConfig = StoreConfig {
    kind: StoreKind::Googleplay,
    url_template: "https://play.google.com/store/apps/details?id={id}",
    extractors: &[
        r#"(?i)developer['\"]?\s*[:=]\s*['\"](https?://[^'\"]+)['\"]"#,
        r#"(?i)href=['\"](https?://[^'\"]*?)['\"][^>]*>\s*Visit website"#,
    ],
    dom_selectors: &[
        "a[href^='https://']:contains('Visit website')",
        "meta[itemprop='url']",
    ],
    rate_limit: RateLimitParams {
        requests: 10,
        window_ms: 1_000,
    },
};

const APPSTORE: StoreConfig = StoreConfig {
    kind: StoreKind::Appstore,
    url_template: "https://apps.apple.com/app/{id}",
    extractors: &[
        r#"(?i)<a[^>]*href=['\"](https?://[^'\"]+)['\"][^>]*>\s*App Support"#,
        r#"(?i)"sellerUrl"\s*:\s*"(https?://[^"]+)""#,
    ],
    dom_selectors: &["a.link-text[href^='https://']"],
    rate_limit: RateLimitParams {
        requests: 8,
        window_ms: 1_000,
    },
};

const AMAZON: StoreConfig = StoreConfig {
    kind: StoreKind::Amazon,
    url_template: "https://www.amazon.com/dp/{id}",
    extractors: &[r#"(?i)href=['\"](https?://[^'\"]*?)['\"][^>]*>\s*Visit the [^<]* Website"#],
    dom_selectors: &["a#bylineInfo[href^='https://']"],
    rate_limit: RateLimitParams {
        requests: 5,
        window_ms: 1_000,
    },
};

const ROKU: StoreConfig = StoreConfig {
    kind: StoreKind::Roku,
    url_template: "https://channelstore.roku.com/details/{id}",
    extractors: &[r#"(?i)href=['\"](https?://(?!channelstore\.roku\.com)[^'\"]+)['\"]"#],
    dom_selectors: &["a.developer-link[href^='https://']"],
    rate_limit: RateLimitParams {
        requests: 5,
        window_ms: 1_000,
    },
};

const SAMSUNG: StoreConfig = StoreConfig {
    kind: StoreKind::Samsung,
    url_template: "https://apps.samsung.com/tv/detail.as?appId={id}",
    extractors: &[r#"(?i)href=['\"](https?://(?!apps\.samsung\.com)[^'\"]+)['\"][^>]*>\s*Homepage"#],
    dom_selectors: &["a.homepage-link[href^='https://']"],
    rate_limit: RateLimitParams {
        requests: 5,
        window_ms: 1_000,
    },
};

/// Look up the static configuration for a store kind.
///
/// # Panics
///
/// Panics if called with [`StoreKind::Unknown`]; callers must reject unknown
/// stores before reaching the extractor (§4.6 step 1).
#[must_use]
pub const fn store_config(kind: StoreKind) -> &'static StoreConfig {
    match kind {
        StoreKind::Googleplay => &GOOGLEPLAY,
        StoreKind::Appstore => &APPSTORE,
        StoreKind::Amazon => &AMAZON,
        StoreKind::Roku => &ROKU,
        StoreKind::Samsung => &SAMSUNG,
        StoreKind::Unknown => panic!("store_config called with StoreKind::Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_substitutes_plain_id() {
        let id = BundleId::parse("com.example.game").unwrap();
        let url = store_config(StoreKind::Googleplay).listing_url(&id);
        assert_eq!(
            url,
            "https://play.google.com/store/apps/details?id=com.example.game"
        );
    }

    #[test]
    fn listing_url_prefixes_appstore_ids() {
        let id = BundleId::parse("1234567890").unwrap();
        let url = store_config(StoreKind::Appstore).listing_url(&id);
        assert_eq!(url, "https://apps.apple.com/app/id1234567890");
    }

    #[test]
    fn every_fallback_store_has_a_config() {
        for kind in StoreKind::fallback_order() {
            let config = store_config(kind);
            assert_eq!(config.kind, kind);
            assert!(!config.extractors.is_empty());
        }
    }
}
