//! Developer-URL extraction from a store listing page's HTML body (§4.6
//! steps 2-3): an ordered list of regex extractors, falling back to DOM
//! selectors when none match.

use appads_config::StoreConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;

static REGEX_CACHE: Lazy<Mutex<HashMap<&'static str, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Find the first developer URL on `html`, trying `config.extractors` (regex,
/// in order) before `config.dom_selectors` (DOM selectors, in order).
#[must_use]
pub fn find_developer_url(html: &str, config: &StoreConfig) -> Option<String> {
    for pattern in config.extractors {
        if let Some(url) = apply_extractor(pattern, html) {
            return Some(url);
        }
    }

    let document = Html::parse_document(html);
    for selector_str in config.dom_selectors {
        if let Ok(selector) = Selector::parse(selector_str)
            && let Some(url) = document
                .select(&selector)
                .find_map(|el| el.value().attr("href").or_else(|| el.value().attr("content")))
        {
            return Some(url.to_string());
        }
    }

    None
}

fn apply_extractor(pattern: &'static str, html: &str) -> Option<String> {
    let mut cache = REGEX_CACHE.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let regex = cache
        .entry(pattern)
        .or_insert_with(|| Regex::new(pattern).expect("store extractor patterns are valid regexes"));
    regex
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_config::store_config;
    use appads_types::StoreKind;

    #[test]
    fn regex_extractor_wins_over_dom_selector() {
        let html = r#"<html><body><script>window.data = {developer: "https://example.com/"};</script>
            <meta itemprop="url" content="https://other.example.com"></body></html>"#;
        let config = store_config(StoreKind::Googleplay);
        let found = find_developer_url(html, config);
        assert_eq!(found.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn dom_selector_fallback_finds_meta_url() {
        let html = r#"<html><head><meta itemprop="url" content="https://developer.example.com"></head><body></body></html>"#;
        let config = store_config(StoreKind::Googleplay);
        let found = find_developer_url(html, config);
        assert_eq!(found.as_deref(), Some("https://developer.example.com"));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let html = "<html><body><p>no links here</p></body></html>";
        let config = store_config(StoreKind::Googleplay);
        assert!(find_developer_url(html, config).is_none());
    }
}
