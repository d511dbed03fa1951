//! Store kind detection: maps a [`BundleId`](crate::bundle::BundleId) onto one
//! of the supported app stores.

use serde::{Deserialize, Serialize};

use crate::bundle::BundleId;

/// Closed set of app stores the resolver knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Google Play, identified by Java-style reverse-DNS package names.
    Googleplay,
    /// Apple App Store, identified by a numeric `id<n>` style identifier.
    Appstore,
    /// Amazon Appstore, identified by an ASIN-shaped identifier.
    Amazon,
    /// Roku Channel Store, identified by a short numeric channel id.
    Roku,
    /// Samsung Smart TV / Galaxy Store, identified by a `G...` id.
    Samsung,
    /// The bundle id did not match any known store pattern.
    Unknown,
}

impl StoreKind {
    /// All stores the orchestrator's fallback chain walks through, in the
    /// fixed order defined by §4.7 of the specification.
    #[must_use]
    pub const fn fallback_order() -> [Self; 5] {
        [
            Self::Googleplay,
            Self::Appstore,
            Self::Amazon,
            Self::Roku,
            Self::Samsung,
        ]
    }

    /// Stable lowercase key used in cache keys, metrics labels, and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Googleplay => "googleplay",
            Self::Appstore => "appstore",
            Self::Amazon => "amazon",
            Self::Roku => "roku",
            Self::Samsung => "samsung",
            Self::Unknown => "unknown",
        }
    }

    /// Detect the most likely store for a bundle id using the pattern table
    /// from §3. This is a best-effort, non-exclusive classification used to
    /// pick the first store to try; the orchestrator's fallback chain covers
    /// the case where the guess is wrong.
    #[must_use]
    pub fn detect(bundle_id: &BundleId) -> Self {
        let value = bundle_id.as_str();

        if value.starts_with('G') && value.len() > 1 && value[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
            return Self::Samsung;
        }
        if value.len() <= 8 && !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return Self::Roku;
        }
        if value.chars().all(|c| c.is_ascii_digit()) && !value.is_empty() {
            return Self::Appstore;
        }
        if value.len() == 10
            && value.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && value.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Self::Amazon;
        }
        if value.contains('.')
            && value
                .split('.')
                .all(|segment| !segment.is_empty() && segment.chars().all(is_package_segment_char))
        {
            return Self::Googleplay;
        }

        Self::Unknown
    }
}

fn is_package_segment_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_google_play_package_names() {
        let id = BundleId::parse("com.example.game").unwrap();
        assert_eq!(StoreKind::detect(&id), StoreKind::Googleplay);
    }

    #[test]
    fn detects_numeric_app_store_ids() {
        let id = BundleId::parse("1234567890").unwrap();
        assert_eq!(StoreKind::detect(&id), StoreKind::Appstore);
    }

    #[test]
    fn detects_samsung_ids() {
        let id = BundleId::parse("G00123456X").unwrap();
        assert_eq!(StoreKind::detect(&id), StoreKind::Samsung);
    }

    #[test]
    fn rejects_unrecognisable_ids() {
        let id = BundleId::parse("!!!").unwrap();
        assert_eq!(StoreKind::detect(&id), StoreKind::Unknown);
    }

    #[test]
    fn fallback_order_is_fixed() {
        assert_eq!(
            StoreKind::fallback_order(),
            [
                StoreKind::Googleplay,
                StoreKind::Appstore,
                StoreKind::Amazon,
                StoreKind::Roku,
                StoreKind::Samsung,
            ]
        );
    }
}
