//! Errors raised while resolving a bundle id's developer domain.

use thiserror::Error;

/// Failure modes for [`crate::extractor::extract_domain`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The bundle id did not match any known store's id pattern.
    #[error("bundle id does not match a recognised store")]
    UnrecognisedStore,
    /// The outbound fetch of the store listing page failed.
    #[error("fetch of store listing page failed: {0}")]
    Fetch(String),
    /// Neither the regex extractors nor the DOM-selector fallbacks found a
    /// developer URL on the listing page.
    #[error("no developer URL found on the store listing page")]
    NoDeveloperUrl,
    /// The discovered developer URL did not canonicalise to a valid,
    /// registrable domain.
    #[error("developer URL did not canonicalise to a valid domain: {0}")]
    InvalidDomain(String),
}
