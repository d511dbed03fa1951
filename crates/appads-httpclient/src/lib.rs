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

//! Outbound HTTP fetch (§4.1): redirect-following, UA rotation, linear-backoff
//! retry on transient failures, a response size cap, and an optional
//! streaming body that never buffers the whole response.

pub mod client;
pub mod error;
pub mod user_agent;

pub use client::{ByteStream, FetchOptions, FetchedHead, FetchedText, HttpClient};
pub use error::FetchError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fetch_options_have_no_overrides() {
        let opts = FetchOptions::default();
        assert!(!opts.stable_ua);
        assert!(opts.timeout.is_none());
        assert!(opts.size_cap_bytes.is_none());
        assert!(opts.retry_attempts.is_none());
    }

    #[tokio::test]
    async fn fetch_text_rejects_malformed_urls() {
        let client = HttpClient::new();
        let err = client
            .fetch_text("not a url", &FetchOptions::default())
            .await
            .unwrap_err();
        matches!(err, FetchError::InvalidUrl(_));
    }
}
