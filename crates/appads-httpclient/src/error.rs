//! Errors raised by outbound fetches.

use thiserror::Error;

/// Outcome of a single outbound fetch attempt, after retries are exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request URL was not a well-formed absolute http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Every retry attempt failed at the transport layer.
    #[error("network error after {attempts} attempt(s): {source}")]
    Network {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Underlying transport error from the final attempt.
        #[source]
        source: reqwest::Error,
    },
    /// The final attempt returned a non-success status not worth retrying
    /// further (e.g. a stable `4xx` other than 408/429).
    #[error("upstream returned status {status}")]
    Status {
        /// The HTTP status code returned.
        status: u16,
    },
    /// The response body (or its declared `Content-Length`) exceeded the
    /// configured cap.
    #[error("response exceeded size cap of {cap_bytes} bytes")]
    ResponseTooLarge {
        /// The configured cap that was exceeded.
        cap_bytes: u64,
    },
    /// The response body could not be decoded as text.
    #[error("failed to decode response body as text: {0}")]
    Decode(String),
}
