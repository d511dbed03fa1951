//! `HttpClient`: outbound fetch with retry, UA rotation, and size-capped,
//! optionally streamed bodies (§4.1).

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_core::Stream;
use reqwest::{Client, StatusCode, redirect::Policy};
use tracing::warn;

use crate::error::FetchError;
use crate::user_agent::{random_user_agent, stable_user_agent};

const MAX_REDIRECTS: usize = 5;
const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_HEAD_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_SIZE_CAP_BYTES: u64 = 20 * 1024 * 1024;
const DEFAULT_POOL_SIZE: usize = 64;

/// Per-call fetch options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Use the stable (first) user agent instead of a random one.
    pub stable_ua: bool,
    /// Override the per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Override the response size cap, in bytes.
    pub size_cap_bytes: Option<u64>,
    /// Override the retry attempt count.
    pub retry_attempts: Option<u32>,
}

/// The decoded outcome of `fetch_text`.
#[derive(Debug, Clone)]
pub struct FetchedText {
    /// Decoded response body.
    pub body: String,
    /// Final HTTP status code.
    pub status: u16,
    /// The URL the response was ultimately served from, after redirects.
    pub final_url: String,
}

/// The outcome of a `head` probe.
#[derive(Debug, Clone)]
pub struct FetchedHead {
    /// Final HTTP status code.
    pub status: u16,
    /// `Content-Length`, when the server reported one.
    pub content_length: Option<u64>,
    /// The URL the response was ultimately served from, after redirects.
    pub final_url: String,
}

/// A finite, non-restartable byte stream over a response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// Outbound HTTP client: retry, UA rotation, gzip/deflate/br decoding, and a
/// response size cap, built once and shared across the process.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_size_cap: u64,
    default_retry_attempts: u32,
}

impl HttpClient {
    /// Build a client with the default connection pool, redirect policy, and
    /// size cap.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest` client cannot be constructed (for
    /// example, if the platform's TLS backend is unavailable); this mirrors
    /// `reqwest::Client::new`'s own panicking contract and only happens once
    /// at process startup.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(DEFAULT_POOL_SIZE)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            default_size_cap: DEFAULT_SIZE_CAP_BYTES,
            default_retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Fetch `url` as decoded text, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the URL is malformed, every retry attempt
    /// fails, the final attempt returns a non-retryable error status, the
    /// response exceeds the size cap, or the body is not valid UTF-8.
    pub async fn fetch_text(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<FetchedText, FetchError> {
        let cap = opts.size_cap_bytes.unwrap_or(self.default_size_cap);
        let timeout = opts.timeout.unwrap_or(DEFAULT_TEXT_TIMEOUT);
        let attempts = opts.retry_attempts.unwrap_or(self.default_retry_attempts);

        let response = self.fetch_with_retry(url, opts, timeout, attempts).await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if let Some(len) = response.content_length()
            && len > cap
        {
            return Err(FetchError::ResponseTooLarge { cap_bytes: cap });
        }

        let bytes = collect_capped(response, cap).await?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|err| FetchError::Decode(err.to_string()))?;

        Ok(FetchedText {
            body,
            status,
            final_url,
        })
    }

    /// Probe `url` with a `HEAD` request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the URL is malformed or every retry attempt
    /// fails.
    pub async fn head(&self, url: &str, opts: &FetchOptions) -> Result<FetchedHead, FetchError> {
        let timeout = opts.timeout.unwrap_or(DEFAULT_HEAD_TIMEOUT);
        let attempts = opts.retry_attempts.unwrap_or(self.default_retry_attempts);

        let response = self
            .request_with_retry(reqwest::Method::HEAD, url, opts, timeout, attempts)
            .await?;

        Ok(FetchedHead {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            final_url: response.url().to_string(),
        })
    }

    /// Fetch `url` as a lazy, size-capped byte stream that never buffers the
    /// whole body. The stream is finite and not restartable.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the URL is malformed or every retry attempt
    /// fails before the stream can begin.
    pub async fn fetch_stream(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> Result<ByteStream, FetchError> {
        let cap = opts.size_cap_bytes.unwrap_or(self.default_size_cap);
        let timeout = opts.timeout.unwrap_or(DEFAULT_TEXT_TIMEOUT);
        let attempts = opts.retry_attempts.unwrap_or(self.default_retry_attempts);

        let response = self.fetch_with_retry(url, opts, timeout, attempts).await?;
        if let Some(len) = response.content_length()
            && len > cap
        {
            return Err(FetchError::ResponseTooLarge { cap_bytes: cap });
        }

        let inner = response.bytes_stream();
        let stream = capped_byte_stream(inner, cap);
        Ok(Box::pin(stream))
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        opts: &FetchOptions,
        timeout: Duration,
        attempts: u32,
    ) -> Result<reqwest::Response, FetchError> {
        self.request_with_retry(reqwest::Method::GET, url, opts, timeout, attempts)
            .await
    }

    async fn request_with_retry(
        &self,
        method: reqwest::Method,
        url: &str,
        opts: &FetchOptions,
        timeout: Duration,
        attempts: u32,
    ) -> Result<reqwest::Response, FetchError> {
        let parsed = url::Url::parse(url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        let user_agent = if opts.stable_ua {
            stable_user_agent()
        } else {
            random_user_agent()
        };

        for attempt in 1..=attempts.max(1) {
            let request = self
                .client
                .request(method.clone(), parsed.clone())
                .header(reqwest::header::USER_AGENT, user_agent)
                .header(
                    reqwest::header::ACCEPT_ENCODING,
                    "gzip, deflate, br",
                )
                .timeout(timeout);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if is_retryable_status(status) && attempt < attempts.max(1) {
                        warn!(%url, %status, attempt, "retryable status, backing off");
                        tokio::time::sleep(DEFAULT_RETRY_BACKOFF * attempt).await;
                        continue;
                    }
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                    });
                }
                Err(err) => {
                    if attempt < attempts.max(1) {
                        warn!(%url, attempt, error = %err, "network error, retrying");
                        tokio::time::sleep(DEFAULT_RETRY_BACKOFF * attempt).await;
                        continue;
                    }
                    return Err(FetchError::Network {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }

        unreachable!("request_with_retry loop always returns on its final iteration")
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

async fn collect_capped(response: reqwest::Response, cap: u64) -> Result<Bytes, FetchError> {
    use futures_util::StreamExt;

    let mut buffer = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| FetchError::Network {
            attempts: 1,
            source: err,
        })?;
        buffer.extend_from_slice(&chunk);
        if buffer.len() as u64 > cap {
            return Err(FetchError::ResponseTooLarge { cap_bytes: cap });
        }
    }
    Ok(Bytes::from(buffer))
}

fn capped_byte_stream(
    inner: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    cap: u64,
) -> impl Stream<Item = Result<Bytes, FetchError>> + Send {
    use futures_util::StreamExt;

    let mut seen: u64 = 0;
    inner.map(move |chunk| {
        let chunk = chunk.map_err(|err| FetchError::Network {
            attempts: 1,
            source: err,
        })?;
        seen += chunk.len() as u64;
        if seen > cap {
            return Err(FetchError::ResponseTooLarge { cap_bytes: cap });
        }
        Ok(chunk)
    })
}
