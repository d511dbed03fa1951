//! Cache tier errors.

use thiserror::Error;

/// Errors raised by a cache tier. The tiered cache itself never propagates
/// these to callers of `get`/`set`: a failing tier is logged and skipped.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Serialising or deserialising a cached value failed.
    #[error("failed to (de)serialise cache value: {0}")]
    Serde(#[from] serde_json::Error),
    /// A filesystem operation on the disk tier failed.
    #[error("disk cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The remote tier reported a failure.
    #[error("remote cache error: {0}")]
    Remote(String),
}
