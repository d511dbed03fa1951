//! Execution-path selection for an app-ads.txt body (§4.5).

use appads_types::ProcessingMethod;

/// Whether a HEAD-reported content length is large enough to warrant
/// streaming directly from the HTTP client without buffering the body.
#[must_use]
pub fn should_stream(head_content_length: Option<u64>, stream_threshold_bytes: u64) -> bool {
    head_content_length.is_some_and(|len| len > stream_threshold_bytes)
}

/// Once a body has been fully buffered, choose between parsing it inline
/// (`sync`) or handing it to the worker pool (`worker`).
#[must_use]
pub fn select_buffered_path(body_len: u64, sync_threshold_bytes: u64) -> ProcessingMethod {
    if body_len <= sync_threshold_bytes {
        ProcessingMethod::Sync
    } else {
        ProcessingMethod::Worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_length_over_threshold_selects_streaming() {
        assert!(should_stream(Some(200_000), 150_000));
        assert!(!should_stream(Some(100_000), 150_000));
        assert!(!should_stream(None, 150_000));
    }

    #[test]
    fn body_exactly_at_sync_threshold_stays_sync() {
        let threshold = 100 * 1024;
        assert_eq!(select_buffered_path(threshold, threshold), ProcessingMethod::Sync);
        assert_eq!(select_buffered_path(threshold + 1, threshold), ProcessingMethod::Worker);
    }
}
