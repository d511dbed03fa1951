//! Request-boundary normalisation (C10, §7): decode the flexible
//! `bundleIds`/`searchTerms` shapes, apply the size caps from
//! `appads-config::Settings`, and classify failures per the error taxonomy.
//! Nothing here enters the resolution pipeline; a validation failure
//! returns immediately.

use appads_types::SearchTerm;
use serde_json::json;

use crate::dto::{decode_bundle_ids, decode_search_terms};
use crate::errors::ApiError;

/// A validated batch request: raw ids (not yet deduplicated or parsed into
/// `BundleId`, which `appads-batch::resolve_many` does) and normalised
/// search terms.
pub struct ValidatedBatch {
    /// Caller-supplied bundle ids, still in their original order.
    pub bundle_ids: Vec<String>,
    /// Normalised, deduplicated-by-construction search terms.
    pub search_terms: Vec<SearchTerm>,
}

/// Decode and size-check a batch request body.
///
/// # Errors
///
/// Returns [`ApiError::bad_request`] if `bundle_ids` is missing, empty, or
/// malformed, or [`ApiError::validation_rejected`] if it exceeds `max_ids`.
pub fn validate_batch(
    bundle_ids_raw: &serde_json::Value,
    search_terms_raw: Option<&serde_json::Value>,
    structured_params_raw: Option<&serde_json::Value>,
    max_ids: usize,
) -> Result<ValidatedBatch, ApiError> {
    let bundle_ids = decode_bundle_ids(bundle_ids_raw)?;
    if bundle_ids.is_empty() {
        return Err(ApiError::bad_request("bundleIds must not be empty"));
    }
    if bundle_ids.len() > max_ids {
        return Err(ApiError::validation_rejected(
            format!("bundleIds exceeds the maximum of {max_ids}"),
            json!({"provided": bundle_ids.len(), "max": max_ids}),
        ));
    }

    let mut search_terms = decode_search_terms(search_terms_raw)?;
    search_terms.extend(decode_search_terms(structured_params_raw)?);

    Ok(ValidatedBatch { bundle_ids, search_terms })
}

/// Validate a requested page size against `[min, max]`, clamping rather
/// than rejecting: an out-of-range page size is a caller convenience issue,
/// not a malformed request.
#[must_use]
pub fn clamp_page_size(requested: Option<usize>, min: usize, max: usize) -> usize {
    requested.map_or(max, |value| value.clamp(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_batches_over_the_cap() {
        let ids = json!(["a", "b", "c"]);
        let err = validate_batch(&ids, None, None, 2);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_a_bare_string_id() {
        let ids = json!("com.example.app");
        let result = validate_batch(&ids, None, None, 10).unwrap();
        assert_eq!(result.bundle_ids, vec!["com.example.app".to_string()]);
    }

    #[test]
    fn merges_search_terms_and_structured_params() {
        let ids = json!(["a"]);
        let terms = json!("google.com");
        let structured = json!({"publisherId": "pub-1"});
        let result = validate_batch(&ids, Some(&terms), Some(&structured), 10).unwrap();
        assert_eq!(result.search_terms.len(), 2);
    }

    #[test]
    fn clamps_page_size_into_range() {
        assert_eq!(clamp_page_size(Some(1), 5, 50), 5);
        assert_eq!(clamp_page_size(Some(1000), 5, 50), 50);
        assert_eq!(clamp_page_size(None, 5, 50), 50);
    }
}
