//! Validation errors for the shared data model.

use thiserror::Error;

/// Errors raised while constructing or normalising domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A bundle identifier failed the shape checks in the data model.
    #[error("bundle id is invalid: {reason}")]
    InvalidBundleId {
        /// Human-readable reason the identifier was rejected.
        reason: &'static str,
    },
    /// A registrable domain failed the canonical-domain regex.
    #[error("domain '{value}' is not a valid registrable domain")]
    InvalidDomain {
        /// The rejected value, for diagnostics.
        value: String,
    },
    /// A structured search term had no non-empty sub-field.
    #[error("structured search term must set at least one field")]
    EmptyStructuredTerm,
    /// A bundle id could not be mapped to a supported store.
    #[error("store kind is not recognised for bundle id '{bundle_id}'")]
    UnknownStore {
        /// The bundle identifier that failed store detection.
        bundle_id: String,
    },
}

/// Convenience alias for fallible data-model constructors.
pub type ValidationResult<T> = Result<T, ValidationError>;
