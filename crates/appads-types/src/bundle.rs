//! Bundle identifier: the opaque per-store app identifier supplied by callers.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Maximum length, in characters, of a valid [`BundleId`].
pub const MAX_BUNDLE_ID_LEN: usize = 100;

const FORBIDDEN_CHARS: [char; 6] = ['<', '>', '"', '\'', '&', ';'];

/// Opaque, printable store identifier for an application.
///
/// Validated once on ingress and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    /// Validate and construct a [`BundleId`] from caller-supplied input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBundleId`] if the value is empty,
    /// exceeds [`MAX_BUNDLE_ID_LEN`] characters, or contains a forbidden
    /// character.
    pub fn parse(raw: impl Into<String>) -> ValidationResult<Self> {
        let value = raw.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidBundleId { reason: "empty" });
        }
        if trimmed.chars().count() > MAX_BUNDLE_ID_LEN {
            return Err(ValidationError::InvalidBundleId {
                reason: "exceeds maximum length",
            });
        }
        if trimmed.chars().any(|ch| FORBIDDEN_CHARS.contains(&ch)) {
            return Err(ValidationError::InvalidBundleId {
                reason: "contains a forbidden character",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BundleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl AsRef<str> for BundleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_accepts_plain_ids() {
        let id = BundleId::parse("  com.example.game  ").expect("valid id");
        assert_eq!(id.as_str(), "com.example.game");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(
            BundleId::parse("   ").unwrap_err(),
            ValidationError::InvalidBundleId { reason: "empty" }
        );
    }

    #[test]
    fn parse_rejects_forbidden_characters() {
        for ch in FORBIDDEN_CHARS {
            let raw = format!("com.example{ch}app");
            assert!(BundleId::parse(raw).is_err(), "char {ch} should be rejected");
        }
    }

    #[test]
    fn parse_rejects_overlong_ids() {
        let raw = "a".repeat(MAX_BUNDLE_ID_LEN + 1);
        assert!(BundleId::parse(raw).is_err());
    }

    #[test]
    fn parse_accepts_boundary_length() {
        let raw = "a".repeat(MAX_BUNDLE_ID_LEN);
        assert!(BundleId::parse(raw).is_ok());
    }
}
