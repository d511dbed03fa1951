//! Canonical registrable domain, derived from a developer URL discovered on a
//! store listing page.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// A canonical, lower-cased registrable domain (e.g. `example-pub.co.uk`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Construct a [`Domain`] from an already-canonicalised value, validating
    /// it against the shape in §3 of the specification.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDomain`] when the value does not
    /// match the registrable-domain pattern.
    pub fn parse(raw: impl Into<String>) -> ValidationResult<Self> {
        let value = raw.into().to_ascii_lowercase();
        if is_valid_domain(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidDomain { value })
        }
    }

    /// Borrow the canonical domain string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Domain {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

fn is_valid_domain(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = value.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    let bytes = label.as_bytes();
    let first_ok = bytes[0].is_ascii_alphanumeric();
    let last_ok = bytes[bytes.len() - 1].is_ascii_alphanumeric();
    let middle_ok = bytes
        .iter()
        .all(|byte| byte.is_ascii_alphanumeric() || *byte == b'-');
    first_ok && last_ok && middle_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_and_multi_label_domains() {
        assert!(Domain::parse("example.com").is_ok());
        assert!(Domain::parse("Example-Pub.co.uk").is_ok());
    }

    #[test]
    fn rejects_single_label_and_malformed_domains() {
        assert!(Domain::parse("localhost").is_err());
        assert!(Domain::parse("-example.com").is_err());
        assert!(Domain::parse("example-.com").is_err());
        assert!(Domain::parse("").is_err());
    }

    #[test]
    fn lowercases_on_construction() {
        let domain = Domain::parse("Example.COM").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }
}
