//! Search terms: the user-supplied queries matched against app-ads.txt lines.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// A single relationship/publisher search constraint, or a plain substring.
///
/// Terms are normalised to lower case on validation so matching is always
/// case-insensitive downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchTerm {
    /// A bare substring to look for anywhere on a line.
    Plain(String),
    /// A structured constraint over specific app-ads.txt fields.
    Structured {
        /// Exchange domain sub-field (field 1).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        domain: Option<String>,
        /// Publisher id sub-field (field 2).
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "publisherId")]
        publisher_id: Option<String>,
        /// Relationship sub-field (field 3).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relationship: Option<String>,
        /// Tag id sub-field (field 4, optional in app-ads.txt itself).
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "tagId")]
        tag_id: Option<String>,
    },
}

impl SearchTerm {
    /// Validate and normalise a raw search term.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyStructuredTerm`] if a structured term
    /// has every sub-field empty or absent.
    pub fn normalise(self) -> ValidationResult<Self> {
        match self {
            Self::Plain(value) => Ok(Self::Plain(value.trim().to_ascii_lowercase())),
            Self::Structured {
                domain,
                publisher_id,
                relationship,
                tag_id,
            } => {
                let domain = normalise_field(domain);
                let publisher_id = normalise_field(publisher_id);
                let relationship = normalise_field(relationship);
                let tag_id = normalise_field(tag_id);
                if domain.is_none()
                    && publisher_id.is_none()
                    && relationship.is_none()
                    && tag_id.is_none()
                {
                    return Err(ValidationError::EmptyStructuredTerm);
                }
                Ok(Self::Structured {
                    domain,
                    publisher_id,
                    relationship,
                    tag_id,
                })
            }
        }
    }

    /// A stable string used to label this term in per-term search results.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Plain(value) => value.clone(),
            Self::Structured {
                domain,
                publisher_id,
                relationship,
                tag_id,
            } => {
                let parts = [
                    domain.as_deref(),
                    publisher_id.as_deref(),
                    relationship.as_deref(),
                    tag_id.as_deref(),
                ];
                parts
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    }
}

fn normalise_field(field: Option<String>) -> Option<String> {
    field.and_then(|value| {
        let trimmed = value.trim().to_ascii_lowercase();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_terms_lowercase_and_trim() {
        let term = SearchTerm::Plain("  Pub-1234  ".to_string())
            .normalise()
            .unwrap();
        assert_eq!(term, SearchTerm::Plain("pub-1234".to_string()));
    }

    #[test]
    fn structured_terms_require_one_field() {
        let term = SearchTerm::Structured {
            domain: None,
            publisher_id: None,
            relationship: None,
            tag_id: None,
        };
        assert_eq!(term.normalise().unwrap_err(), ValidationError::EmptyStructuredTerm);
    }

    #[test]
    fn structured_terms_normalise_present_fields() {
        let term = SearchTerm::Structured {
            domain: Some("Google.com".to_string()),
            publisher_id: None,
            relationship: Some(" DIRECT ".to_string()),
            tag_id: None,
        }
        .normalise()
        .unwrap();
        assert_eq!(
            term,
            SearchTerm::Structured {
                domain: Some("google.com".to_string()),
                publisher_id: None,
                relationship: Some("direct".to_string()),
                tag_id: None,
            }
        );
    }

    #[test]
    fn plain_term_deserialises_from_bare_string() {
        let term: SearchTerm = serde_json::from_str("\"google.com\"").unwrap();
        assert_eq!(term, SearchTerm::Plain("google.com".to_string()));
    }

    #[test]
    fn structured_term_deserialises_from_object() {
        let term: SearchTerm =
            serde_json::from_str(r#"{"domain":"google.com","publisherId":"pub-1"}"#).unwrap();
        assert_eq!(
            term,
            SearchTerm::Structured {
                domain: Some("google.com".to_string()),
                publisher_id: Some("pub-1".to_string()),
                relationship: None,
                tag_id: None,
            }
        );
    }
}
