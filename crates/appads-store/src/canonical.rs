//! Public-suffix-aware canonicalisation of a discovered developer URL into a
//! registrable [`Domain`] (§4.6 step 4).

use addr::parse_domain_name;
use appads_types::Domain;

use crate::error::StoreError;

/// Parse `developer_url`'s host and reduce it to its registrable domain
/// (the public suffix plus one label), then validate it against
/// [`Domain::parse`]'s format rules.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDomain`] if the URL has no parseable host, the
/// host has no registrable domain under the public suffix list, or the
/// reduced value fails [`Domain`]'s own format validation.
pub fn canonicalise(developer_url: &str) -> Result<Domain, StoreError> {
    let parsed = url::Url::parse(developer_url)
        .map_err(|err| StoreError::InvalidDomain(err.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| StoreError::InvalidDomain("URL has no host".to_string()))?;

    let name = parse_domain_name(host)
        .map_err(|err| StoreError::InvalidDomain(err.to_string()))?;
    let root = name
        .root()
        .ok_or_else(|| StoreError::InvalidDomain(format!("{host} has no registrable domain")))?;

    Domain::parse(root).map_err(|err| StoreError::InvalidDomain(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_a_subdomain_to_its_registrable_root() {
        let domain = canonicalise("https://developer.example.co.uk/contact").unwrap();
        assert_eq!(domain.as_str(), "example.co.uk");
    }

    #[test]
    fn plain_domain_round_trips() {
        let domain = canonicalise("https://example.com").unwrap();
        assert_eq!(domain.as_str(), "example.com");
    }

    #[test]
    fn rejects_a_url_with_no_host() {
        assert!(canonicalise("not a url").is_err());
    }
}
