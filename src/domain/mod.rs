//! Domain normalization and validation.
//!
//! This module turns user input into a [`ScanRequest`]: the one immutable value every
//! checker reads. Input may be a bare domain, a `host:port`, or a full URL; the
//! host is extracted, lowercased and checked against hostname syntax before any
//! DNS query is made.
//!
//! Key functions:
//! - `ScanRequest::parse()` - Normalizes and validates a domain string
//! - `normalize_domain()` - Strips scheme, path, port and trailing dot
//! - `is_valid_hostname()` - Syntax check used for SPF domain arguments

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

use crate::error_handling::DomainError;

/// Maximum length of a DNS name in presentation format.
const MAX_DOMAIN_LENGTH: usize = 253;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label pattern is valid")
});

static TLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,63}$").expect("tld pattern is valid"));

/// A normalized, validated domain. Created once per scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanRequest {
    domain: String,
}

impl ScanRequest {
    /// Normalizes `input` and validates it as a hostname.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] describing the first rule the input breaks.
    ///
    /// # Examples
    ///
    /// ```
    /// use mail_posture::ScanRequest;
    ///
    /// let request = ScanRequest::parse("https://Mail.Example.COM:443/login").unwrap();
    /// assert_eq!(request.domain(), "mail.example.com");
    /// ```
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let domain = normalize_domain(input)?;
        validate_domain(&domain)?;
        Ok(Self { domain })
    }

    /// The normalized domain name.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for ScanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

/// Strips scheme, credentials, path, query, port and trailing dot, then lowercases.
///
/// Inputs with an explicit `scheme://` go through `url::Url` so userinfo and IPv6
/// brackets are handled; bare inputs are cut at the first `/`, `?` or `#`.
///
/// # Errors
///
/// Returns [`DomainError::Empty`] when nothing remains, or
/// [`DomainError::Unparsable`] when a URL has no host.
pub fn normalize_domain(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Empty);
    }

    let host = if trimmed.contains("://") {
        let parsed =
            url::Url::parse(trimmed).map_err(|_| DomainError::Unparsable(trimmed.to_string()))?;
        parsed
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or_else(|| DomainError::Unparsable(trimmed.to_string()))?
    } else {
        let end = trimmed.find(['/', '?', '#']).unwrap_or(trimmed.len());
        let authority = &trimmed[..end];
        strip_port(authority).to_string()
    };

    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return Err(DomainError::Empty);
    }
    Ok(host)
}

fn strip_port(authority: &str) -> &str {
    // A bare IPv6 literal has several colons; leave it whole so it is rejected as an IP.
    if authority.parse::<Ipv6Addr>().is_ok() {
        return authority;
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

fn validate_domain(domain: &str) -> Result<(), DomainError> {
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(DomainError::TooLong(domain.len()));
    }
    if domain.parse::<Ipv4Addr>().is_ok() || domain.parse::<Ipv6Addr>().is_ok() {
        return Err(DomainError::IpAddress(domain.to_string()));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(DomainError::SingleLabel(domain.to_string()));
    }
    for label in &labels {
        if !LABEL_RE.is_match(label) {
            return Err(DomainError::InvalidLabel {
                domain: domain.to_string(),
                label: (*label).to_string(),
            });
        }
    }
    match labels.last() {
        Some(tld) if TLD_RE.is_match(tld) => Ok(()),
        _ => Err(DomainError::InvalidTld(domain.to_string())),
    }
}

/// Returns true when `name` (already lowercased or not) is a syntactically valid hostname.
///
/// Underscore-prefixed labels such as `_spf` are accepted because SPF and DKIM
/// publish records under them.
pub fn is_valid_hostname(name: &str) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() || name.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    let labels: Vec<&str> = name.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|label| LABEL_RE.is_match(label.strip_prefix('_').unwrap_or(label)))
}

#[cfg(test)]
mod tests;
