//! Domain module tests.

use super::*;

#[test]
fn test_parse_plain_domain() {
    let request = ScanRequest::parse("example.com").unwrap();
    assert_eq!(request.domain(), "example.com");
    assert_eq!(request.to_string(), "example.com");
}

#[test]
fn test_parse_lowercases_and_trims() {
    let request = ScanRequest::parse("  ExAmple.COM.  ").unwrap();
    assert_eq!(request.domain(), "example.com");
}

#[test]
fn test_parse_strips_scheme_path_and_port() {
    for input in [
        "https://example.com/path?q=1",
        "http://user:pw@example.com:8080/",
        "example.com:25",
        "example.com/some/path",
        "example.com#frag",
    ] {
        let request = ScanRequest::parse(input).unwrap();
        assert_eq!(request.domain(), "example.com", "input: {input}");
    }
}

#[test]
fn test_parse_keeps_subdomains() {
    let request = ScanRequest::parse("mail.eu.example.co.uk").unwrap();
    assert_eq!(request.domain(), "mail.eu.example.co.uk");
}

#[test]
fn test_parse_rejects_empty() {
    assert_eq!(ScanRequest::parse(""), Err(DomainError::Empty));
    assert_eq!(ScanRequest::parse("   "), Err(DomainError::Empty));
    assert_eq!(ScanRequest::parse("."), Err(DomainError::Empty));
}

#[test]
fn test_parse_rejects_ip_addresses() {
    assert!(matches!(
        ScanRequest::parse("192.168.1.1"),
        Err(DomainError::IpAddress(_))
    ));
    assert!(matches!(
        ScanRequest::parse("::1"),
        Err(DomainError::IpAddress(_))
    ));
    assert!(matches!(
        ScanRequest::parse("http://[2001:db8::1]/"),
        Err(DomainError::IpAddress(_))
    ));
}

#[test]
fn test_parse_rejects_single_label() {
    assert!(matches!(
        ScanRequest::parse("localhost"),
        Err(DomainError::SingleLabel(_))
    ));
}

#[test]
fn test_parse_rejects_bad_labels() {
    for input in [
        "-bad.example.com",
        "bad-.example.com",
        "exa mple.com",
        "ex_ample.com",
        "example..com",
    ] {
        assert!(
            matches!(
                ScanRequest::parse(input),
                Err(DomainError::InvalidLabel { .. })
            ),
            "input should be rejected: {input}"
        );
    }
}

#[test]
fn test_parse_rejects_long_label() {
    let label = "a".repeat(64);
    let input = format!("{label}.com");
    assert!(matches!(
        ScanRequest::parse(&input),
        Err(DomainError::InvalidLabel { .. })
    ));
}

#[test]
fn test_parse_rejects_too_long() {
    let label = "a".repeat(60);
    let input = format!("{label}.{label}.{label}.{label}.{label}.com");
    assert!(matches!(
        ScanRequest::parse(&input),
        Err(DomainError::TooLong(_))
    ));
}

#[test]
fn test_parse_rejects_numeric_tld() {
    assert!(matches!(
        ScanRequest::parse("example.123"),
        Err(DomainError::InvalidTld(_))
    ));
    assert!(matches!(
        ScanRequest::parse("example.c"),
        Err(DomainError::InvalidTld(_))
    ));
}

#[test]
fn test_is_valid_hostname_accepts_underscore_labels() {
    assert!(is_valid_hostname("_spf.google.com"));
    assert!(is_valid_hostname("spf.protection.outlook.com."));
    assert!(!is_valid_hostname("%{i}._spf.example.com"));
    assert!(!is_valid_hostname("localhost"));
    assert!(!is_valid_hostname(""));
}

// Property-based tests using proptest
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_parse_idempotent(
        labels in prop::collection::vec("[a-z0-9]{1,12}", 1..4),
        tld in "(com|org|net|io)"
    ) {
        let input = format!("{}.{}", labels.join("."), tld);
        let first = ScanRequest::parse(&input).unwrap();
        let second = ScanRequest::parse(first.domain()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_parse_never_panics(input in "\\PC{0,80}") {
        let _ = ScanRequest::parse(&input);
    }

    #[test]
    fn test_url_forms_normalize_to_host(
        name in "[a-z]{3,12}",
        port in 1u16..65535,
        path in "[a-z/]{0,10}"
    ) {
        let url = format!("https://{name}.com:{port}/{path}");
        let request = ScanRequest::parse(&url).unwrap();
        prop_assert_eq!(request.domain(), format!("{name}.com"));
    }
}
