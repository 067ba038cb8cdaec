//! Parsed command lines driving a scan end to end.
//!
//! Flag defaults and value parsing are covered next to `Config` itself; these
//! tests check that what the CLI accepts is what the engine scans.

#[path = "helpers.rs"]
mod helpers;

use clap::Parser;
use mail_posture::{AssessError, Assessor, Config, DomainError, Grade};

use helpers::microsoft365_domain;

fn config(args: &[&str]) -> Config {
    Config::try_parse_from(std::iter::once("mail_posture").chain(args.iter().copied())).unwrap()
}

async fn scan(config: &Config) -> Result<mail_posture::ScanResult, AssessError> {
    Assessor::new(microsoft365_domain(), config.scan_options())
        .assess(&config.domain, Some(config.score_version.as_str()))
        .await
}

#[tokio::test]
async fn test_url_form_domain_scans_the_host() {
    for input in [
        "https://Example.COM/login?next=/",
        "http://user@example.com:8443",
        "example.com.",
        "EXAMPLE.com:25",
    ] {
        let report = scan(&config(&[input])).await.unwrap();
        assert_eq!(report.domain, "example.com", "{input}");
        assert_eq!(report.grade, Grade::APlus, "{input}");
    }
}

#[tokio::test]
async fn test_unusable_domain_is_accepted_by_parser_but_not_scanned() {
    let err = scan(&config(&["localhost"])).await.unwrap_err();
    assert!(matches!(
        err,
        AssessError::InvalidDomain(DomainError::SingleLabel(_))
    ));

    let err = scan(&config(&["not a domain"])).await.unwrap_err();
    assert!(matches!(err, AssessError::InvalidDomain(_)));
}

#[tokio::test]
async fn test_unknown_score_version_flag() {
    let err = scan(&config(&["example.com", "--score-version", "2.0"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AssessError::UnknownScoreVersion(ref v) if v == "2.0"));
}

#[test]
fn test_missing_domain_or_bad_format_is_rejected() {
    assert!(Config::try_parse_from(["mail_posture"]).is_err());
    assert!(Config::try_parse_from(["mail_posture", "example.com", "--log-format", "xml"]).is_err());
}
