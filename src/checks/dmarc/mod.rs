//! DMARC checker.
//!
//! Reads the `_dmarc.<domain>` TXT record and scores policy strength, subdomain
//! policy, coverage, reporting and alignment.

mod parser;

use log::debug;

use crate::dns::{DnsError, DnsGateway, DnsResolver};
use crate::scoring::DmarcRubric;

use super::CheckResult;

pub use parser::{is_dmarc, Alignment, DmarcRecord, Policy, TagValue};

/// Scores the DMARC record for `domain`.
pub async fn check<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    rubric: &DmarcRubric,
) -> CheckResult {
    let mut result = CheckResult::new(rubric.max);
    let name = format!("_dmarc.{domain}");

    let values = match gateway.txt(&name).await {
        Ok(values) => values,
        Err(DnsError::NxDomain) => {
            missing(&mut result, domain);
            return result;
        }
        Err(e) => {
            result.warning(format!("DMARC lookup failed ({e}); DMARC result is degraded"));
            return result;
        }
    };

    let records: Vec<&String> = values.iter().filter(|v| is_dmarc(v)).collect();
    let raw = match records.as_slice() {
        [] => {
            missing(&mut result, domain);
            return result;
        }
        [raw] => raw.as_str(),
        _ => {
            result.error_fix(
                format!("Multiple DMARC records found at {name}; receivers ignore all of them"),
                format!("Publish exactly one DMARC record at {name}"),
            );
            return result;
        }
    };

    match DmarcRecord::parse(raw) {
        Ok(record) => score(&mut result, &record, rubric),
        Err(e) => {
            debug!("DMARC record for {domain} rejected: {e}");
            result.error_fix(
                format!("DMARC record is malformed: {e}"),
                format!("Publish a DMARC record at {name}: v=DMARC1; p=reject; rua=mailto:dmarc@{domain}"),
            );
        }
    }
    result
}

fn missing(result: &mut CheckResult, domain: &str) {
    result.error_fix(
        "No DMARC record found",
        format!("Publish a DMARC record at _dmarc.{domain}: v=DMARC1; p=reject; rua=mailto:dmarc@{domain}"),
    );
}

fn score(result: &mut CheckResult, record: &DmarcRecord, rubric: &DmarcRubric) {
    result.award(rubric.present);
    result.success(format!("DMARC record found (p={})", record.policy));

    for error in &record.errors {
        result.error_fix(
            format!("DMARC syntax error: {error}"),
            format!("Fix the DMARC tag {}", error.fragment),
        );
    }

    match record.policy {
        Policy::Reject => {
            result.award(rubric.reject);
            result.success("DMARC policy is reject");
        }
        Policy::Quarantine => {
            result.award(rubric.quarantine);
            result.warn_fix(
                "DMARC policy is quarantine; reject gives full protection",
                "Move the DMARC policy to p=reject once reports show legitimate mail passes",
            );
        }
        Policy::None => {
            result.award(rubric.none);
            result.warn_fix(
                "DMARC policy is none (monitoring only); spoofed mail is still delivered",
                "Move the DMARC policy to p=quarantine, then p=reject",
            );
        }
    }

    match record.subdomain_policy {
        TagValue::Absent => result.award(rubric.subdomain),
        TagValue::Valid(sp) if sp >= record.policy => result.award(rubric.subdomain),
        TagValue::Valid(sp) => result.warn_fix(
            format!("Subdomain policy sp={sp} is weaker than p={}", record.policy),
            "Remove sp= or set it at least as strict as p=",
        ),
        TagValue::Invalid => {}
    }

    score_coverage(result, record, rubric);
    score_reporting(result, record, rubric);

    for (tag, value) in [("adkim", record.adkim), ("aspf", record.aspf)] {
        if value.valid() == Some(Alignment::Strict) {
            result.award(rubric.strict_alignment);
            result.success(format!("Strict {tag} alignment"));
        }
    }

    if record
        .fo
        .as_deref()
        .is_some_and(|fo| fo.split(':').any(|opt| matches!(opt.trim(), "1" | "d" | "s")))
    {
        result.success("Failure reporting options request reports on any authentication failure");
    }
}

fn score_coverage(result: &mut CheckResult, record: &DmarcRecord, rubric: &DmarcRubric) {
    match record.pct {
        TagValue::Absent | TagValue::Valid(100) => result.award(rubric.coverage),
        TagValue::Valid(0) => result.warning("DMARC pct=0: the policy is not applied to any mail"),
        TagValue::Valid(pct) => {
            // Any pct below 100 forfeits at least one point
            result.award(rubric.coverage * u32::from(pct) / 100);
            result.warn_fix(
                format!("DMARC policy applies to only {pct}% of mail"),
                "Raise DMARC pct to 100 or remove the pct tag",
            );
        }
        TagValue::Invalid => {}
    }
}

fn score_reporting(result: &mut CheckResult, record: &DmarcRecord, rubric: &DmarcRubric) {
    if !record.rua.is_empty() {
        result.award(rubric.rua);
        result.success(format!("Aggregate reports sent to {}", record.rua.join(", ")));
    } else if !record.ruf.is_empty() {
        result.award(rubric.ruf_only);
        result.info("Only forensic (ruf) reporting is configured; add rua= for aggregate reports");
    } else {
        result.info("No DMARC aggregate reporting; add rua=mailto:... to receive reports");
    }

    if !record.ignored_uris.is_empty() {
        result.warn_fix(
            format!(
                "Ignored non-mailto report URI(s): {}",
                record.ignored_uris.join(", ")
            ),
            "Use mailto: URIs for DMARC rua/ruf reporting",
        );
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::checks::Level;
    use crate::config::ScanOptions;
    use crate::dns::{MockResolver, RecordType};
    use crate::scoring::V1_0;

    async fn run(record: Option<&str>) -> CheckResult {
        let mock = MockResolver::new();
        if let Some(record) = record {
            mock.add_txt("_dmarc.example.com", record);
        }
        run_mock(&mock).await
    }

    async fn run_mock(mock: &MockResolver) -> CheckResult {
        let options = ScanOptions::default();
        let gateway = DnsGateway::new(mock.clone(), &options, Instant::now() + options.deadline);
        check(&gateway, "example.com", &V1_0.dmarc).await
    }

    #[tokio::test]
    async fn test_full_marks() {
        let result = run(Some("v=DMARC1; p=reject; pct=100; rua=mailto:x@y.com")).await;
        assert_eq!(result.points, 40, "{:?}", result.messages);
        assert_eq!(result.remediation().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let result = run(None).await;
        assert_eq!(result.points, 0);
        assert!(result.has_message(Level::Error, "No DMARC record found"));
        let hints: Vec<_> = result.remediation().collect();
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("_dmarc.example.com"));
    }

    #[tokio::test]
    async fn test_nxdomain_is_missing() {
        let mock = MockResolver::new();
        mock.set_nxdomain("_dmarc.example.com");
        let result = run_mock(&mock).await;
        assert_eq!(result.points, 0);
        assert!(result.has_message(Level::Error, "No DMARC record found"));
    }

    #[tokio::test]
    async fn test_unrelated_txt_is_ignored() {
        let result = run(Some("google-site-verification=abc")).await;
        assert!(result.has_message(Level::Error, "No DMARC record found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_degrades() {
        let mock = MockResolver::new();
        mock.fail("_dmarc.example.com", RecordType::Txt, DnsError::ServFail);
        let result = run_mock(&mock).await;
        assert_eq!(result.points, 0);
        assert!(result.has_message(Level::Warning, "degraded"));
    }

    #[tokio::test]
    async fn test_multiple_records() {
        let mock = MockResolver::new();
        mock.add_txt("_dmarc.example.com", "v=DMARC1; p=reject");
        mock.add_txt("_dmarc.example.com", "v=DMARC1; p=none");
        let result = run_mock(&mock).await;
        assert_eq!(result.points, 0);
        assert!(result.has_message(Level::Error, "Multiple DMARC records"));
    }

    #[tokio::test]
    async fn test_malformed_policy() {
        let result = run(Some("v=DMARC1; p=block; rua=mailto:x@y.com")).await;
        assert_eq!(result.points, 0);
        assert!(result.has_message(Level::Error, "p=block"));
    }

    #[tokio::test]
    async fn test_policy_strength() {
        // present + policy + subdomain + coverage, no reporting
        for (policy, points) in [("reject", 36), ("quarantine", 28), ("none", 18)] {
            let result = run(Some(&format!("v=DMARC1; p={policy}"))).await;
            assert_eq!(result.points, points, "p={policy}");
            assert!(result.has_message(Level::Info, "No DMARC aggregate reporting"));
        }
        let none = run(Some("v=DMARC1; p=none")).await;
        assert!(none.has_message(Level::Warning, "monitoring only"));
    }

    #[tokio::test]
    async fn test_weaker_subdomain_policy() {
        let result = run(Some("v=DMARC1; p=reject; sp=none; rua=mailto:x@y.com")).await;
        assert_eq!(result.points, 38);
        assert!(result.has_message(Level::Warning, "sp=none is weaker than p=reject"));

        let stronger = run(Some("v=DMARC1; p=quarantine; sp=reject; rua=mailto:x@y.com")).await;
        assert_eq!(stronger.points, 10 + 12 + 2 + 4 + 4);
    }

    #[tokio::test]
    async fn test_partial_coverage_is_proportional() {
        let result = run(Some("v=DMARC1; p=reject; pct=50; rua=mailto:x@y.com")).await;
        assert_eq!(result.points, 38);
        assert!(result.has_message(Level::Warning, "only 50%"));

        for pct in [90, 99] {
            let record = format!("v=DMARC1; p=reject; pct={pct}; rua=mailto:x@y.com");
            let result = run(Some(&record)).await;
            assert_eq!(result.points, 39, "pct={pct}");
        }

        let zero = run(Some("v=DMARC1; p=reject; pct=0; rua=mailto:x@y.com")).await;
        assert_eq!(zero.points, 36);
        assert!(zero.has_message(Level::Warning, "not applied"));
    }

    #[tokio::test]
    async fn test_invalid_optional_tags_forfeit_their_credit() {
        let result = run(Some("v=DMARC1; p=reject; pct=abc; sp=maybe; rua=mailto:x@y.com")).await;
        assert_eq!(result.points, 10 + 20 + 4);
        assert!(result.has_message(Level::Error, "'pct=abc'"));
        assert!(result.has_message(Level::Error, "'sp=maybe'"));
    }

    #[tokio::test]
    async fn test_reporting_credit() {
        let ruf_only = run(Some("v=DMARC1; p=reject; ruf=mailto:f@y.com")).await;
        assert_eq!(ruf_only.points, 38);
        assert!(ruf_only.has_message(Level::Info, "Only forensic"));

        let https = run(Some("v=DMARC1; p=reject; rua=https://r.example.com")).await;
        assert_eq!(https.points, 36);
        assert!(https.has_message(Level::Warning, "non-mailto"));
    }

    #[tokio::test]
    async fn test_strict_alignment_is_capped() {
        let result = run(Some(
            "v=DMARC1; p=quarantine; adkim=s; aspf=s; rua=mailto:x@y.com; fo=1",
        ))
        .await;
        assert_eq!(result.points, 10 + 12 + 2 + 4 + 4 + 2);
        assert!(result.has_message(Level::Success, "Strict adkim"));
        assert!(result.has_message(Level::Success, "Failure reporting"));

        let full = run(Some("v=DMARC1; p=reject; adkim=s; aspf=s; rua=mailto:x@y.com")).await;
        assert_eq!(full.points, 40);
    }
}
