use std::net::Ipv4Addr;

use tokio::time::Instant;

use super::*;
use crate::checks::Level;
use crate::config::ScanOptions;
use crate::dns::{MockResolver, RecordType};
use crate::scoring::V1_0;

async fn run(mock: &MockResolver) -> CheckResult {
    let options = ScanOptions::default();
    let gateway = DnsGateway::new(mock.clone(), &options, Instant::now() + options.deadline);
    check(&gateway, "example.com", &V1_0.spf).await
}

fn with_spf(record: &str) -> MockResolver {
    let mock = MockResolver::new();
    mock.add_txt("example.com", "google-site-verification=abc123");
    mock.add_txt("example.com", record);
    mock
}

#[tokio::test(start_paused = true)]
async fn test_strict_record_earns_full_points() {
    let mock = with_spf("v=spf1 include:spf.protection.outlook.com -all");
    mock.add_txt("spf.protection.outlook.com", "v=spf1 ip4:40.92.0.0/15 -all");

    let result = run(&mock).await;
    assert_eq!(result.points, 25, "{:?}", result.messages);
    assert_eq!(result.remediation().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_spf_record() {
    let mock = MockResolver::new();
    mock.add_txt("example.com", "v=DMARC1; p=none");

    let result = run(&mock).await;
    assert_eq!(result.points, 0);
    assert!(result.has_message(Level::Error, "No SPF record found"));
}

#[tokio::test(start_paused = true)]
async fn test_nxdomain_is_missing_record() {
    let mock = MockResolver::new();
    mock.set_nxdomain("example.com");
    let result = run(&mock).await;
    assert_eq!(result.points, 0);
    assert!(result.has_message(Level::Error, "No SPF record found"));
}

#[tokio::test(start_paused = true)]
async fn test_multiple_records_score_zero() {
    let mock = with_spf("v=spf1 -all");
    mock.add_txt("example.com", "v=spf1 ~all");

    let result = run(&mock).await;
    assert_eq!(result.points, 0);
    assert!(result.has_message(Level::Error, "Multiple SPF records"));
}

#[tokio::test(start_paused = true)]
async fn test_plus_all_allows_any_sender() {
    let mock = with_spf("v=spf1 ip4:192.0.2.0/24 +all");

    let result = run(&mock).await;
    // present 5 + syntax 5 + budget 2 + hosts 3 + hygiene 4, no terminal credit
    assert_eq!(result.points, 19);
    assert!(result.has_message(Level::Warning, "allows any sender"));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_weights() {
    for (record, points) in [
        ("v=spf1 -all", 25),
        ("v=spf1 ~all", 22),
        ("v=spf1 ?all", 19),
        ("v=spf1 ip4:192.0.2.1", 19),
    ] {
        let result = run(&with_spf(record)).await;
        assert_eq!(result.points, points, "{record}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_syntax_errors_name_the_fragment() {
    let mock = with_spf("v=spf1 ip4:192.0.2.300 bogus -all");

    let result = run(&mock).await;
    assert_eq!(result.points, 20);
    assert!(result.has_message(Level::Error, "'ip4:192.0.2.300'"));
    assert!(result.has_message(Level::Error, "'bogus'"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_forfeit_syntax_credit() {
    let mock = with_spf("v=spf1 ip4:192.0.2.1 ip4:192.0.2.1 -all");
    let result = run(&mock).await;
    assert_eq!(result.points, 20);
    assert!(result.has_message(Level::Warning, "Duplicate SPF mechanisms"));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_budget_exceeded() {
    let mock = with_spf("v=spf1 include:l1.example -all");
    for i in 1..=12 {
        mock.add_txt(
            &format!("l{i}.example"),
            &format!("v=spf1 include:l{}.example -all", i + 1),
        );
    }

    let result = run(&mock).await;
    assert_eq!(result.points, 23);
    assert!(result.has_message(Level::Error, "10 DNS lookup limit"));
}

#[tokio::test(start_paused = true)]
async fn test_include_cycle_reported() {
    let mock = with_spf("v=spf1 include:a.example -all");
    mock.add_txt("a.example", "v=spf1 include:b.example -all");
    mock.add_txt("b.example", "v=spf1 include:a.example -all");

    let result = run(&mock).await;
    assert!(result.has_message(Level::Error, "SPF include loop"));
    assert_eq!(result.points, 20);
}

#[tokio::test(start_paused = true)]
async fn test_referenced_hosts_must_resolve() {
    let mock = with_spf("v=spf1 a:web.example.com mx:mail.example.net -all");
    mock.add_a("web.example.com", Ipv4Addr::new(192, 0, 2, 80));
    mock.set_nxdomain("mail.example.net");

    let result = run(&mock).await;
    assert_eq!(result.points, 22);
    assert!(result.has_message(Level::Warning, "mail.example.net"));
}

#[tokio::test(start_paused = true)]
async fn test_ptr_and_many_includes_lose_hygiene() {
    let mock = with_spf("v=spf1 ptr -all");
    let result = run(&mock).await;
    assert_eq!(result.points, 21);
    assert!(result.has_message(Level::Warning, "ptr"));

    let includes: Vec<String> = (1..=6).map(|i| format!("include:i{i}.example")).collect();
    let mock = with_spf(&format!("v=spf1 {} -all", includes.join(" ")));
    for i in 1..=6 {
        mock.add_txt(&format!("i{i}.example"), "v=spf1 -all");
    }
    let result = run(&mock).await;
    assert_eq!(result.points, 21);
    assert!(result.has_message(Level::Info, "6 includes"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_root_failure_degrades() {
    let mock = MockResolver::new();
    mock.fail("example.com", RecordType::Txt, DnsError::Timeout);
    let result = run(&mock).await;
    assert_eq!(result.points, 0);
    assert!(result.has_message(Level::Warning, "degraded"));
}

#[test]
fn test_include_targets_for_provider_detection() {
    let values = vec![
        "v=spf1 include:_spf.google.com include:mailgun.org ~all".to_string(),
        "other=1".to_string(),
    ];
    assert_eq!(
        include_targets(&values),
        vec!["_spf.google.com", "mailgun.org"]
    );

    let twice = vec!["v=spf1 include:a.com -all".to_string(), "v=spf1 -all".to_string()];
    assert!(include_targets(&twice).is_empty());
}
