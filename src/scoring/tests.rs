//! Aggregation and rubric tests.

use proptest::prelude::*;
use strum::IntoEnumIterator;

use super::*;
use crate::checks::Level;

fn check(points: u32, max_points: u32) -> CheckResult {
    let mut result = CheckResult::new(max_points);
    result.award(points);
    result
}

fn checks(mx: u32, spf: u32, dkim: u32, dmarc: u32) -> Checks {
    Checks {
        mx: check(mx, V1_0.mx.max),
        spf: check(spf, V1_0.spf.max),
        dkim: check(dkim, V1_0.dkim.max),
        dmarc: check(dmarc, V1_0.dmarc.max),
    }
}

#[test]
fn test_v1_weights_sum_to_100() {
    assert_eq!(V1_0.max_score(), 100);
    assert_eq!(V1_0.mx.max, 10);
    assert_eq!(V1_0.spf.max, 25);
    assert_eq!(V1_0.dkim.max, 25);
    assert_eq!(V1_0.dmarc.max, 40);
}

#[test]
fn test_v1_components_fill_each_check() {
    let spf = V1_0.spf;
    assert_eq!(
        spf.present + spf.syntax + spf.lookup_budget + spf.hosts_resolve + spf.hard_fail + spf.hygiene,
        spf.max
    );
    let dkim = V1_0.dkim;
    assert_eq!(dkim.discovered + dkim.strong_key + dkim.rotation, dkim.max);
    let dmarc = V1_0.dmarc;
    assert_eq!(
        dmarc.present + dmarc.reject + dmarc.subdomain + dmarc.coverage + dmarc.rua,
        dmarc.max
    );
}

#[test]
fn test_lookup_known_and_unknown_versions() {
    assert_eq!(ScoreVersion::lookup("1.0"), Some(&V1_0));
    assert!(ScoreVersion::lookup("9.9").is_none());
    assert!(ScoreVersion::lookup("").is_none());
    assert_eq!(ScoreVersion::available().collect::<Vec<_>>(), vec!["1.0"]);
}

#[test]
fn test_grade_boundaries() {
    let cases = [
        (100, Grade::APlus),
        (95, Grade::APlus),
        (94, Grade::A),
        (90, Grade::A),
        (89, Grade::B),
        (80, Grade::B),
        (79, Grade::C),
        (70, Grade::C),
        (69, Grade::D),
        (60, Grade::D),
        (59, Grade::E),
        (50, Grade::E),
        (49, Grade::F),
        (0, Grade::F),
    ];
    for (score, expected) in cases {
        assert_eq!(V1_0.grade(score), expected, "score {score}");
    }
}

#[test]
fn test_grade_serializes_as_letter() {
    assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
    assert_eq!(serde_json::to_string(&Grade::C).unwrap(), "\"C\"");
    for grade in Grade::iter() {
        assert_eq!(
            serde_json::to_string(&grade).unwrap(),
            format!("\"{grade}\"")
        );
    }
}

#[test]
fn test_selector_candidates_put_provider_hints_first() {
    let m365 = V1_0.selectors.candidates(ProviderTag::Microsoft365);
    assert_eq!(&m365[..3], &["selector1", "selector2", "google"]);

    let google = V1_0.selectors.candidates(ProviderTag::GoogleWorkspace);
    assert_eq!(google[0], "google");
    assert_eq!(google.iter().filter(|s| **s == "google").count(), 1);

    let unknown = V1_0.selectors.candidates(ProviderTag::Unknown);
    assert_eq!(unknown.len(), V1_0.selectors.common.len());
}

#[test]
fn test_aggregate_sums_points() {
    let result = aggregate(
        "example.com",
        &V1_0,
        ProviderTag::Unknown,
        checks(10, 25, 25, 40),
    );
    assert_eq!(result.score, 100);
    assert_eq!(result.grade, Grade::APlus);
    assert_eq!(result.score_version, "1.0");
    assert!(result.remediation.is_empty());
}

#[test]
fn test_remediation_deduplicated_in_check_order() {
    let mut all = checks(0, 0, 0, 0);
    all.mx.error_fix("No MX records found", "Add MX records");
    all.spf.warn_fix("a", "Shared fix");
    all.dkim.warn_fix("b", "Shared fix");
    all.dkim.info("no hint here");
    all.dmarc.error_fix("No DMARC record found", "Publish DMARC");

    let result = aggregate("example.com", &V1_0, ProviderTag::Unknown, all);
    assert_eq!(
        result.remediation,
        vec!["Add MX records", "Shared fix", "Publish DMARC"]
    );
    assert!(result.checks.mx.has_message(Level::Error, "No MX"));
}

#[test]
fn test_report_field_order() {
    let result = aggregate(
        "example.com",
        &V1_0,
        ProviderTag::Microsoft365,
        checks(10, 20, 8, 30),
    );
    let json = serde_json::to_string(&result).unwrap();
    let order = [
        "\"domain\"",
        "\"score\"",
        "\"grade\"",
        "\"score_version\"",
        "\"provider\"",
        "\"checks\"",
        "\"remediation\"",
    ];
    let positions: Vec<usize> = order.iter().map(|k| json.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    assert!(json.contains("\"provider\":\"microsoft365\""));
    assert!(json.contains("\"score\":68"));
    assert!(json.contains("\"grade\":\"D\""));
}

proptest! {
    #[test]
    fn prop_score_is_bounded_sum(
        mx in 0u32..=10,
        spf in 0u32..=25,
        dkim in 0u32..=25,
        dmarc in 0u32..=40,
    ) {
        let result = aggregate("example.com", &V1_0, ProviderTag::Unknown, checks(mx, spf, dkim, dmarc));
        prop_assert_eq!(result.score, mx + spf + dkim + dmarc);
        prop_assert!(result.score <= 100);
        prop_assert_eq!(result.grade, V1_0.grade(result.score));
    }

    #[test]
    fn prop_grade_is_monotonic(a in 0u32..=100, b in 0u32..=100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        // Grade orders best first, so a higher score never maps to a later variant
        prop_assert!(V1_0.grade(high) <= V1_0.grade(low));
    }
}
