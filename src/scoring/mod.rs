//! Score aggregation.
//!
//! This module provides:
//! - [`ScoreVersion`]: immutable, versioned rubrics selected by name
//! - [`Grade`]: letter grades derived from the composite score
//! - [`ScanResult`]: the report returned for every completed scan
//!
//! Aggregation is pure: the same four check results under the same version
//! always produce the same report.

mod grade;
mod rubric;

use serde::Serialize;

use crate::checks::CheckResult;
use crate::provider::ProviderTag;

pub use grade::Grade;
pub use rubric::{
    DkimRubric, DmarcRubric, MxRubric, ScoreVersion, SelectorTable, SpfRubric, V1_0,
};

/// Per-control results, serialized in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checks {
    pub mx: CheckResult,
    pub spf: CheckResult,
    pub dkim: CheckResult,
    pub dmarc: CheckResult,
}

impl Checks {
    /// The four results in report order.
    pub fn iter(&self) -> impl Iterator<Item = &CheckResult> {
        [&self.mx, &self.spf, &self.dkim, &self.dmarc].into_iter()
    }
}

/// The report for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Normalized domain that was assessed
    pub domain: String,
    /// Composite score, 0 to 100
    pub score: u32,
    pub grade: Grade,
    /// Name of the rubric that produced `score` and `grade`
    pub score_version: String,
    pub provider: ProviderTag,
    pub checks: Checks,
    /// Deduplicated fixes in first-seen order
    pub remediation: Vec<String>,
}

/// Combines four check results into the final report.
pub fn aggregate(
    domain: &str,
    version: &ScoreVersion,
    provider: ProviderTag,
    checks: Checks,
) -> ScanResult {
    let total: u32 = checks
        .iter()
        .map(|c| c.points.min(c.max_points))
        .sum();
    let score = total.min(version.max_score()).min(100);

    ScanResult {
        domain: domain.to_string(),
        score,
        grade: version.grade(score),
        score_version: version.name.to_string(),
        provider,
        remediation: collect_remediation(&checks),
        checks,
    }
}

fn collect_remediation(checks: &Checks) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for hint in checks.iter().flat_map(CheckResult::remediation) {
        if !out.iter().any(|seen| seen == hint) {
            out.push(hint.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests;
