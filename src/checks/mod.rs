//! The four control checkers and the result shape they share.
//!
//! Each checker reads DNS through the scan's [`crate::dns::DnsGateway`], scores
//! against its slice of the active [`crate::scoring::ScoreVersion`], and returns a
//! [`CheckResult`]. DNS failures never escape a checker; they become messages.

pub mod dkim;
pub mod dmarc;
pub mod mx;
pub mod spf;

use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// Severity of a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// The control is configured as expected
    Success,
    /// Weaker than it should be, or could not be fully verified
    Warning,
    /// Missing or broken
    Error,
    /// Context only; no effect on points
    Info,
}

/// One line of a check's findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Severity
    pub level: Level,
    /// Human-readable finding
    pub text: String,
    /// Suggested fix, surfaced through the report's remediation list
    #[serde(skip)]
    pub remediation: Option<String>,
}

/// Outcome of one checker: points earned out of its rubric maximum plus findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Points earned, never above `max_points`
    pub points: u32,
    /// Weight of this check in the active score version
    pub max_points: u32,
    /// Findings in the order they were produced
    pub messages: Vec<Message>,
}

impl CheckResult {
    /// An empty result worth `max_points`.
    pub fn new(max_points: u32) -> Self {
        Self {
            points: 0,
            max_points,
            messages: Vec::new(),
        }
    }

    /// A zero-point result for a check that could not run to completion.
    pub fn degraded(max_points: u32, reason: impl Into<String>) -> Self {
        let mut result = Self::new(max_points);
        result.warning(reason);
        result
    }

    /// Adds points without ever exceeding `max_points`.
    pub fn award(&mut self, points: u32) {
        self.points = self.points.saturating_add(points).min(self.max_points);
    }

    fn push(&mut self, level: Level, text: String, remediation: Option<String>) {
        self.messages.push(Message {
            level,
            text,
            remediation,
        });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Level::Success, text.into(), None);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Level::Info, text.into(), None);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(Level::Warning, text.into(), None);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Level::Error, text.into(), None);
    }

    /// A warning that carries a remediation hint.
    pub fn warn_fix(&mut self, text: impl Into<String>, fix: impl Into<String>) {
        self.push(Level::Warning, text.into(), Some(fix.into()));
    }

    /// An error that carries a remediation hint.
    pub fn error_fix(&mut self, text: impl Into<String>, fix: impl Into<String>) {
        self.push(Level::Error, text.into(), Some(fix.into()));
    }

    /// Remediation hints attached to warnings and errors, in message order.
    pub fn remediation(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| matches!(m.level, Level::Warning | Level::Error))
            .filter_map(|m| m.remediation.as_deref())
    }

    /// Whether any message at `level` contains `needle`.
    pub fn has_message(&self, level: Level, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == level && m.text.contains(needle))
    }
}

/// Splits a `tag=value; ...` list as used by DKIM and DMARC records.
///
/// Tag names are lowercased; whitespace around names and values is dropped, and
/// parts without `=` are skipped.
pub(crate) fn parse_tag_list(record: &str) -> Vec<(String, String)> {
    record
        .split(';')
        .filter_map(|part| {
            let (tag, value) = part.split_once('=')?;
            let tag = tag.trim();
            (!tag.is_empty()).then(|| (tag.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}
