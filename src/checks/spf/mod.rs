//! SPF checker.
//!
//! Locates the domain's single SPF record, walks its include/redirect chain under
//! the RFC 7208 lookup budget, and scores syntax, budget, referenced hosts, the
//! terminal qualifier and record hygiene.

mod parser;
mod walk;

use log::debug;

use crate::config::SPF_LOOKUP_LIMIT;
use crate::dns::{DnsError, DnsGateway, DnsResolver};
use crate::scoring::SpfRubric;

use super::CheckResult;

pub use parser::{is_spf, Directive, Mechanism, Qualifier, SpfRecord};
pub use walk::{walk, SpfWalkState, WalkFinding, WalkOutcome};

/// Top-level `include` targets of the domain's SPF record, for provider detection.
///
/// Returns nothing unless exactly one SPF record is published.
pub fn include_targets(txt_values: &[String]) -> Vec<String> {
    let mut records = txt_values.iter().filter(|v| is_spf(v));
    match (records.next(), records.next()) {
        (Some(raw), None) => SpfRecord::parse(raw)
            .includes()
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Scores the SPF record published at `domain`.
pub async fn check<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    rubric: &SpfRubric,
) -> CheckResult {
    let mut result = CheckResult::new(rubric.max);

    let values = match gateway.txt(domain).await {
        Ok(values) => values,
        Err(DnsError::NxDomain) => {
            missing(&mut result);
            return result;
        }
        Err(e) => {
            result.warning(format!("SPF lookup failed ({e}); SPF result is degraded"));
            return result;
        }
    };

    let records: Vec<&String> = values.iter().filter(|v| is_spf(v)).collect();
    let raw = match records.as_slice() {
        [] => {
            missing(&mut result);
            return result;
        }
        [raw] => *raw,
        many => {
            result.error_fix(
                format!(
                    "Multiple SPF records found ({}); receivers treat this as a permanent error",
                    many.len()
                ),
                "Merge the SPF records into a single v=spf1 record",
            );
            return result;
        }
    };

    debug!("SPF {domain}: {raw}");
    result.award(rubric.present);
    result.success("SPF record found");

    let record = SpfRecord::parse(raw);
    let state = SpfWalkState::new(SPF_LOOKUP_LIMIT);
    let outcome = walk(gateway, &state, domain, &record).await;
    debug!(
        "SPF walk for {domain}: {} lookup(s) across {:?}",
        state.lookups_used(),
        state.visited()
    );

    score_syntax(&mut result, rubric, &record, &outcome);
    score_budget(&mut result, rubric, &state, &outcome);
    score_hosts(&mut result, rubric, gateway, &record).await;
    score_terminal(&mut result, rubric, &outcome);
    score_hygiene(&mut result, rubric, &record);

    result
}

fn missing(result: &mut CheckResult) {
    result.error_fix(
        "No SPF record found",
        "Publish an SPF record: v=spf1 include:<your-mail-provider> -all",
    );
}

fn score_syntax(
    result: &mut CheckResult,
    rubric: &SpfRubric,
    record: &SpfRecord,
    outcome: &WalkOutcome,
) {
    let mut clean = record.errors.is_empty();

    for error in &record.errors {
        result.error_fix(format!("SPF syntax error: {error}"), "Fix the SPF syntax errors");
    }
    if !record.duplicates.is_empty() {
        clean = false;
        result.warn_fix(
            format!("Duplicate SPF mechanisms: {}", record.duplicates.join(", ")),
            "Remove duplicate mechanisms from the SPF record",
        );
    }

    for finding in &outcome.findings {
        match finding {
            WalkFinding::SyntaxError { domain, error } => {
                clean = false;
                result.error_fix(
                    format!("SPF syntax error in {domain}: {error}"),
                    format!("Fix the SPF record published at {domain}"),
                );
            }
            WalkFinding::Cycle { from, target } => {
                clean = false;
                result.error_fix(
                    format!("SPF include loop: {from} includes {target}, which is already being evaluated"),
                    "Remove the circular SPF include",
                );
            }
            WalkFinding::MissingRecord { target } => {
                clean = false;
                result.error_fix(
                    format!("SPF include target {target} has no SPF record"),
                    format!("Remove include:{target} or publish an SPF record there"),
                );
            }
            WalkFinding::MultipleRecords { target } => {
                clean = false;
                result.error_fix(
                    format!("SPF include target {target} publishes multiple SPF records"),
                    format!("Publish a single SPF record at {target}"),
                );
            }
            WalkFinding::LookupFailed { target, error } => {
                result.warning(format!("Could not fetch SPF include {target}: {error}"));
            }
            WalkFinding::MacroTarget { target } => {
                result.info(format!(
                    "SPF include {target} uses macros and was not expanded"
                ));
            }
            WalkFinding::BudgetExceeded => {}
        }
    }

    if clean {
        result.award(rubric.syntax);
        result.success("SPF syntax is valid");
    }
}

fn score_budget(
    result: &mut CheckResult,
    rubric: &SpfRubric,
    state: &SpfWalkState,
    outcome: &WalkOutcome,
) {
    if outcome.budget_exceeded() {
        result.error_fix(
            format!(
                "SPF evaluation exceeds the {} DNS lookup limit (permerror)",
                state.limit()
            ),
            "Reduce SPF DNS lookups by flattening includes or using ip4/ip6",
        );
    } else {
        result.award(rubric.lookup_budget);
        result.success(format!(
            "SPF DNS lookups: {}/{}",
            state.lookups_used(),
            state.limit()
        ));
    }
}

/// Explicit `a:<host>` targets must resolve and `mx:<host>` targets must publish MX.
async fn score_hosts<R: DnsResolver>(
    result: &mut CheckResult,
    rubric: &SpfRubric,
    gateway: &DnsGateway<R>,
    record: &SpfRecord,
) {
    let mut dangling = Vec::new();
    let mut unverified = Vec::new();

    for directive in &record.directives {
        let (host, outcome) = match &directive.mechanism {
            Mechanism::A(Some(host)) | Mechanism::Mx(Some(host)) if host.contains('%') => continue,
            Mechanism::A(Some(host)) => (host, gateway.host_resolves(host).await),
            Mechanism::Mx(Some(host)) => (
                host,
                match gateway.mx(host).await {
                    Ok(hosts) => Ok(!hosts.is_empty()),
                    Err(DnsError::NxDomain) => Ok(false),
                    Err(e) => Err(e),
                },
            ),
            _ => continue,
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => dangling.push(host.as_str()),
            Err(_) => unverified.push(host.as_str()),
        }
    }

    if !dangling.is_empty() {
        let list = dangling.join(", ");
        result.warn_fix(
            format!("SPF references hosts that do not resolve: {list}"),
            format!("Fix or remove SPF references to {list}"),
        );
    }
    if !unverified.is_empty() {
        result.warning(format!(
            "Could not verify SPF hosts: {}",
            unverified.join(", ")
        ));
    }
    if dangling.is_empty() && unverified.is_empty() {
        result.award(rubric.hosts_resolve);
        result.success("All hosts referenced by SPF resolve");
    }
}

fn score_terminal(result: &mut CheckResult, rubric: &SpfRubric, outcome: &WalkOutcome) {
    let via = if outcome.redirected { " (via redirect)" } else { "" };
    match outcome.terminal {
        Some(Qualifier::Fail) => {
            result.award(rubric.hard_fail);
            result.success(format!("SPF ends with -all{via} (hard fail)"));
        }
        Some(Qualifier::SoftFail) => {
            result.award(rubric.soft_fail);
            result.warn_fix(
                format!("SPF ends with ~all{via} (soft fail)"),
                "Change ~all to -all for stricter enforcement",
            );
        }
        Some(Qualifier::Neutral) => {
            result.warn_fix(
                format!("SPF ends with ?all{via} (neutral), which provides no protection"),
                "Change ?all to -all",
            );
        }
        Some(Qualifier::Pass) => {
            result.warn_fix(
                format!("SPF ends with +all{via}, which allows any sender to use this domain"),
                "Replace +all with -all to reject unauthorized senders",
            );
        }
        None => {
            result.warn_fix(
                "SPF record has no terminal all mechanism",
                "End the SPF record with -all",
            );
        }
    }
}

fn score_hygiene(result: &mut CheckResult, rubric: &SpfRubric, record: &SpfRecord) {
    let includes = record.includes().count();
    let ptr = record.has_ptr();

    if ptr {
        result.warn_fix(
            "SPF uses the deprecated ptr mechanism",
            "Remove the ptr mechanism from the SPF record",
        );
    }
    if includes > rubric.max_includes {
        result.info(format!(
            "SPF has {includes} includes; consider flattening"
        ));
    }
    if !ptr && includes <= rubric.max_includes {
        result.award(rubric.hygiene);
        result.success("No ptr mechanism and a modest number of includes");
    }
}

#[cfg(test)]
mod tests;
