//! Recursive SPF include/redirect walker.
//!
//! The walk charges every DNS-querying term against one shared lookup budget,
//! expands sibling `include`s concurrently, and reports what it found as a flat,
//! ordered list of [`WalkFinding`]s.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::{join_all, BoxFuture, FutureExt};
use log::debug;

use crate::dns::{DnsError, DnsGateway, DnsResolver};
use crate::error_handling::RecordSyntaxError;

use super::parser::{is_spf, Qualifier, SpfRecord};

/// Scan-scoped state shared by every branch of one SPF walk.
#[derive(Debug)]
pub struct SpfWalkState {
    limit: usize,
    used: AtomicUsize,
    visited: Mutex<HashSet<String>>,
}

impl SpfWalkState {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Takes one lookup from the budget. Returns `false` once it is spent; the
    /// counter never exceeds the limit however many branches race for it.
    pub fn try_charge(&self) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn lookups_used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn mark_visited(&self, domain: &str) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain.to_string());
    }

    /// Every domain whose SPF record was fetched, sorted.
    pub fn visited(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        domains.sort();
        domains
    }
}

/// Something the walk noticed below the root record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkFinding {
    /// A term in a referenced record failed to parse
    SyntaxError {
        domain: String,
        error: RecordSyntaxError,
    },
    /// A DNS-querying term was reached after the budget ran out
    BudgetExceeded,
    /// `target` is already on the include path that leads to `from`
    Cycle { from: String, target: String },
    /// The target exists but publishes no SPF record, or does not exist
    MissingRecord { target: String },
    MultipleRecords { target: String },
    /// The target's TXT lookup failed transiently or returned garbage
    LookupFailed { target: String, error: DnsError },
    /// The target uses SPF macros and cannot be expanded without a sender
    MacroTarget { target: String },
}

/// Result of walking one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub findings: Vec<WalkFinding>,
    /// The record's `all` qualifier, or the redirect target's when the record has none
    pub terminal: Option<Qualifier>,
    /// Whether a `redirect=` was followed
    pub redirected: bool,
}

impl WalkOutcome {
    pub fn budget_exceeded(&self) -> bool {
        self.findings.contains(&WalkFinding::BudgetExceeded)
    }
}

/// Walks `record`, published at `domain`, charging its lookups to `state`.
pub async fn walk<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    state: &SpfWalkState,
    domain: &str,
    record: &SpfRecord,
) -> WalkOutcome {
    state.mark_visited(domain);
    walk_record(gateway, state, record, vec![domain.to_string()]).await
}

/// `path` holds the domains from the root down to the one that published `record`.
fn walk_record<'a, R: DnsResolver>(
    gateway: &'a DnsGateway<R>,
    state: &'a SpfWalkState,
    record: &'a SpfRecord,
    path: Vec<String>,
) -> BoxFuture<'a, WalkOutcome> {
    async move {
        let mut outcome = WalkOutcome {
            terminal: record.all(),
            ..Default::default()
        };
        let current = path.last().cloned().unwrap_or_default();

        let mut branches = Vec::new();
        for directive in &record.directives {
            if !directive.mechanism.costs_lookup() {
                continue;
            }
            if !state.try_charge() {
                outcome.findings.push(WalkFinding::BudgetExceeded);
                return outcome;
            }
            if let super::parser::Mechanism::Include(target) = &directive.mechanism {
                if let Some(finding) = screen_target(&path, &current, target) {
                    outcome.findings.push(finding);
                } else {
                    branches.push(target.clone());
                }
            }
        }

        let expanded = join_all(branches.into_iter().map(|target| {
            let mut child_path = path.clone();
            child_path.push(target.clone());
            expand(gateway, state, target, child_path)
        }))
        .await;
        for child in expanded {
            outcome.findings.extend(child.findings);
        }

        // redirect= only applies when the record has no `all`
        if let (None, Some(target)) = (record.all(), record.redirect.as_ref()) {
            if !state.try_charge() {
                outcome.findings.push(WalkFinding::BudgetExceeded);
                return outcome;
            }
            if let Some(finding) = screen_target(&path, &current, target) {
                outcome.findings.push(finding);
            } else {
                let mut child_path = path.clone();
                child_path.push(target.clone());
                let child = expand(gateway, state, target.clone(), child_path).await;
                outcome.redirected = true;
                outcome.terminal = child.terminal;
                outcome.findings.extend(child.findings);
            }
        }

        outcome
    }
    .boxed()
}

fn screen_target(path: &[String], current: &str, target: &str) -> Option<WalkFinding> {
    if target.contains('%') {
        return Some(WalkFinding::MacroTarget {
            target: target.to_string(),
        });
    }
    if path.iter().any(|p| p == target) {
        return Some(WalkFinding::Cycle {
            from: current.to_string(),
            target: target.to_string(),
        });
    }
    None
}

/// Fetches and walks the SPF record at `target`.
async fn expand<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    state: &SpfWalkState,
    target: String,
    path: Vec<String>,
) -> WalkOutcome {
    state.mark_visited(&target);
    let mut outcome = WalkOutcome::default();

    let values = match gateway.txt(&target).await {
        Ok(values) => values,
        Err(DnsError::NxDomain) => {
            outcome.findings.push(WalkFinding::MissingRecord { target });
            return outcome;
        }
        Err(error) => {
            outcome
                .findings
                .push(WalkFinding::LookupFailed { target, error });
            return outcome;
        }
    };

    let mut records: Vec<&String> = values.iter().filter(|v| is_spf(v)).collect();
    let raw = match (records.pop(), records.is_empty()) {
        (Some(raw), true) => raw,
        (Some(_), false) => {
            outcome
                .findings
                .push(WalkFinding::MultipleRecords { target });
            return outcome;
        }
        (None, _) => {
            outcome.findings.push(WalkFinding::MissingRecord { target });
            return outcome;
        }
    };

    debug!("SPF {target}: {raw}");
    let record = SpfRecord::parse(raw);
    outcome
        .findings
        .extend(record.errors.iter().map(|error| WalkFinding::SyntaxError {
            domain: target.clone(),
            error: error.clone(),
        }));

    let child = walk_record(gateway, state, &record, path).await;
    outcome.terminal = child.terminal;
    outcome.redirected = child.redirected;
    outcome.findings.extend(child.findings);
    outcome
}
