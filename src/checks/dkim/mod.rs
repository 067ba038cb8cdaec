//! DKIM checker.
//!
//! DKIM has no discovery record, so a candidate list of selectors is probed at
//! `<selector>._domainkey.<domain>`. Probes run concurrently up to a small limit
//! and every probe finishes before scoring; results are reported in candidate
//! order regardless of completion order.

mod key;

use futures::stream::{self, StreamExt};
use log::debug;

use crate::dns::{DnsError, DnsGateway, DnsResolver};
use crate::error_handling::RecordSyntaxError;
use crate::provider::ProviderTag;
use crate::scoring::DkimRubric;

use super::CheckResult;

pub use key::{parse_key_record, KeyRecord, KeyType};

/// Outcome of probing one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkimCandidateResult {
    pub selector: String,
    /// A `v=DKIM1` record with a non-empty `p=` was published
    pub found: bool,
    pub key_type: Option<KeyType>,
    pub key_bits: Option<u32>,
    /// `t=y`
    pub testing: bool,
    /// Published with an empty `p=`
    pub revoked: bool,
    /// Why a published key could not be read
    pub key_error: Option<RecordSyntaxError>,
    /// Transient or malformed lookup; NXDOMAIN is simply "not found"
    pub lookup_error: Option<DnsError>,
}

impl DkimCandidateResult {
    fn empty(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            found: false,
            key_type: None,
            key_bits: None,
            testing: false,
            revoked: false,
            key_error: None,
            lookup_error: None,
        }
    }
}

/// Probes every selector and returns the results in the order given.
pub async fn probe_selectors<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    selectors: &[&str],
    concurrency: usize,
) -> Vec<DkimCandidateResult> {
    let mut results: Vec<(usize, DkimCandidateResult)> = stream::iter(selectors.iter().enumerate())
        .map(|(idx, selector)| async move { (idx, probe(gateway, domain, selector).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

async fn probe<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    selector: &str,
) -> DkimCandidateResult {
    let mut result = DkimCandidateResult::empty(selector);
    let name = format!("{selector}._domainkey.{domain}");

    let values = match gateway.txt(&name).await {
        Ok(values) => values,
        Err(DnsError::NxDomain) => return result,
        Err(e) => {
            debug!("DKIM probe {name} failed: {e}");
            result.lookup_error = Some(e);
            return result;
        }
    };

    let Some(record) = values.iter().find_map(|v| parse_key_record(v)) else {
        return result;
    };
    match record {
        KeyRecord::Key {
            key_type,
            bits,
            testing,
        } => {
            result.found = true;
            result.key_type = Some(key_type);
            result.key_bits = Some(bits);
            result.testing = testing;
        }
        KeyRecord::Revoked => result.revoked = true,
        KeyRecord::Malformed { testing, error } => {
            result.found = true;
            result.testing = testing;
            result.key_error = Some(error);
        }
    }
    result
}

/// Scores DKIM from the candidate selectors for `provider`.
pub async fn check<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    rubric: &DkimRubric,
    selectors: &[&str],
    provider: ProviderTag,
    concurrency: usize,
) -> CheckResult {
    let probes = probe_selectors(gateway, domain, selectors, concurrency).await;
    score(&probes, rubric, provider)
}

/// Scores already-probed selectors.
pub fn score(probes: &[DkimCandidateResult], rubric: &DkimRubric, provider: ProviderTag) -> CheckResult {
    let mut result = CheckResult::new(rubric.max);
    let hits: Vec<&DkimCandidateResult> = probes.iter().filter(|p| p.found).collect();

    for revoked in probes.iter().filter(|p| p.revoked) {
        result.info(format!(
            "DKIM selector '{}' has a revoked key (empty p=)",
            revoked.selector
        ));
    }

    if hits.is_empty() {
        result.error_fix(
            format!("No DKIM selectors found ({} common selectors probed)", probes.len()),
            "Configure DKIM signing with your email provider and publish the selector record",
        );
        let failed = probes.iter().filter(|p| p.lookup_error.is_some()).count();
        if failed > 0 {
            result.warning(format!(
                "DKIM could not be fully verified: {failed} selector lookup(s) failed"
            ));
        }
        return result;
    }

    let names: Vec<&str> = hits.iter().map(|h| h.selector.as_str()).collect();
    result.award(rubric.discovered);
    result.success(format!(
        "Found {} DKIM selector(s): {}",
        hits.len(),
        names.join(", ")
    ));

    let mut best = 0;
    for hit in &hits {
        best = best.max(key_credit(&mut result, rubric, hit));
    }
    result.award(best);

    if hits.len() >= 2 {
        result.award(rubric.rotation);
        result.success("Multiple DKIM selectors published (ready for key rotation)");
    } else if provider == ProviderTag::Microsoft365
        && matches!(names[0], "selector1" | "selector2")
    {
        result.warn_fix(
            "Only one Microsoft 365 DKIM selector is published",
            "Enable both selector1 and selector2 in the Microsoft 365 admin center",
        );
    } else {
        result.info("Single DKIM selector found; publish a second to allow key rotation");
    }

    result
}

/// Key credit for one selector, emitting its key-strength messages.
fn key_credit(result: &mut CheckResult, rubric: &DkimRubric, hit: &DkimCandidateResult) -> u32 {
    let selector = &hit.selector;
    let credit = match (hit.key_type, hit.key_bits, &hit.key_error) {
        (_, _, Some(error)) => {
            result.error_fix(
                format!("DKIM selector '{selector}' key is malformed: {error}"),
                "Republish the DKIM key record with a valid base64 public key",
            );
            0
        }
        (Some(KeyType::Ed25519), _, None) => {
            result.success(format!("DKIM selector '{selector}': Ed25519 key"));
            rubric.strong_key
        }
        (_, Some(bits), None) if bits >= rubric.strong_bits => {
            result.success(format!("DKIM selector '{selector}': {bits}-bit RSA key"));
            rubric.strong_key
        }
        (_, Some(bits), None) if bits >= rubric.medium_bits => {
            result.warn_fix(
                format!(
                    "DKIM selector '{selector}': {bits}-bit RSA key; upgrade to {}",
                    rubric.strong_bits
                ),
                format!("Rotate DKIM keys to {}-bit RSA", rubric.strong_bits),
            );
            rubric.medium_key
        }
        (_, bits, None) => {
            result.error_fix(
                format!(
                    "DKIM selector '{selector}': {}-bit RSA key is too weak",
                    bits.unwrap_or(0)
                ),
                format!(
                    "Replace weak DKIM keys with {}-bit RSA keys",
                    rubric.strong_bits
                ),
            );
            0
        }
    };

    if hit.testing {
        result.warn_fix(
            format!("DKIM selector '{selector}' is in testing mode (t=y)"),
            "Remove t=y from DKIM records once signing is verified",
        );
        return credit.min(rubric.testing_cap);
    }
    credit
}
