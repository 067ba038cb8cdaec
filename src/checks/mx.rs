//! MX presence and host resolvability.

use futures::stream::{self, StreamExt};
use log::debug;

use crate::dns::{DnsError, DnsGateway, DnsResolver, MxHost};
use crate::scoring::MxRubric;

use super::CheckResult;

/// Scores the domain's MX records.
///
/// Hosts are resolved concurrently, at most `concurrency` at a time, and reported
/// in preference order.
pub async fn check<R: DnsResolver>(
    gateway: &DnsGateway<R>,
    domain: &str,
    rubric: &MxRubric,
    concurrency: usize,
) -> CheckResult {
    let mut result = CheckResult::new(rubric.max);

    let hosts = match gateway.mx(domain).await {
        Ok(hosts) => hosts,
        Err(DnsError::NxDomain) => {
            result.error_fix(
                format!("{domain} does not exist (NXDOMAIN)"),
                "Check the domain name; it is not registered in DNS",
            );
            return result;
        }
        Err(e) => {
            result.warning(format!("MX lookup failed ({e}); MX result is degraded"));
            return result;
        }
    };

    if hosts.is_empty() {
        result.error_fix(
            "No MX records found",
            "Add MX records so the domain can receive mail",
        );
        return result;
    }

    let usable: Vec<MxHost> = hosts.iter().filter(|h| !h.is_null()).cloned().collect();
    if usable.is_empty() {
        result.info("Domain publishes a null MX (RFC 7505) and accepts no mail");
        return result;
    }

    let outcomes: Vec<(String, Result<bool, DnsError>)> = stream::iter(usable)
        .map(|host| async move {
            let resolves = gateway.host_resolves(&host.exchange).await;
            (host.exchange, resolves)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut resolved = Vec::new();
    let mut dangling = Vec::new();
    let mut unverified = Vec::new();
    for (host, outcome) in outcomes {
        debug!("MX host {host}: {outcome:?}");
        match outcome {
            Ok(true) => resolved.push(host),
            Ok(false) => dangling.push(host),
            Err(_) => unverified.push(host),
        }
    }

    if resolved.is_empty() && dangling.is_empty() {
        // Nothing was shown to be broken, only unreachable
        result.award(rubric.unresolved);
        result.warning(format!(
            "Could not verify MX host(s): {}; MX result is degraded",
            unverified.join(", ")
        ));
        return result;
    }

    if resolved.is_empty() {
        result.award(rubric.unresolved);
        result.warn_fix(
            format!(
                "Found {} MX record(s) but no MX host resolves",
                hosts.len()
            ),
            "Point MX records at hosts that resolve to an address",
        );
    } else {
        result.award(rubric.resolves);
        result.success(format!(
            "Found {} MX record(s); {} host(s) resolve",
            hosts.len(),
            resolved.len()
        ));
    }

    if !dangling.is_empty() {
        let list = dangling.join(", ");
        result.warn_fix(
            format!("Dangling MX host(s): {list}"),
            format!("Fix or remove dangling MX records: {list}"),
        );
    }
    if !unverified.is_empty() {
        result.warning(format!(
            "Could not verify MX host(s): {}",
            unverified.join(", ")
        ));
    }

    result
}
