//! Scan orchestration.
//!
//! One scan validates the domain, picks the rubric, gathers provider evidence,
//! then runs the four checkers concurrently against a shared [`DnsGateway`]
//! under a single deadline.

use log::{debug, info, warn};
use tokio::time::{timeout_at, Instant};

use crate::checks::{self, CheckResult};
use crate::config::{ScanOptions, DEFAULT_SCORE_VERSION};
use crate::dns::{DnsError, DnsGateway, DnsResolver, HickoryResolver};
use crate::domain::ScanRequest;
use crate::error_handling::AssessError;
use crate::initialization::init_resolver;
use crate::provider::{self, ProviderTag};
use crate::scoring::{aggregate, Checks, ScanResult, ScoreVersion};

/// Runs scans against an injected resolver.
///
/// Each call to [`Assessor::assess`] gets its own gateway, so nothing is cached
/// between scans.
///
/// # Examples
///
/// ```
/// use mail_posture::{Assessor, MockResolver, ScanOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dns = MockResolver::new();
/// dns.add_txt("example.com", "v=spf1 -all");
/// let assessor = Assessor::new(dns, ScanOptions::default());
/// let report = assessor.assess("example.com", None).await.unwrap();
/// assert_eq!(report.checks.spf.points, 25);
/// # }
/// ```
#[derive(Clone)]
pub struct Assessor<R: DnsResolver> {
    resolver: R,
    options: ScanOptions,
}

impl<R: DnsResolver> Assessor<R> {
    pub fn new(resolver: R, options: ScanOptions) -> Self {
        Self { resolver, options }
    }

    /// Assesses `domain` under `score_version` (default `"1.0"`).
    ///
    /// # Errors
    ///
    /// - [`AssessError::InvalidDomain`] before any DNS query if the domain fails
    ///   syntax validation
    /// - [`AssessError::UnknownScoreVersion`] if no rubric has that name
    /// - [`AssessError::DeadlineElapsed`] if none of the four checks finished in time
    pub async fn assess(
        &self,
        domain: &str,
        score_version: Option<&str>,
    ) -> Result<ScanResult, AssessError> {
        let request = ScanRequest::parse(domain)?;
        let version_name = score_version.unwrap_or(DEFAULT_SCORE_VERSION);
        let version = ScoreVersion::lookup(version_name)
            .ok_or_else(|| AssessError::UnknownScoreVersion(version_name.to_string()))?;

        let deadline = Instant::now() + self.options.deadline;
        let gateway = DnsGateway::new(self.resolver.clone(), &self.options, deadline);
        let domain = request.domain();
        debug!("Assessing {domain} with score version {}", version.name);

        let provider = detect_provider(&gateway, domain).await;
        let selectors = version.selectors.candidates(provider);
        debug!("Provider for {domain}: {provider}; {} DKIM candidates", selectors.len());

        let (mx, spf, dkim, dmarc) = tokio::join!(
            timeout_at(
                deadline,
                checks::mx::check(&gateway, domain, &version.mx, self.options.mx_concurrency),
            ),
            timeout_at(deadline, checks::spf::check(&gateway, domain, &version.spf)),
            timeout_at(
                deadline,
                checks::dkim::check(
                    &gateway,
                    domain,
                    &version.dkim,
                    &selectors,
                    provider,
                    self.options.dkim_concurrency,
                ),
            ),
            timeout_at(deadline, checks::dmarc::check(&gateway, domain, &version.dmarc)),
        );

        if mx.is_err() && spf.is_err() && dkim.is_err() && dmarc.is_err() {
            warn!("No check for {domain} finished before the scan deadline");
            return Err(AssessError::DeadlineElapsed(self.options.deadline));
        }

        let checks = Checks {
            mx: mx.unwrap_or_else(|_| overdue(domain, "MX", version.mx.max)),
            spf: spf.unwrap_or_else(|_| overdue(domain, "SPF", version.spf.max)),
            dkim: dkim.unwrap_or_else(|_| overdue(domain, "DKIM", version.dkim.max)),
            dmarc: dmarc.unwrap_or_else(|_| overdue(domain, "DMARC", version.dmarc.max)),
        };

        let report = aggregate(domain, version, provider, checks);
        info!(
            "{domain}: score {} ({}) under version {}",
            report.score, report.grade, report.score_version
        );
        Ok(report)
    }
}

/// Classifies the provider from the root MX hosts and SPF includes.
///
/// Both lookups go through the scan gateway, so the checkers reuse the answers.
async fn detect_provider<R: DnsResolver>(gateway: &DnsGateway<R>, domain: &str) -> ProviderTag {
    let (mx, txt) = tokio::join!(gateway.mx(domain), gateway.txt(domain));
    let mx_hosts = mx.unwrap_or_else(|e| evidence_missing(domain, "MX", e));
    let includes = txt
        .map(|values| checks::spf::include_targets(&values))
        .unwrap_or_else(|e| evidence_missing(domain, "TXT", e));
    provider::detect(&mx_hosts, &includes)
}

fn evidence_missing<T>(domain: &str, what: &str, error: DnsError) -> Vec<T> {
    if error.is_transient() {
        warn!("Provider detection for {domain} has no {what} evidence: {error}");
    }
    Vec::new()
}

fn overdue(domain: &str, check: &str, max_points: u32) -> CheckResult {
    warn!("{check} check for {domain} did not finish before the scan deadline");
    CheckResult::degraded(
        max_points,
        format!("{check} check did not finish before the scan deadline; result is degraded"),
    )
}

/// Assesses `domain` with the system resolver and default [`ScanOptions`].
///
/// # Errors
///
/// See [`Assessor::assess`].
pub async fn assess(domain: &str, score_version: Option<&str>) -> Result<ScanResult, AssessError> {
    let options = ScanOptions::default();
    let resolver = HickoryResolver::new(init_resolver(options.dns_timeout));
    Assessor::new(resolver, options)
        .assess(domain, score_version)
        .await
}
