//! Per-scan DNS gateway.
//!
//! Every checker in a scan shares one [`DnsGateway`]. It owns the memoization
//! cache for that scan only, so a second scan always sees fresh answers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use crate::config::{
    ScanOptions, DNS_RETRY_BACKOFF_BASE, DNS_RETRY_BACKOFF_FACTOR_MS, DNS_RETRY_MAX_DELAY_MS,
};

use super::records::{DnsError, DnsRecordSet, MxHost, RecordType};
use super::resolver::DnsResolver;

type CacheKey = (String, RecordType);

/// Memoizing, retrying, deadline-aware front for a [`DnsResolver`].
pub struct DnsGateway<R: DnsResolver> {
    resolver: R,
    cache: RwLock<HashMap<CacheKey, Result<DnsRecordSet, DnsError>>>,
    deadline: Instant,
    dns_timeout: Duration,
    retries: usize,
}

impl<R: DnsResolver> DnsGateway<R> {
    /// Creates a gateway for one scan that stops issuing queries at `deadline`.
    pub fn new(resolver: R, options: &ScanOptions, deadline: Instant) -> Self {
        Self {
            resolver,
            cache: RwLock::new(HashMap::new()),
            deadline,
            dns_timeout: options.dns_timeout,
            retries: options.dns_retries,
        }
    }

    /// Resolves `(name, record_type)`, answering from the scan cache when possible.
    ///
    /// # Errors
    ///
    /// `NxDomain` is returned without retrying. Transient failures are retried up to
    /// the configured count and then returned; once the deadline passes the result
    /// is `Timeout`.
    pub async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<DnsRecordSet, DnsError> {
        let key = (normalize_name(name), record_type);
        if let Some(hit) = self.cached(&key) {
            debug!("DNS cache hit: {} {}", key.0, record_type);
            return hit;
        }

        let result = self.query_with_retry(&key.0, record_type).await;
        // Transient failures stay uncached so a later checker may try again
        if matches!(result, Ok(_) | Err(DnsError::NxDomain)) {
            self.store(key, result)
        } else {
            result
        }
    }

    /// MX hosts for `name`, sorted by preference.
    pub async fn mx(&self, name: &str) -> Result<Vec<MxHost>, DnsError> {
        self.resolve(name, RecordType::Mx).await.map(|set| set.mx())
    }

    /// TXT values for `name` with multi-string records joined.
    pub async fn txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.resolve(name, RecordType::Txt).await.map(|set| set.txt())
    }

    /// Whether `name` has any A or AAAA record.
    ///
    /// # Errors
    ///
    /// Returns the transient error when neither family produced an answer and at
    /// least one lookup failed transiently.
    pub async fn host_resolves(&self, name: &str) -> Result<bool, DnsError> {
        let a = self.resolve(name, RecordType::A).await;
        match &a {
            Ok(set) if !set.is_empty() => return Ok(true),
            Err(DnsError::NxDomain) => return Ok(false),
            _ => {}
        }
        let aaaa = self.resolve(name, RecordType::Aaaa).await;
        match (a, aaaa) {
            (_, Ok(set)) if !set.is_empty() => Ok(true),
            (Err(e), _) if e.is_transient() => Err(e),
            (_, Err(e)) if e.is_transient() => Err(e),
            _ => Ok(false),
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Result<DnsRecordSet, DnsError>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// First writer wins; a racing second answer for the same key is discarded.
    fn store(
        &self,
        key: CacheKey,
        result: Result<DnsRecordSet, DnsError>,
    ) -> Result<DnsRecordSet, DnsError> {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(result)
            .clone()
    }

    async fn query_with_retry(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<DnsRecordSet, DnsError> {
        if Instant::now() >= self.deadline {
            debug!("Skipping {record_type} query for {name}: scan deadline reached");
            return Err(DnsError::Timeout);
        }

        let strategy = ExponentialBackoff::from_millis(DNS_RETRY_BACKOFF_BASE)
            .factor(DNS_RETRY_BACKOFF_FACTOR_MS)
            .max_delay(Duration::from_millis(DNS_RETRY_MAX_DELAY_MS))
            .take(self.retries);

        let deadline = self.deadline;
        let retrying = RetryIf::start(
            strategy,
            || self.attempt(name, record_type),
            |e: &DnsError| {
                let retry = e.is_transient() && Instant::now() < deadline;
                if retry {
                    debug!("Retrying {record_type} query for {name} after: {e}");
                }
                retry
            },
        );

        match tokio::time::timeout_at(deadline, retrying).await {
            Ok(Ok(set)) => Ok(set),
            Ok(Err(e)) => {
                if e.is_transient() {
                    warn!("{record_type} lookup for {name} failed: {e}");
                } else {
                    debug!("{record_type} lookup for {name}: {e}");
                }
                Err(e)
            }
            Err(_) => {
                warn!("{record_type} lookup for {name} abandoned at scan deadline");
                Err(DnsError::Timeout)
            }
        }
    }

    async fn attempt(&self, name: &str, record_type: RecordType) -> Result<DnsRecordSet, DnsError> {
        debug!("DNS query: {name} {record_type}");
        match tokio::time::timeout(self.dns_timeout, self.resolver.lookup(name, record_type)).await
        {
            Ok(Ok(records)) => Ok(DnsRecordSet {
                name: name.to_string(),
                record_type,
                records,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DnsError::Timeout),
        }
    }
}

/// Cache keys ignore case and a trailing dot.
fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
