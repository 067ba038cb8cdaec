//! Configuration constants.
//!
//! This module defines the operational defaults used throughout the engine,
//! including DNS timeouts, retry policy, fan-out limits and the SPF lookup budget.

/// Scoring rubric used when the caller does not name one.
pub const DEFAULT_SCORE_VERSION: &str = "1.0";

// Scan deadline
/// Overall deadline for one scan in seconds.
/// Every DNS query and selector probe is abandoned once it passes, and the owning
/// check is degraded instead of failing the scan.
pub const SCAN_DEADLINE_SECS: u64 = 20;

// DNS behavior
/// Per-query DNS timeout in seconds.
/// Most answers arrive well under a second; 3s fails fast on dead servers.
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// Number of retries after the first attempt for transient failures (SERVFAIL, timeout).
/// NXDOMAIN is authoritative and never retried.
pub const DNS_RETRY_ATTEMPTS: usize = 2;
/// Exponential backoff base; the n-th retry waits `base^n * factor` milliseconds.
pub const DNS_RETRY_BACKOFF_BASE: u64 = 2;
/// Backoff factor in milliseconds (first retry after 100ms, then 200ms, 400ms).
pub const DNS_RETRY_BACKOFF_FACTOR_MS: u64 = 50;
/// Upper bound for a single backoff delay.
pub const DNS_RETRY_MAX_DELAY_MS: u64 = 1_000;

// Fan-out limits
/// Maximum concurrent DKIM selector probes per scan.
pub const DKIM_PROBE_CONCURRENCY: usize = 4;
/// Maximum concurrent A/AAAA lookups for MX hosts.
pub const MX_RESOLVE_CONCURRENCY: usize = 5;

// SPF
/// DNS-querying terms allowed during one SPF evaluation (RFC 7208 section 4.6.4).
pub const SPF_LOOKUP_LIMIT: usize = 10;
