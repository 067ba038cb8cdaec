//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and the library-facing scan configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_SCORE_VERSION, DKIM_PROBE_CONCURRENCY, DNS_RETRY_ATTEMPTS, DNS_TIMEOUT_SECS,
    MX_RESOLVE_CONCURRENCY, SCAN_DEADLINE_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration for a single scan (no CLI dependencies).
///
/// # Examples
///
/// ```
/// use mail_posture::ScanOptions;
/// use std::time::Duration;
///
/// let options = ScanOptions {
///     deadline: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert_eq!(options.dns_retries, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Overall deadline for one scan
    pub deadline: Duration,

    /// Per-query DNS timeout
    pub dns_timeout: Duration,

    /// Retries after the first attempt for transient DNS failures
    pub dns_retries: usize,

    /// Maximum concurrent DKIM selector probes
    pub dkim_concurrency: usize,

    /// Maximum concurrent MX host lookups
    pub mx_concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(SCAN_DEADLINE_SECS),
            dns_timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
            dns_retries: DNS_RETRY_ATTEMPTS,
            dkim_concurrency: DKIM_PROBE_CONCURRENCY,
            mx_concurrency: MX_RESOLVE_CONCURRENCY,
        }
    }
}

/// Command-line options for the `mail_posture` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mail_posture",
    version,
    about = "Scores a domain's email-authentication posture (MX, SPF, DKIM, DMARC)"
)]
pub struct Config {
    /// Domain to assess (a URL is accepted; its host is used)
    pub domain: String,

    /// Scoring rubric version
    #[arg(long, default_value = DEFAULT_SCORE_VERSION)]
    pub score_version: String,

    /// Overall scan deadline in seconds
    #[arg(long, default_value_t = SCAN_DEADLINE_SECS)]
    pub deadline_secs: u64,

    /// Per-query DNS timeout in seconds
    #[arg(long, default_value_t = DNS_TIMEOUT_SECS)]
    pub dns_timeout_secs: u64,

    /// Retries for transient DNS failures
    #[arg(long, default_value_t = DNS_RETRY_ATTEMPTS)]
    pub dns_retries: usize,

    /// Maximum concurrent DKIM selector probes
    #[arg(long, default_value_t = DKIM_PROBE_CONCURRENCY)]
    pub dkim_concurrency: usize,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Print the report on a single line instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,

    /// Exit with status 2 when the score is below this value
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub fail_below: Option<u32>,
}

impl Config {
    /// Builds the library scan options from CLI flags.
    ///
    /// Zero concurrency values are raised to 1 so a probe set can always drain.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            deadline: Duration::from_secs(self.deadline_secs),
            dns_timeout: Duration::from_secs(self.dns_timeout_secs),
            dns_retries: self.dns_retries,
            dkim_concurrency: self.dkim_concurrency.max(1),
            mx_concurrency: MX_RESOLVE_CONCURRENCY,
        }
    }
}
