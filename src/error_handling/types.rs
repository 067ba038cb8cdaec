//! Error type definitions.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Reasons a domain string is rejected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Nothing left after trimming and stripping scheme, path and port.
    #[error("domain is empty")]
    Empty,

    /// Longer than the 253 characters a DNS name can carry.
    #[error("domain exceeds 253 characters ({0})")]
    TooLong(usize),

    /// IP literals have no mail-authentication records.
    #[error("IP addresses cannot be assessed: {0}")]
    IpAddress(String),

    /// A single-label name such as `localhost`.
    #[error("domain must contain at least two labels: {0}")]
    SingleLabel(String),

    /// A label breaks hostname syntax (length, characters, hyphen placement).
    #[error("invalid label '{label}' in {domain}")]
    InvalidLabel {
        /// Full normalized domain
        domain: String,
        /// Offending label
        label: String,
    },

    /// The top-level label is not alphabetic or is too short.
    #[error("invalid top-level domain in {0}")]
    InvalidTld(String),

    /// Input had a scheme but could not be parsed as a URL with a host.
    #[error("could not extract a host from '{0}'")]
    Unparsable(String),
}

/// Failures that prevent a scan from producing a [`crate::ScanResult`].
#[derive(Error, Debug)]
pub enum AssessError {
    /// The domain failed syntax validation; no DNS query was made.
    #[error("invalid domain: {0}")]
    InvalidDomain(#[from] DomainError),

    /// The requested scoring rubric does not exist.
    #[error("unknown score version '{0}'")]
    UnknownScoreVersion(String),

    /// The scan deadline passed before any check produced a result.
    #[error("scan deadline of {0:?} elapsed before any check completed")]
    DeadlineElapsed(Duration),
}

/// A malformed fragment inside an SPF, DKIM or DMARC record.
///
/// Parsers collect these instead of aborting so the rest of the record can still be scored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{fragment}': {reason}")]
pub struct RecordSyntaxError {
    /// The token or tag as it appeared in the record
    pub fragment: String,
    /// Why it was rejected
    pub reason: String,
}

impl RecordSyntaxError {
    pub fn new(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}
