//! DNS record model and failure classification.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Query types the engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    Mx,
    A,
    Aaaa,
    Txt,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::Mx => "MX",
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Txt => "TXT",
        })
    }
}

/// One answer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsRecord {
    /// Mail exchanger; `exchange` has no trailing dot and is empty for a null MX.
    Mx { preference: u16, exchange: String },
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    /// TXT value with its character-strings concatenated.
    Txt(String),
}

/// An MX answer as consumed by the checkers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub preference: u16,
    pub exchange: String,
}

impl MxHost {
    /// RFC 7505 null MX: the domain states it accepts no mail.
    pub fn is_null(&self) -> bool {
        self.exchange.is_empty() || self.exchange == "."
    }
}

/// The answer to one `(name, type)` query. An empty set means NOERROR/NODATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub records: Vec<DnsRecord>,
}

impl DnsRecordSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// TXT values in answer order.
    pub fn txt(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| match r {
                DnsRecord::Txt(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// MX hosts sorted by preference (lower first), ties by name.
    pub fn mx(&self) -> Vec<MxHost> {
        let mut hosts: Vec<MxHost> = self
            .records
            .iter()
            .filter_map(|r| match r {
                DnsRecord::Mx {
                    preference,
                    exchange,
                } => Some(MxHost {
                    preference: *preference,
                    exchange: exchange.clone(),
                }),
                _ => None,
            })
            .collect();
        hosts.sort_by(|a, b| {
            a.preference
                .cmp(&b.preference)
                .then_with(|| a.exchange.cmp(&b.exchange))
        });
        hosts
    }
}

/// Classified DNS failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    /// Authoritative: the name does not exist. Never retried.
    #[error("NXDOMAIN: domain does not exist")]
    NxDomain,
    #[error("SERVFAIL: server failure")]
    ServFail,
    #[error("timeout")]
    Timeout,
    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("DNS error: {0}")]
    Other(String),
}

impl DnsError {
    /// Transient failures are retried by the gateway and degrade, rather than zero, a check.
    pub fn is_transient(&self) -> bool {
        matches!(self, DnsError::ServFail | DnsError::Timeout | DnsError::Other(_))
    }
}
