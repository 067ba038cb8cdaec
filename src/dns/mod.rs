//! DNS access for one scan.
//!
//! This module provides:
//! - The [`DnsResolver`] seam with a `hickory-resolver` implementation and a
//!   [`MockResolver`] for tests
//! - The [`DnsGateway`]: per-scan memoization, bounded retry of transient
//!   failures, and the scan deadline
//! - Record types ([`DnsRecordSet`], [`DnsRecord`]) and failure classification ([`DnsError`])
//!
//! Only MX, A, AAAA and TXT are supported; nothing else is needed for scoring.

mod gateway;
mod mock;
mod records;
mod resolver;

// Re-export public API
pub use gateway::DnsGateway;
pub use mock::MockResolver;
pub use records::{DnsError, DnsRecord, DnsRecordSet, MxHost, RecordType};
pub use resolver::{DnsResolver, HickoryResolver};
