//! Error taxonomy for the assessment engine.
//!
//! Errors are split by how far they travel:
//! - **Fatal**: [`AssessError`] and [`DomainError`] reject a scan before or instead of a result
//! - **Localized**: [`RecordSyntaxError`] is turned into a scoring penalty by the owning checker
//! - **Setup**: [`InitializationError`] covers logger construction in the binary
//!
//! DNS failures are classified by [`crate::dns::DnsError`] and never escape a checker.

mod types;

// Re-export public API
pub use types::{AssessError, DomainError, InitializationError, RecordSyntaxError};
