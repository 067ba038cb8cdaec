//! mail_posture library: email-authentication posture scoring
//!
//! Assesses a domain's MX, SPF, DKIM and DMARC configuration over DNS and
//! returns a versioned 0-100 score, a letter grade and remediation text.
//!
//! # Example
//!
//! ```no_run
//! use mail_posture::assess;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = assess("example.com", None).await?;
//! println!("{} scored {} ({})", report.domain, report.score, report.grade);
//! for fix in &report.remediation {
//!     println!("- {fix}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Tests and embedders that need
//! deterministic DNS inject a [`MockResolver`] through [`Assessor`].

pub mod checks;
pub mod config;
pub mod dns;
pub mod domain;
pub mod error_handling;
pub mod initialization;
pub mod provider;
pub mod scoring;

mod run;

// Re-export public API
pub use checks::{CheckResult, Level, Message};
pub use config::{Config, LogFormat, LogLevel, ScanOptions};
pub use dns::{DnsResolver, HickoryResolver, MockResolver};
pub use domain::ScanRequest;
pub use error_handling::{AssessError, DomainError};
pub use provider::ProviderTag;
pub use run::{assess, Assessor};
pub use scoring::{Checks, Grade, ScanResult, ScoreVersion};
