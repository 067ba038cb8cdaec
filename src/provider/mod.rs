//! Mail provider detection from already-fetched MX and SPF evidence.
//!
//! Detection never touches the network. The result only steers which DKIM
//! selectors are probed first and how rotation findings are worded.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::dns::MxHost;

/// Hosted mail provider inferred for a domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderTag {
    /// Exchange Online
    #[serde(rename = "microsoft365")]
    #[strum(serialize = "microsoft365")]
    Microsoft365,
    GoogleWorkspace,
    #[default]
    Unknown,
}

/// Host suffixes that identify a provider. Matching is on label boundaries.
const PROVIDER_SUFFIXES: &[(&str, ProviderTag)] = &[
    ("outlook.com", ProviderTag::Microsoft365),
    ("google.com", ProviderTag::GoogleWorkspace),
    ("googlemail.com", ProviderTag::GoogleWorkspace),
];

/// Classifies the provider. MX hosts are consulted before SPF include
/// targets; the first host that matches decides.
pub fn detect(mx_hosts: &[MxHost], spf_includes: &[String]) -> ProviderTag {
    mx_hosts
        .iter()
        .map(|mx| mx.exchange.as_str())
        .chain(spf_includes.iter().map(String::as_str))
        .find_map(match_host)
        .unwrap_or_default()
}

fn match_host(host: &str) -> Option<ProviderTag> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    PROVIDER_SUFFIXES
        .iter()
        .find(|(suffix, _)| {
            host == *suffix
                || host
                    .strip_suffix(suffix)
                    .is_some_and(|rest| rest.ends_with('.'))
        })
        .map(|(_, tag)| *tag)
}
