//! DMARC record parser (RFC 7489 section 6.3).
//!
//! `v=DMARC1` and a valid `p=` are required; without them the record is
//! rejected. Bad optional tags are recorded and parsing carries on.

use std::fmt;

use crate::checks::parse_tag_list;
use crate::error_handling::RecordSyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Policy {
    None,
    Quarantine,
    Reject,
}

impl Policy {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Policy::None),
            "quarantine" => Some(Policy::Quarantine),
            "reject" => Some(Policy::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Policy::None => "none",
            Policy::Quarantine => "quarantine",
            Policy::Reject => "reject",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Relaxed,
    Strict,
}

impl Alignment {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "r" => Some(Alignment::Relaxed),
            "s" => Some(Alignment::Strict),
            _ => None,
        }
    }
}

/// An optional tag: not published, published with a usable value, or published
/// with a value that was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagValue<T> {
    #[default]
    Absent,
    Valid(T),
    Invalid,
}

impl<T: Copy> TagValue<T> {
    pub fn valid(&self) -> Option<T> {
        match self {
            TagValue::Valid(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmarcRecord {
    pub policy: Policy,
    pub subdomain_policy: TagValue<Policy>,
    pub pct: TagValue<u8>,
    pub adkim: TagValue<Alignment>,
    pub aspf: TagValue<Alignment>,
    /// `mailto:` aggregate report addresses
    pub rua: Vec<String>,
    /// `mailto:` failure report addresses
    pub ruf: Vec<String>,
    /// Report URIs with a scheme other than `mailto:`
    pub ignored_uris: Vec<String>,
    pub fo: Option<String>,
    /// Optional tags whose values were rejected
    pub errors: Vec<RecordSyntaxError>,
}

/// Whether a TXT value declares itself a DMARC record.
pub fn is_dmarc(txt: &str) -> bool {
    parse_tag_list(txt)
        .first()
        .is_some_and(|(tag, value)| tag == "v" && value.eq_ignore_ascii_case("DMARC1"))
}

impl DmarcRecord {
    /// Parses a DMARC TXT value.
    ///
    /// # Errors
    ///
    /// Fails when `v=DMARC1` is not the first tag or `p=` is missing or invalid.
    pub fn parse(record: &str) -> Result<Self, RecordSyntaxError> {
        let tags = parse_tag_list(record);

        match tags.first() {
            Some((tag, value)) if tag == "v" && value.eq_ignore_ascii_case("DMARC1") => {}
            Some((tag, value)) => {
                return Err(RecordSyntaxError::new(
                    format!("{tag}={value}"),
                    "record must start with v=DMARC1",
                ))
            }
            None => return Err(RecordSyntaxError::new(record.trim(), "no tags found")),
        }

        // First occurrence of each tag wins
        let get = |name: &str| {
            tags.iter()
                .find(|(tag, _)| tag == name)
                .map(|(_, value)| value.as_str())
        };

        let policy = match get("p") {
            Some(value) => Policy::parse(value).ok_or_else(|| {
                RecordSyntaxError::new(format!("p={value}"), "policy must be none, quarantine or reject")
            })?,
            None => return Err(RecordSyntaxError::new(record.trim(), "missing required p= tag")),
        };

        let mut errors = Vec::new();
        let subdomain_policy = optional_tag(
            get("sp"),
            "sp",
            Policy::parse,
            "must be none, quarantine or reject",
            &mut errors,
        );
        let pct = optional_tag(get("pct"), "pct", parse_pct, "must be an integer from 0 to 100", &mut errors);
        let adkim = optional_tag(get("adkim"), "adkim", Alignment::parse, "must be r or s", &mut errors);
        let aspf = optional_tag(get("aspf"), "aspf", Alignment::parse, "must be r or s", &mut errors);

        let mut rua = Vec::new();
        let mut ruf = Vec::new();
        let mut ignored_uris = Vec::new();
        for (name, sink) in [("rua", &mut rua), ("ruf", &mut ruf)] {
            for uri in get(name).into_iter().flat_map(|v| v.split(',')) {
                let uri = uri.trim();
                if uri.is_empty() {
                    continue;
                }
                if uri.get(..7).is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:")) {
                    sink.push(uri.to_string());
                } else {
                    ignored_uris.push(uri.to_string());
                }
            }
        }

        Ok(DmarcRecord {
            policy,
            subdomain_policy,
            pct,
            adkim,
            aspf,
            rua,
            ruf,
            ignored_uris,
            fo: get("fo").map(str::to_string),
            errors,
        })
    }
}

/// Parses an optional tag, recording a syntax error when its value is rejected.
fn optional_tag<T>(
    value: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
    reason: &str,
    errors: &mut Vec<RecordSyntaxError>,
) -> TagValue<T> {
    let Some(raw) = value else {
        return TagValue::Absent;
    };
    match parse(raw) {
        Some(parsed) => TagValue::Valid(parsed),
        None => {
            errors.push(RecordSyntaxError::new(format!("{name}={raw}"), reason));
            TagValue::Invalid
        }
    }
}

fn parse_pct(value: &str) -> Option<u8> {
    value.parse::<u8>().ok().filter(|pct| *pct <= 100)
}
