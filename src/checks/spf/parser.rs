//! Best-effort SPF record parser.
//!
//! Unlike an evaluator, the scorer wants to see every problem in a record, so
//! malformed terms are collected as [`RecordSyntaxError`]s and parsing continues.

use std::collections::HashSet;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::domain::is_valid_hostname;
use crate::error_handling::RecordSyntaxError;

/// Directive qualifier (RFC 7208 section 4.6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Pass,
    Fail,
    SoftFail,
    Neutral,
}

impl Qualifier {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Qualifier::Pass),
            '-' => Some(Qualifier::Fail),
            '~' => Some(Qualifier::SoftFail),
            '?' => Some(Qualifier::Neutral),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Qualifier::Pass => '+',
            Qualifier::Fail => '-',
            Qualifier::SoftFail => '~',
            Qualifier::Neutral => '?',
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}all", self.as_char())
    }
}

/// SPF mechanisms; only the parts the scorer inspects are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    All,
    Include(String),
    A(Option<String>),
    Mx(Option<String>),
    Ptr(Option<String>),
    Ip4(Ipv4Addr, Option<u8>),
    Ip6(Ipv6Addr, Option<u8>),
    Exists(String),
}

impl Mechanism {
    /// Whether evaluating this mechanism costs one DNS lookup.
    pub fn costs_lookup(&self) -> bool {
        !matches!(self, Mechanism::All | Mechanism::Ip4(..) | Mechanism::Ip6(..))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub qualifier: Qualifier,
    pub mechanism: Mechanism,
}

/// A parsed SPF record and everything wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpfRecord {
    pub directives: Vec<Directive>,
    pub redirect: Option<String>,
    pub explanation: Option<String>,
    pub errors: Vec<RecordSyntaxError>,
    /// Terms that repeat an earlier term, as written
    pub duplicates: Vec<String>,
}

/// Whether a TXT value is an SPF record (`v=spf1`, case-insensitive, alone or followed by a space).
pub fn is_spf(txt: &str) -> bool {
    let mut terms = txt.split_ascii_whitespace();
    terms
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case("v=spf1"))
}

const MECHANISMS: &[&str] = &["all", "include", "a", "mx", "ptr", "ip4", "ip6", "exists"];

impl SpfRecord {
    /// Parses every term after `v=spf1`.
    pub fn parse(record: &str) -> Self {
        let mut out = SpfRecord::default();
        let mut terms = record.split_ascii_whitespace();

        match terms.next() {
            Some(first) if first.eq_ignore_ascii_case("v=spf1") => {}
            Some(first) => {
                out.errors
                    .push(RecordSyntaxError::new(first, "record must start with v=spf1"));
                return out;
            }
            None => {
                out.errors
                    .push(RecordSyntaxError::new("", "empty record"));
                return out;
            }
        }

        let mut seen = HashSet::new();
        for term in terms {
            let key = term
                .trim_start_matches(['+', '-', '~', '?'])
                .to_ascii_lowercase();
            if !seen.insert(key) {
                out.duplicates.push(term.to_string());
            }

            if let Some((name, value)) = split_modifier(term) {
                out.modifier(term, name, value);
                continue;
            }
            match parse_directive(term) {
                Ok(directive) => out.directives.push(directive),
                Err(e) => out.errors.push(e),
            }
        }
        out
    }

    fn modifier(&mut self, term: &str, name: &str, value: &str) {
        if name.starts_with(['+', '-', '~', '?']) {
            self.errors.push(RecordSyntaxError::new(
                term,
                "qualifiers are not allowed on modifiers",
            ));
            return;
        }
        let is_redirect = name.eq_ignore_ascii_case("redirect");
        let slot = match name.to_ascii_lowercase().as_str() {
            "redirect" => &mut self.redirect,
            "exp" => &mut self.explanation,
            // Unknown modifiers are ignored (RFC 7208 section 6)
            _ => return,
        };
        if value.is_empty() {
            self.errors
                .push(RecordSyntaxError::new(term, "modifier requires a domain"));
        } else if is_redirect && !is_domain_spec(value) {
            self.errors
                .push(RecordSyntaxError::new(term, format!("invalid domain '{value}'")));
        } else if slot.is_some() {
            self.errors
                .push(RecordSyntaxError::new(term, "modifier appears more than once"));
        } else {
            *slot = Some(value.to_ascii_lowercase());
        }
    }

    /// Qualifier of the first `all` mechanism, if any.
    pub fn all(&self) -> Option<Qualifier> {
        self.directives
            .iter()
            .find(|d| d.mechanism == Mechanism::All)
            .map(|d| d.qualifier)
    }

    /// `include` targets in record order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().filter_map(|d| match &d.mechanism {
            Mechanism::Include(target) => Some(target.as_str()),
            _ => None,
        })
    }

    pub fn has_ptr(&self) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d.mechanism, Mechanism::Ptr(_)))
    }
}

/// Splits `name=value` when `name` is not a mechanism. The name keeps any
/// qualifier so a misplaced one can be reported.
fn split_modifier(term: &str) -> Option<(&str, &str)> {
    let (name, value) = term.split_once('=')?;
    let bare = name.trim_start_matches(['+', '-', '~', '?']);
    if bare.is_empty()
        || !bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        || !bare.starts_with(|c: char| c.is_ascii_alphabetic())
    {
        return None;
    }
    if MECHANISMS.contains(&bare.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some((name, value))
}

fn parse_directive(term: &str) -> Result<Directive, RecordSyntaxError> {
    let err = |reason: &str| RecordSyntaxError::new(term, reason);

    let (qualifier, rest) = match term.chars().next().and_then(Qualifier::from_char) {
        Some(q) => (q, &term[1..]),
        None => (Qualifier::Pass, term),
    };

    let (name, arg) = match rest.find([':', '/']) {
        Some(pos) if rest[pos..].starts_with(':') => (&rest[..pos], Some(&rest[pos + 1..])),
        Some(pos) => (&rest[..pos], Some(&rest[pos..])),
        None => (rest, None),
    };

    let mechanism = match name.to_ascii_lowercase().as_str() {
        "all" => match arg {
            None => Mechanism::All,
            Some(_) => return Err(err("all takes no argument")),
        },
        "include" => Mechanism::Include(domain_spec("include", arg).map_err(|reason| err(&reason))?),
        "exists" => Mechanism::Exists(domain_spec("exists", arg).map_err(|reason| err(&reason))?),
        "a" => Mechanism::A(host_with_cidr(arg).map_err(|reason| err(&reason))?),
        "mx" => Mechanism::Mx(host_with_cidr(arg).map_err(|reason| err(&reason))?),
        "ptr" => Mechanism::Ptr(arg.filter(|a| !a.is_empty()).map(str::to_ascii_lowercase)),
        "ip4" => {
            let (addr, prefix) = split_prefix(arg.ok_or_else(|| err("ip4 requires an address"))?);
            let addr: Ipv4Addr = addr.parse().map_err(|_| err("invalid IPv4 address"))?;
            Mechanism::Ip4(addr, parse_cidr(prefix, 32).map_err(|reason| err(&reason))?)
        }
        "ip6" => {
            let (addr, prefix) = split_prefix(arg.ok_or_else(|| err("ip6 requires an address"))?);
            let addr: Ipv6Addr = addr.parse().map_err(|_| err("invalid IPv6 address"))?;
            Mechanism::Ip6(addr, parse_cidr(prefix, 128).map_err(|reason| err(&reason))?)
        }
        "" => return Err(err("empty mechanism")),
        _ => return Err(err("unknown mechanism")),
    };

    Ok(Directive {
        qualifier,
        mechanism,
    })
}

fn domain_spec(mechanism: &str, arg: Option<&str>) -> Result<String, String> {
    match arg.filter(|a| !a.is_empty() && !a.starts_with('/')) {
        None => Err(format!("{mechanism} requires a domain")),
        Some(domain) if is_domain_spec(domain) => Ok(domain.to_ascii_lowercase()),
        Some(domain) => Err(format!("invalid domain '{domain}'")),
    }
}

/// Hostname syntax, or a macro string left for the walker to report.
fn is_domain_spec(name: &str) -> bool {
    name.contains('%') || is_valid_hostname(name)
}

fn split_prefix(arg: &str) -> (&str, Option<&str>) {
    match arg.rsplit_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (arg, None),
    }
}

fn parse_cidr(prefix: Option<&str>, max: u8) -> Result<Option<u8>, String> {
    let Some(prefix) = prefix else {
        return Ok(None);
    };
    match prefix.parse::<u8>() {
        Ok(len) if len <= max => Ok(Some(len)),
        Ok(len) => Err(format!("CIDR length /{len} exceeds {max}")),
        Err(_) => Err(format!("invalid CIDR length '{prefix}'")),
    }
}

/// `a`/`mx` argument: optional host, then `/cidr4`, then `//cidr6`.
fn host_with_cidr(arg: Option<&str>) -> Result<Option<String>, String> {
    let Some(arg) = arg else {
        return Ok(None);
    };
    let (rest, cidr6) = match arg.split_once("//") {
        Some((rest, v6)) => (rest, Some(v6)),
        None => (arg, None),
    };
    parse_cidr(cidr6, 128)?;
    let (host, cidr4) = match rest.split_once('/') {
        Some((host, v4)) => (host, Some(v4)),
        None => (rest, None),
    };
    parse_cidr(cidr4, 32)?;
    if host.is_empty() {
        return Ok(None);
    }
    if !is_domain_spec(host) {
        return Err(format!("invalid domain '{host}'"));
    }
    Ok(Some(host.to_ascii_lowercase()))
}
