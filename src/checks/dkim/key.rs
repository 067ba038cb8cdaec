//! DKIM key record parsing (RFC 6376 section 3.6.1).

use base64::Engine;
use strum_macros::Display;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::checks::parse_tag_list;
use crate::error_handling::RecordSyntaxError;

/// Ed25519 public keys are exactly 32 bytes.
const ED25519_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum KeyType {
    #[strum(serialize = "RSA")]
    Rsa,
    Ed25519,
}

/// What a `<selector>._domainkey` TXT value publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRecord {
    /// A usable public key
    Key {
        key_type: KeyType,
        bits: u32,
        testing: bool,
    },
    /// `p=` is empty
    Revoked,
    /// `v=DKIM1` with a non-empty `p=` that cannot be decoded
    Malformed {
        testing: bool,
        error: RecordSyntaxError,
    },
}

/// Parses a DKIM key TXT value.
///
/// Returns `None` when the value is not a DKIM key record at all (no `v=DKIM1`
/// or no `p=` tag).
pub fn parse_key_record(txt: &str) -> Option<KeyRecord> {
    let tags = parse_tag_list(txt);
    let get = |name: &str| {
        tags.iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, value)| value.as_str())
    };

    if !get("v").is_some_and(|v| v.eq_ignore_ascii_case("DKIM1")) {
        return None;
    }
    let p = get("p")?;
    if p.is_empty() {
        return Some(KeyRecord::Revoked);
    }

    let testing = get("t").is_some_and(|flags| flags.split(':').any(|f| f.trim() == "y"));

    let key_type = match get("k").map(str::to_ascii_lowercase).as_deref() {
        None | Some("rsa") => KeyType::Rsa,
        Some("ed25519") => KeyType::Ed25519,
        Some(other) => {
            return Some(KeyRecord::Malformed {
                testing,
                error: RecordSyntaxError::new(format!("k={other}"), "unsupported key type"),
            })
        }
    };

    Some(match key_bits(key_type, p) {
        Ok(bits) => KeyRecord::Key {
            key_type,
            bits,
            testing,
        },
        Err(error) => KeyRecord::Malformed { testing, error },
    })
}

fn key_bits(key_type: KeyType, p: &str) -> Result<u32, RecordSyntaxError> {
    let cleaned: String = p.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let fragment = || format!("p={}", truncate(&cleaned));
    let der = base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|e| RecordSyntaxError::new(fragment(), format!("invalid base64: {e}")))?;

    match key_type {
        KeyType::Ed25519 if der.len() == ED25519_KEY_LEN => Ok(256),
        KeyType::Ed25519 => Err(RecordSyntaxError::new(
            fragment(),
            format!("Ed25519 key must be {ED25519_KEY_LEN} bytes, found {}", der.len()),
        )),
        KeyType::Rsa => rsa_modulus_bits(&der)
            .ok_or_else(|| RecordSyntaxError::new(fragment(), "not a valid RSA public key")),
    }
}

/// Bit length of the modulus in a DER `SubjectPublicKeyInfo`.
fn rsa_modulus_bits(der: &[u8]) -> Option<u32> {
    let (_, spki) = SubjectPublicKeyInfo::from_der(der).ok()?;
    let PublicKey::RSA(rsa) = spki.parsed().ok()? else {
        return None;
    };
    let modulus = rsa.modulus;
    let start = modulus.iter().position(|b| *b != 0)?;
    let significant = &modulus[start..];
    let bits = significant.len() as u32 * 8 - significant[0].leading_zeros();
    Some(bits)
}

fn truncate(s: &str) -> String {
    const SHOWN: usize = 16;
    match s.char_indices().nth(SHOWN) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
