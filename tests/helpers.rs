// Shared builders for integration tests.
//
// Every test runs against MockResolver; nothing here touches live DNS.

#![allow(dead_code)] // Each test file uses a different subset

use std::net::Ipv4Addr;

use base64::Engine;
use mail_posture::{Assessor, MockResolver, ScanOptions};

pub const DOMAIN: &str = "example.com";

/// Base64 `SubjectPublicKeyInfo` for an RSA key with a `bits`-bit modulus.
///
/// The modulus is filler; only its length matters to the scorer.
pub fn rsa_key_b64(bits: usize) -> String {
    fn der_len(n: usize) -> Vec<u8> {
        match n {
            0..=127 => vec![n as u8],
            128..=255 => vec![0x81, n as u8],
            _ => vec![0x82, (n >> 8) as u8, n as u8],
        }
    }
    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend(der_len(body.len()));
        out.extend_from_slice(body);
        out
    }

    let mut modulus = vec![0x00, 0x80];
    modulus.resize(bits / 8 + 1, 0x5A);
    let public_key = tlv(
        0x30,
        &[tlv(0x02, &modulus), tlv(0x02, &[0x01, 0x00, 0x01])].concat(),
    );
    let mut bit_string = vec![0x00];
    bit_string.extend(public_key);
    // rsaEncryption OID, NULL parameters
    let algorithm = tlv(
        0x30,
        &[
            tlv(0x06, &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01]),
            vec![0x05, 0x00],
        ]
        .concat(),
    );
    let spki = tlv(0x30, &[algorithm, tlv(0x03, &bit_string)].concat());
    base64::engine::general_purpose::STANDARD.encode(spki)
}

pub fn add_dkim(mock: &MockResolver, domain: &str, selector: &str, bits: usize) {
    mock.add_txt(
        &format!("{selector}._domainkey.{domain}"),
        &format!("v=DKIM1; k=rsa; p={}", rsa_key_b64(bits)),
    );
}

/// Publishes a resolvable mail host as the domain's only MX.
pub fn add_mail_host(mock: &MockResolver, domain: &str, host: &str) {
    mock.add_mx(domain, 0, host);
    mock.add_a(host, Ipv4Addr::new(192, 0, 2, 25));
}

/// A domain hosted on Microsoft 365 with every control configured strictly.
pub fn microsoft365_domain() -> MockResolver {
    let mock = MockResolver::new();
    add_mail_host(&mock, DOMAIN, "example-com.mail.protection.outlook.com");
    mock.add_txt(DOMAIN, "v=spf1 include:spf.protection.outlook.com -all");
    mock.add_txt(
        "spf.protection.outlook.com",
        "v=spf1 ip4:40.92.0.0/15 ip4:40.107.0.0/16 ip6:2a01:111:f400::/48 -all",
    );
    mock.add_txt(
        &format!("_dmarc.{DOMAIN}"),
        "v=DMARC1; p=reject; pct=100; rua=mailto:x@y.com",
    );
    add_dkim(&mock, DOMAIN, "selector1", 2048);
    add_dkim(&mock, DOMAIN, "selector2", 2048);
    mock
}

/// A domain with valid MX, SPF and DKIM but the given DMARC record (or none).
pub fn domain_with_dmarc(dmarc: Option<&str>) -> MockResolver {
    let mock = MockResolver::new();
    add_mail_host(&mock, DOMAIN, "mx1.example.com");
    mock.add_txt(DOMAIN, "v=spf1 ip4:192.0.2.0/24 -all");
    add_dkim(&mock, DOMAIN, "default", 2048);
    add_dkim(&mock, DOMAIN, "mail", 2048);
    if let Some(record) = dmarc {
        mock.add_txt(&format!("_dmarc.{DOMAIN}"), record);
    }
    mock
}

pub fn assessor(mock: &MockResolver) -> Assessor<MockResolver> {
    Assessor::new(mock.clone(), ScanOptions::default())
}
