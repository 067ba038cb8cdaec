//! Resolver seam and the `hickory-resolver` implementation.

use std::future::Future;
use std::sync::Arc;

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType as HickoryRecordType};
use hickory_resolver::TokioAsyncResolver;

use super::records::{DnsError, DnsRecord, RecordType};

/// Issues a single DNS query. Retries, timeouts and caching belong to the gateway.
///
/// An empty `Ok` vector means the name exists but has no records of that type.
pub trait DnsResolver: Clone + Send + Sync + 'static {
    fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> impl Future<Output = Result<Vec<DnsRecord>, DnsError>> + Send;
}

/// Production resolver backed by `hickory-resolver`.
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryResolver {
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

impl From<RecordType> for HickoryRecordType {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Mx => HickoryRecordType::MX,
            RecordType::A => HickoryRecordType::A,
            RecordType::Aaaa => HickoryRecordType::AAAA,
            RecordType::Txt => HickoryRecordType::TXT,
        }
    }
}

impl DnsResolver for HickoryResolver {
    async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        // Fully qualified so search domains are never appended
        let fqdn = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{name}.")
        };
        match self.resolver.lookup(fqdn.as_str(), record_type.into()).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .filter_map(|rdata| convert_rdata(record_type, rdata))
                .collect()),
            Err(e) => match classify_error(&e) {
                Some(err) => Err(err),
                None => Ok(Vec::new()),
            },
        }
    }
}

/// Keeps only answers of the queried type; CNAME links in the chain are dropped.
fn convert_rdata(record_type: RecordType, rdata: &RData) -> Option<DnsRecord> {
    match (record_type, rdata) {
        (RecordType::Mx, RData::MX(mx)) => Some(DnsRecord::Mx {
            preference: mx.preference(),
            exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
        }),
        (RecordType::A, RData::A(a)) => Some(DnsRecord::A(a.0)),
        (RecordType::Aaaa, RData::AAAA(aaaa)) => Some(DnsRecord::Aaaa(aaaa.0)),
        (RecordType::Txt, RData::TXT(txt)) => Some(DnsRecord::Txt(
            txt.txt_data()
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(""),
        )),
        _ => None,
    }
}

/// Maps a hickory error onto [`DnsError`]. `None` means NOERROR with no data.
fn classify_error(e: &ResolveError) -> Option<DnsError> {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NoError => None,
            ResponseCode::NXDomain => Some(DnsError::NxDomain),
            ResponseCode::ServFail => Some(DnsError::ServFail),
            other => Some(DnsError::Other(format!("response code {other}"))),
        },
        ResolveErrorKind::Timeout => Some(DnsError::Timeout),
        ResolveErrorKind::Proto(proto) => {
            let msg = proto.to_string();
            let lower = msg.to_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                Some(DnsError::Timeout)
            } else if lower.contains("io error") || lower.contains("connection") {
                Some(DnsError::Other(msg))
            } else {
                Some(DnsError::Malformed(msg))
            }
        }
        _ => Some(DnsError::Other(e.to_string())),
    }
}
