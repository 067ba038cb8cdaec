//! In-memory resolver for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::records::{DnsError, DnsRecord, RecordType};
use super::resolver::DnsResolver;

type Key = (String, RecordType);

#[derive(Default)]
struct MockState {
    records: HashMap<Key, Vec<DnsRecord>>,
    nxdomain: HashSet<String>,
    failures: HashMap<Key, DnsError>,
    /// Failures consumed one per query before falling through to the data.
    transient: HashMap<Key, Vec<DnsError>>,
    delays: HashMap<String, Duration>,
    queries: HashMap<Key, usize>,
}

/// Static DNS data with injectable failures, latency and query counters.
///
/// Clones share state, so a test can keep a handle and inspect counters after a scan.
#[derive(Clone, Default)]
pub struct MockResolver {
    state: Arc<Mutex<MockState>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, name: &str, record_type: RecordType, record: DnsRecord) {
        self.state()
            .records
            .entry(key(name, record_type))
            .or_default()
            .push(record);
    }

    pub fn add_txt(&self, name: &str, value: &str) {
        self.push(name, RecordType::Txt, DnsRecord::Txt(value.to_string()));
    }

    pub fn add_mx(&self, name: &str, preference: u16, exchange: &str) {
        self.push(
            name,
            RecordType::Mx,
            DnsRecord::Mx {
                preference,
                exchange: exchange.trim_end_matches('.').to_lowercase(),
            },
        );
    }

    pub fn add_a(&self, name: &str, addr: Ipv4Addr) {
        self.push(name, RecordType::A, DnsRecord::A(addr));
    }

    pub fn add_aaaa(&self, name: &str, addr: Ipv6Addr) {
        self.push(name, RecordType::Aaaa, DnsRecord::Aaaa(addr));
    }

    /// Every query for `name`, whatever the type, answers NXDOMAIN.
    pub fn set_nxdomain(&self, name: &str) {
        self.state().nxdomain.insert(normalize(name));
    }

    /// Every query for `(name, record_type)` fails with `error`.
    pub fn fail(&self, name: &str, record_type: RecordType, error: DnsError) {
        self.state()
            .failures
            .insert(key(name, record_type), error);
    }

    /// The next `times` queries for `(name, record_type)` fail with `error`.
    pub fn fail_times(&self, name: &str, record_type: RecordType, error: DnsError, times: usize) {
        self.state()
            .transient
            .entry(key(name, record_type))
            .or_default()
            .extend(std::iter::repeat(error).take(times));
    }

    /// Queries for `name` wait `delay` before answering.
    pub fn set_delay(&self, name: &str, delay: Duration) {
        self.state().delays.insert(normalize(name), delay);
    }

    /// Number of queries received for `(name, record_type)`.
    pub fn query_count(&self, name: &str, record_type: RecordType) -> usize {
        self.state()
            .queries
            .get(&key(name, record_type))
            .copied()
            .unwrap_or(0)
    }

    /// Number of queries received in total.
    pub fn total_queries(&self) -> usize {
        self.state().queries.values().sum()
    }

    fn answer(&self, name: &str, record_type: RecordType) -> (Option<Duration>, Result<Vec<DnsRecord>, DnsError>) {
        let mut state = self.state();
        let key = key(name, record_type);
        *state.queries.entry(key.clone()).or_insert(0) += 1;
        let delay = state.delays.get(&key.0).copied();

        if let Some(queue) = state.transient.get_mut(&key) {
            if !queue.is_empty() {
                return (delay, Err(queue.remove(0)));
            }
        }
        if let Some(error) = state.failures.get(&key) {
            return (delay, Err(error.clone()));
        }
        if state.nxdomain.contains(&key.0) {
            return (delay, Err(DnsError::NxDomain));
        }
        let records = state.records.get(&key).cloned().unwrap_or_default();
        (delay, Ok(records))
    }
}

impl DnsResolver for MockResolver {
    async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        let (delay, result) = self.answer(name, record_type);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_lowercase()
}

fn key(name: &str, record_type: RecordType) -> Key {
    (normalize(name), record_type)
}
