//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

/// Builds the resolver used for live scans.
///
/// `timeout` is the per-query limit from [`ScanOptions::dns_timeout`](crate::ScanOptions),
/// so hickory never gives up before the gateway does.
pub fn init_resolver(timeout: Duration) -> Arc<TokioAsyncResolver> {
    Arc::new(TokioAsyncResolver::tokio(
        ResolverConfig::default(),
        resolver_opts(timeout),
    ))
}

/// Retries are owned by the scan's DNS gateway, so hickory makes a single attempt
/// per query. `ndots = 0` keeps search domains from being appended to names such
/// as `_dmarc.example.com`.
fn resolver_opts(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.ndots = 0;
    opts
}
