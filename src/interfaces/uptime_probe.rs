//! Uptime probe interface.

use std::time::Duration;

use async_trait::async_trait;

use super::proxy_provider::Result;
use crate::model::ProxyCredential;

/// Successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub latency: Duration,
}

/// Reachability check through a proxy.
///
/// Implementations:
/// - `HttpUptimeProbe`: GET a known-good target through the proxy
/// - `MockUptimeProbe`: scripted fake for tests
#[async_trait]
pub trait UptimeProbe: Send + Sync {
    async fn probe(&self, credential: &ProxyCredential) -> Result<ProbeOutcome>;
}
