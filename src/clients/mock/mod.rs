//! Scripted collaborators for testing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::proxy_provider::Result;
use crate::interfaces::{
    Allocation, AllocationOutcome, AllocationRequest, ClientError, ProbeOutcome, ProxyProvider,
    UptimeProbe,
};
use crate::model::ProxyCredential;

/// What the mock reseller does on the next calls.
#[derive(Debug, Clone)]
pub enum MockAllocation {
    Allocate(Allocation),
    Reject(String),
    Fail(String),
}

/// Mock proxy reseller.
pub struct MockProxyProvider {
    behaviour: RwLock<MockAllocation>,
    delay: RwLock<Option<Duration>>,
    requests: RwLock<Vec<AllocationRequest>>,
}

impl Default for MockProxyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProxyProvider {
    /// Accepts every allocation on `gw.mock.test:8000`.
    pub fn new() -> Self {
        Self {
            behaviour: RwLock::new(MockAllocation::Allocate(Allocation {
                host: "gw.mock.test".to_string(),
                port: 8000,
            })),
            delay: RwLock::new(None),
            requests: RwLock::new(Vec::new()),
        }
    }

    pub async fn set_behaviour(&self, behaviour: MockAllocation) {
        *self.behaviour.write().await = behaviour;
    }

    /// Sleep this long before answering.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn requests(&self) -> Vec<AllocationRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ProxyProvider for MockProxyProvider {
    async fn allocate(&self, request: &AllocationRequest) -> Result<AllocationOutcome> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.behaviour.read().await.clone() {
            MockAllocation::Allocate(allocation) => Ok(AllocationOutcome::Allocated(allocation)),
            MockAllocation::Reject(reason) => Ok(AllocationOutcome::Rejected(reason)),
            MockAllocation::Fail(message) => Err(ClientError::Response(message)),
        }
    }
}

/// Mock uptime probe. Answers per host, defaulting to a fast success.
pub struct MockUptimeProbe {
    default_latency: Duration,
    hosts: RwLock<HashMap<String, Option<Duration>>>,
    probes: RwLock<usize>,
}

impl Default for MockUptimeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUptimeProbe {
    pub fn new() -> Self {
        Self {
            default_latency: Duration::from_millis(50),
            hosts: RwLock::new(HashMap::new()),
            probes: RwLock::new(0),
        }
    }

    /// Probes through `host` succeed after `latency`.
    pub async fn set_latency(&self, host: &str, latency: Duration) {
        self.hosts
            .write()
            .await
            .insert(host.to_string(), Some(latency));
    }

    /// Probes through `host` fail.
    pub async fn set_down(&self, host: &str) {
        self.hosts.write().await.insert(host.to_string(), None);
    }

    pub async fn probe_count(&self) -> usize {
        *self.probes.read().await
    }
}

#[async_trait]
impl UptimeProbe for MockUptimeProbe {
    async fn probe(&self, credential: &ProxyCredential) -> Result<ProbeOutcome> {
        *self.probes.write().await += 1;

        let scripted = self.hosts.read().await.get(&credential.host).cloned();
        match scripted {
            Some(None) => Err(ClientError::Response(format!(
                "mock proxy {} is down",
                credential.host
            ))),
            Some(Some(latency)) => Ok(ProbeOutcome { latency }),
            None => Ok(ProbeOutcome {
                latency: self.default_latency,
            }),
        }
    }
}
