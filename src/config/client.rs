//! Outbound collaborator configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Proxy reseller API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the reseller API.
    pub base_url: String,
    /// Bearer token. Empty means unauthenticated.
    pub api_key: String,
    /// Upper bound for one allocation call.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090/api".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Uptime probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Known-good URL fetched through each sampled proxy.
    pub target_url: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_url: "https://www.google.com/generate_204".to_string(),
        }
    }
}
