//! HTTP client for the proxy reseller API.
//!
//! `POST {base_url}/subusers/{subuser}/allocations` with a JSON body; the
//! reseller answers with the gateway the allocation is reachable through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::interfaces::{
    Allocation, AllocationOutcome, AllocationRequest, ClientError, ProxyProvider,
};
use crate::interfaces::proxy_provider::Result;

/// Reseller client configuration.
#[derive(Debug, Clone)]
pub struct ResellerConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ResellerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&ProviderConfig> for ResellerConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self::new(config.base_url.clone())
            .with_api_key(config.api_key.clone())
            .with_timeout(config.timeout())
    }
}

#[derive(Serialize)]
struct AllocateBody<'a> {
    allocation_id: &'a str,
    proxy_type: &'a str,
    amount: u64,
}

#[derive(Deserialize)]
struct AllocateResponse {
    host: String,
    port: u16,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Reseller API client.
pub struct ResellerClient {
    client: Client,
    config: ResellerConfig,
}

impl ResellerClient {
    pub fn new(config: ResellerConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ClientError::Config("reseller base_url not configured".to_string()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn allocations_url(&self, subuser: &str) -> String {
        format!(
            "{}/subusers/{}/allocations",
            self.config.base_url.trim_end_matches('/'),
            subuser
        )
    }

    /// Statuses that mean "the reseller refused", as opposed to "the
    /// reseller is broken".
    fn is_rejection(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_REQUEST
                | StatusCode::PAYMENT_REQUIRED
                | StatusCode::CONFLICT
                | StatusCode::UNPROCESSABLE_ENTITY
        )
    }
}

#[async_trait]
impl ProxyProvider for ResellerClient {
    async fn allocate(&self, request: &AllocationRequest) -> Result<AllocationOutcome> {
        let url = self.allocations_url(&request.subuser);
        let body = AllocateBody {
            allocation_id: &request.allocation_id,
            proxy_type: &request.proxy_type,
            amount: request.amount,
        };

        let mut builder = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.config.timeout)
            } else {
                ClientError::Http(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            let allocated: AllocateResponse = response
                .json()
                .await
                .map_err(|e| ClientError::Response(format!("bad allocation body: {}", e)))?;
            debug!(
                subuser = %request.subuser,
                host = %allocated.host,
                port = allocated.port,
                "Allocation accepted"
            );
            return Ok(AllocationOutcome::Allocated(Allocation {
                host: allocated.host,
                port: allocated.port,
            }));
        }

        let text = response.text().await.unwrap_or_default();
        if Self::is_rejection(status) {
            let parsed: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let reason = parsed
                .error
                .or(parsed.message)
                .unwrap_or_else(|| format!("rejected with status {}", status));
            warn!(subuser = %request.subuser, status = %status, reason = %reason, "Allocation rejected");
            return Ok(AllocationOutcome::Rejected(reason));
        }

        Err(ClientError::Response(format!("status {}: {}", status, text)))
    }
}
