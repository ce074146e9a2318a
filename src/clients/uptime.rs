//! Uptime probe that fetches a known-good URL through the proxy itself.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Proxy};

use crate::interfaces::proxy_provider::Result;
use crate::interfaces::{ClientError, ProbeOutcome, UptimeProbe};
use crate::model::ProxyCredential;

pub struct HttpUptimeProbe {
    target_url: String,
    timeout: Duration,
}

impl HttpUptimeProbe {
    pub fn new(target_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target_url: target_url.into(),
            timeout,
        }
    }

    fn client_for(&self, credential: &ProxyCredential) -> Result<Client> {
        let proxy = Proxy::all(format!("http://{}:{}", credential.host, credential.port))?
            .basic_auth(&credential.username, &credential.password);
        Ok(Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .build()?)
    }
}

#[async_trait]
impl UptimeProbe for HttpUptimeProbe {
    async fn probe(&self, credential: &ProxyCredential) -> Result<ProbeOutcome> {
        let client = self.client_for(credential)?;

        let started = Instant::now();
        let response = client.get(&self.target_url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout)
            } else {
                ClientError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Response(format!("probe status {}", status)));
        }
        Ok(ProbeOutcome {
            latency: started.elapsed(),
        })
    }
}
