//! HTTP server and job scheduling configuration types.

use std::time::Duration;

use serde::Deserialize;

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port for the REST API.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Intervals of the periodic jobs, in seconds. Zero disables a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Run the scheduler inside the server process.
    pub enabled: bool,
    pub expire_orders_secs: u64,
    pub release_earnings_secs: u64,
    pub sample_uptime_secs: u64,
    pub evaluate_sla_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            expire_orders_secs: 300,
            release_earnings_secs: 3600,
            sample_uptime_secs: 300,
            evaluate_sla_secs: 3600,
        }
    }
}

impl JobsConfig {
    /// Interval for a job name, `None` if unknown or disabled.
    pub fn interval(&self, job: &str) -> Option<Duration> {
        let secs = match job {
            "expire-orders" => self.expire_orders_secs,
            "release-earnings" => self.release_earnings_secs,
            "sample-uptime" => self.sample_uptime_secs,
            "evaluate-sla" => self.evaluate_sla_secs,
            _ => return None,
        };
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}
