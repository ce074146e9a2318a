//! Billing, referral, order and SLA configuration types.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Payment notification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Shared webhook secret per payment provider name.
    pub providers: HashMap<String, String>,
    /// Maximum age of a signed notification.
    pub tolerance_secs: u64,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            tolerance_secs: 300,
        }
    }
}

impl PaymentsConfig {
    pub fn secret(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Defaults for the referral settings keys.
///
/// The settings table overrides these at runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReferralConfig {
    pub percentage: Decimal,
    pub hold_days: u32,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            percentage: Decimal::TEN,
            hold_days: 14,
        }
    }
}

/// Order limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    pub max_quantity: u32,
    pub validity_days: u32,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            max_quantity: 100,
            validity_days: 30,
        }
    }
}

/// Uptime sampling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlaMonitorConfig {
    /// Credentials probed per proxy type and run.
    pub sample_size: usize,
    pub probe_timeout_secs: u64,
    /// Successful probes slower than this count as degraded.
    pub degraded_after_ms: u64,
}

impl Default for SlaMonitorConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            probe_timeout_secs: 5,
            degraded_after_ms: 3000,
        }
    }
}

impl SlaMonitorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn degraded_after(&self) -> Duration {
        Duration::from_millis(self.degraded_after_ms)
    }
}
