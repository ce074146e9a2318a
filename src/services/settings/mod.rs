//! Runtime settings backed by the key/value table.
//!
//! Values are read on every call so operators can change them without a
//! restart. Missing or unparseable values fall back to the caller's default.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::warn;

use crate::interfaces::Store;

pub const REFERRAL_ENABLED: &str = "referral_enabled";
pub const REFERRAL_PERCENTAGE: &str = "referral_percentage";
pub const REFERRAL_HOLD_DAYS: &str = "referral_hold_days";
pub const REFERRAL_ON_PURCHASE: &str = "referral_on_purchase";

/// Read access to runtime settings.
#[async_trait]
pub trait Settings: Send + Sync {
    /// Raw value of a key, `None` if unset or unreadable.
    async fn lookup(&self, key: &str) -> Option<String>;

    async fn get(&self, key: &str, default: &str) -> String {
        self.lookup(key)
            .await
            .unwrap_or_else(|| default.to_string())
    }

    async fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.lookup(key).await {
            Some(value) => parse_bool(&value).unwrap_or_else(|| {
                warn!(key, value = %value, "Setting is not a boolean, using default");
                default
            }),
            None => default,
        }
    }

    async fn get_decimal(&self, key: &str, default: Decimal) -> Decimal {
        match self.lookup(key).await {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %value, "Setting is not a decimal, using default");
                default
            }),
            None => default,
        }
    }

    async fn get_u32(&self, key: &str, default: u32) -> u32 {
        match self.lookup(key).await {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %value, "Setting is not an integer, using default");
                default
            }),
            None => default,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings read from the `settings` table.
pub struct StoreSettings {
    store: Arc<dyn Store>,
}

impl StoreSettings {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Settings for StoreSettings {
    async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.get_setting(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read setting");
                None
            }
        }
    }
}

/// Settings held in memory.
#[derive(Default)]
pub struct StaticSettings {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.into());
    }
}

#[async_trait]
impl Settings for StaticSettings {
    async fn lookup(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }
}
