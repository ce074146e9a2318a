//! Key/value settings storage interface.

use async_trait::async_trait;

use super::Result;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a setting.
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}
