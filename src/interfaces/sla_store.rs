//! SLA storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Result;
use crate::model::{CreditStatus, SlaConfig, SlaCredit, UptimeRecord};

#[async_trait]
pub trait SlaStore: Send + Sync {
    /// Insert or replace the configuration for `config.proxy_type`.
    async fn upsert_config(&self, config: &SlaConfig) -> Result<()>;

    async fn get_config(&self, proxy_type: &str) -> Result<Option<SlaConfig>>;

    /// All configurations ordered by proxy type.
    async fn list_configs(&self) -> Result<Vec<SlaConfig>>;

    /// Append an uptime sample.
    async fn record_uptime(&self, record: &UptimeRecord) -> Result<()>;

    /// Samples with `start <= checked_at < end`, oldest first.
    async fn uptime_between(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UptimeRecord>>;

    /// Insert a credit. Returns `false` without writing if a credit for the
    /// same account, proxy type and window end already exists.
    async fn insert_credit(&self, credit: &SlaCredit) -> Result<bool>;

    async fn get_credit(&self, id: Uuid) -> Result<Option<SlaCredit>>;

    /// Credits, optionally filtered by status, oldest first.
    async fn credits(&self, status: Option<CreditStatus>) -> Result<Vec<SlaCredit>>;

    /// Move a credit from `from` to `to`, recording the reviewer.
    ///
    /// `NotFound` if absent, `AlreadyProcessed` if its status is not `from`.
    async fn transition_credit(
        &self,
        id: Uuid,
        from: CreditStatus,
        to: CreditStatus,
        reviewer: Uuid,
    ) -> Result<SlaCredit>;
}
