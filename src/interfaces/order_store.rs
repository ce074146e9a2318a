//! Order storage interface.
//!
//! Orders are created only through a ledger posting
//! ([`Attachment::CreateOrder`](super::Attachment::CreateOrder)).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Result;
use crate::model::{Order, ProxyCredential};

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// Orders of an account, newest first.
    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>>;

    async fn credentials(&self, order_id: Uuid) -> Result<Vec<ProxyCredential>>;

    /// Mark every active order with `expires_at <= now` as expired.
    /// Returns the number of orders changed.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Credentials of currently active orders of a proxy type.
    async fn active_credentials(&self, proxy_type: &str) -> Result<Vec<ProxyCredential>>;

    /// Orders of a proxy type that were live at some point in `[start, end)`.
    async fn orders_overlapping(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>>;
}
