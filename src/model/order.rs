use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable proxy package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub proxy_type: String,
    pub unit_price: Decimal,
    /// Amount allocated at the reseller for each purchased unit.
    pub unit_size: u32,
    /// Product identifier on the reseller side.
    pub allocation_id: String,
    pub active: bool,
}

/// Order lifecycle. `Expired` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Active,
    Expired,
    Failed,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Active => "active",
    Expired => "expired",
    Failed => "failed",
});

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Expired | OrderStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub account_id: Uuid,
    pub product_id: Uuid,
    pub proxy_type: String,
    pub quantity: u32,
    pub total_cost: Decimal,
    pub status: OrderStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order was active at some point in `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status != OrderStatus::Failed && self.created_at < end && self.expires_at > start
    }
}

/// Proxy login issued for one unit of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyCredential {
    pub id: Uuid,
    pub order_id: Uuid,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub geo: Option<String>,
}
