use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uptime guarantee for one proxy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    pub proxy_type: String,
    /// Guaranteed uptime in percent, e.g. `99.9`.
    pub guaranteed_uptime: Decimal,
    /// Money credited per percentage point of shortfall.
    pub credit_per_percent: Decimal,
    pub measurement_window_hours: u32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UptimeStatus {
    Up,
    Degraded,
    Down,
}

string_enum!(UptimeStatus, "uptime status", {
    Up => "up",
    Degraded => "degraded",
    Down => "down",
});

impl UptimeStatus {
    /// Degraded proxies still served the request.
    pub fn is_available(&self) -> bool {
        matches!(self, UptimeStatus::Up | UptimeStatus::Degraded)
    }
}

/// One probe sample. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeRecord {
    pub id: Uuid,
    pub proxy_type: String,
    pub status: UptimeStatus,
    pub latency_ms: Option<u64>,
    pub checked_at: DateTime<Utc>,
}

/// `Pending -> Approved -> Applied`, or `Pending -> Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Pending,
    Approved,
    Applied,
    Rejected,
}

string_enum!(CreditStatus, "credit status", {
    Pending => "pending",
    Approved => "approved",
    Applied => "applied",
    Rejected => "rejected",
});

/// Proposed compensation for a breached uptime guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCredit {
    pub id: Uuid,
    pub account_id: Uuid,
    pub proxy_type: String,
    pub guaranteed_uptime: Decimal,
    pub actual_uptime: Decimal,
    pub credit_amount: Decimal,
    pub status: CreditStatus,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
