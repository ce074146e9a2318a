use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

string_enum!(Direction, "direction", {
    Credit => "credit",
    Debit => "debit",
});

impl Direction {
    /// Signed effect of `amount` on a balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }
}

/// Immutable record of one balance-affecting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub direction: Direction,
    /// Always positive; `direction` carries the sign.
    pub amount: Decimal,
    /// Idempotency key. Unique across the ledger when present.
    pub reference: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An applied payment-provider notification.
///
/// The existence of a row for `(provider, event_id)` means the event has been
/// credited and must not be credited again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub provider: String,
    pub event_id: String,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub received_at: DateTime<Utc>,
}
