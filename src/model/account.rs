use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Accounts are never deleted; `Banned` is the soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
    Banned,
}

string_enum!(Role, "role", {
    Client => "client",
    Admin => "admin",
    Banned => "banned",
});

/// A customer or operator account.
///
/// `balance` is a cache of the account's ledger and only changes through a
/// ledger posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub balance: Decimal,
    pub referral_code: String,
    /// Custom commission percentage paid to this account as a referrer.
    pub referral_rate: Option<Decimal>,
    pub registration_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_banned(&self) -> bool {
        self.role == Role::Banned
    }

    /// Handle identifying this account at the proxy reseller.
    pub fn subuser(&self) -> String {
        format!("u{}", self.id.simple())
    }
}

/// Audit trail row for an administrative balance correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAudit {
    pub id: Uuid,
    pub account_id: Uuid,
    pub admin_id: Uuid,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
