use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Referral relationship, at most one per referred account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralLink {
    pub referred_id: Uuid,
    pub referrer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// `Pending -> Completed`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarningStatus {
    Pending,
    Completed,
}

string_enum!(EarningStatus, "earning status", {
    Pending => "pending",
    Completed => "completed",
});

/// Commission owed to a referrer.
///
/// While pending it is a liability only; no ledger entry exists for it until
/// the release sweep credits the referrer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralEarning {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    pub amount: Decimal,
    pub status: EarningStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
