//! Referral storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Result;
use crate::model::{ReferralEarning, ReferralLink};

#[async_trait]
pub trait ReferralStore: Send + Sync {
    /// Create a link. `StorageError::Duplicate` if the referred account
    /// already has one.
    async fn insert_link(&self, link: &ReferralLink) -> Result<()>;

    async fn link_for(&self, referred_id: Uuid) -> Result<Option<ReferralLink>>;

    /// Accounts referred by `referrer_id`, oldest first.
    async fn referred_by(&self, referrer_id: Uuid) -> Result<Vec<ReferralLink>>;

    /// Record a pending earning. Does not touch any balance.
    async fn insert_earning(&self, earning: &ReferralEarning) -> Result<()>;

    async fn get_earning(&self, id: Uuid) -> Result<Option<ReferralEarning>>;

    /// Pending earnings with `created_at <= cutoff`, oldest first.
    async fn pending_earnings_before(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<ReferralEarning>>;

    /// Earnings of a referrer, oldest first.
    async fn earnings_for(&self, referrer_id: Uuid) -> Result<Vec<ReferralEarning>>;
}
