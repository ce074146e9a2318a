//! Account storage interface.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::Result;
use crate::model::{Account, BalanceAudit, Role};

/// Interface for account persistence.
///
/// Balances are never written through this interface; they change only
/// through [`LedgerStore::commit`](super::LedgerStore::commit).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account with a zero balance.
    ///
    /// The `balance` field of `account` is ignored. Fails with
    /// `StorageError::Duplicate` if the email or referral code is taken.
    async fn insert_account(&self, account: &Account) -> Result<()>;

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<Account>>;

    /// Change an account's role. `StorageError::NotFound` if absent.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<()>;

    /// Set or clear the custom referral commission percentage.
    async fn set_referral_rate(&self, id: Uuid, rate: Option<Decimal>) -> Result<()>;

    /// Administrative balance corrections for an account, oldest first.
    async fn audits(&self, account_id: Uuid) -> Result<Vec<BalanceAudit>>;
}
