//! Wallet and ledger operations.
//!
//! Every balance mutation takes the account's lock, then commits exactly one
//! ledger entry through [`LedgerStore::commit`](crate::interfaces::LedgerStore::commit).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::interfaces::{Attachment, Posting, Receipt, Store};
use crate::model::money::round_money;
use crate::model::{Direction, LedgerEntry};
use crate::utils::{AccountGuard, AccountLocks};

use super::require_admin;

/// Round to cents and reject anything that is not strictly positive.
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO {
        return Err(ServiceError::invalid(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(rounded)
}

pub struct LedgerService {
    store: Arc<dyn Store>,
    locks: AccountLocks,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>, locks: AccountLocks) -> Self {
        Self { store, locks }
    }

    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    /// Credit an account. A `reference` makes the credit idempotent.
    pub async fn credit(
        &self,
        account_id: Uuid,
        amount: Decimal,
        reference: Option<String>,
        description: &str,
    ) -> Result<Receipt> {
        let amount = validate_amount(amount)?;
        self.post(Posting::credit(account_id, amount, reference, description))
            .await
    }

    pub async fn debit(
        &self,
        account_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<Receipt> {
        let amount = validate_amount(amount)?;
        self.post(Posting::debit(account_id, amount, None, description))
            .await
    }

    /// Lock the posting's account and commit it.
    pub async fn post(&self, posting: Posting) -> Result<Receipt> {
        let guard = self.locks.lock(posting.entry.account_id).await;
        self.post_locked(&guard, posting).await
    }

    /// Commit a posting while the caller holds the account's lock.
    pub async fn post_locked(&self, guard: &AccountGuard, posting: Posting) -> Result<Receipt> {
        if guard.account_id() != posting.entry.account_id {
            return Err(ServiceError::Internal(format!(
                "posting for {} under lock of {}",
                posting.entry.account_id,
                guard.account_id()
            )));
        }
        Ok(self.store.commit(posting).await?)
    }

    /// Administrative balance correction with an audit row.
    ///
    /// A positive `delta` credits, a negative one debits; the balance still
    /// cannot go below zero.
    pub async fn adjust(
        &self,
        admin_id: Uuid,
        account_id: Uuid,
        delta: Decimal,
        reason: &str,
    ) -> Result<Receipt> {
        require_admin(self.store.as_ref(), admin_id).await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::invalid("adjustment reason is required"));
        }
        let direction = if delta.is_sign_negative() {
            Direction::Debit
        } else {
            Direction::Credit
        };
        let amount = validate_amount(delta.abs())?;

        let posting = Posting::new(
            account_id,
            direction,
            amount,
            None,
            format!("Admin adjustment: {}", reason),
        )
        .with(Attachment::Audit {
            admin_id,
            reason: reason.to_string(),
        });

        let receipt = self.post(posting).await?;
        info!(
            %admin_id,
            %account_id,
            %delta,
            balance = %receipt.balance,
            "Balance adjusted"
        );
        Ok(receipt)
    }

    pub async fn balance(&self, account_id: Uuid) -> Result<Decimal> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("account {}", account_id)))?;
        Ok(account.balance)
    }

    /// Ledger entries of an account, oldest first.
    pub async fn statement(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        self.balance(account_id).await?;
        Ok(self.store.entries(account_id).await?)
    }

    /// Recompute the balance from the ledger and compare with the cached one.
    pub async fn verify(&self, account_id: Uuid) -> Result<Decimal> {
        let cached = self.balance(account_id).await?;
        let computed: Decimal = self
            .store
            .entries(account_id)
            .await?
            .iter()
            .map(|e| e.direction.signed(e.amount))
            .sum();

        if computed != cached {
            error!(%account_id, %cached, %computed, "Balance does not match ledger");
            return Err(ServiceError::Internal(format!(
                "balance mismatch for {}: cached {}, ledger {}",
                account_id, cached, computed
            )));
        }
        Ok(cached)
    }
}
