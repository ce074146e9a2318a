//! Ledger storage interface.
//!
//! Every balance change is a [`Posting`]: exactly one ledger entry plus the
//! rows that must commit with it. A posting is applied atomically or not at
//! all, and the account balance moves by exactly the entry's signed amount.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::Result;
use crate::model::{BalanceAudit, Direction, LedgerEntry, Order, ProxyCredential, WebhookEvent};

/// The ledger entry of a posting. Id and timestamp are assigned on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub account_id: Uuid,
    pub direction: Direction,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub description: String,
}

/// Rows written in the same transaction as the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// Idempotency row for a payment notification.
    /// Aborts with `AlreadyProcessed` if `(provider, event_id)` exists.
    RecordWebhook(WebhookEvent),
    /// A fulfilled order and its credentials.
    CreateOrder {
        order: Order,
        credentials: Vec<ProxyCredential>,
    },
    /// Claim a pending referral earning and mark it completed.
    /// Aborts with `AlreadyProcessed` unless the earning is pending.
    ReleaseEarning(Uuid),
    /// Mark an approved SLA credit as applied.
    /// Aborts with `AlreadyProcessed` unless the credit is approved.
    ApplySlaCredit(Uuid),
    /// Audit row for an administrative correction. Balances before and after
    /// are captured inside the transaction.
    Audit { admin_id: Uuid, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub entry: NewEntry,
    pub attachments: Vec<Attachment>,
}

impl Posting {
    pub fn credit(
        account_id: Uuid,
        amount: Decimal,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(account_id, Direction::Credit, amount, reference, description)
    }

    pub fn debit(
        account_id: Uuid,
        amount: Decimal,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(account_id, Direction::Debit, amount, reference, description)
    }

    pub fn new(
        account_id: Uuid,
        direction: Direction,
        amount: Decimal,
        reference: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            entry: NewEntry {
                account_id,
                direction,
                amount,
                reference,
                description: description.into(),
            },
            attachments: Vec::new(),
        }
    }

    /// Attach a row to this posting.
    pub fn with(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Result of a committed posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub entry: LedgerEntry,
    /// Account balance after the posting.
    pub balance: Decimal,
    /// Present when the posting carried an `Audit` attachment.
    pub audit: Option<BalanceAudit>,
}

/// Interface for ledger persistence.
///
/// Implementations:
/// - `SqliteStore`: SQLite storage
/// - `MockStore`: In-memory mock for testing
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Apply a posting atomically.
    ///
    /// Fails, writing nothing, with:
    /// - `NotFound` if the account does not exist
    /// - `InsufficientFunds` if a debit exceeds the balance read inside the
    ///   transaction
    /// - `AlreadyProcessed` if the reference was already posted or an
    ///   attachment's guard does not hold
    async fn commit(&self, posting: Posting) -> Result<Receipt>;

    /// All entries of an account, oldest first.
    async fn entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>>;

    async fn webhook_event(&self, provider: &str, event_id: &str) -> Result<Option<WebhookEvent>>;
}
