//! Abstract interfaces for proxyhub components.
//!
//! These traits define the contracts for:
//! - Account storage (identity, role, referral code)
//! - Ledger storage (atomic postings, idempotency)
//! - Order and catalogue storage
//! - Referral links and earnings
//! - SLA configuration, uptime samples and credits
//! - Key/value settings
//! - Outbound collaborators (proxy reseller, uptime probe)

pub mod account_store;
pub mod catalog_store;
pub mod ledger_store;
pub mod order_store;
pub mod proxy_provider;
pub mod referral_store;
pub mod settings_store;
pub mod sla_store;
pub mod uptime_probe;

pub use account_store::AccountStore;
pub use catalog_store::CatalogStore;
pub use ledger_store::{Attachment, LedgerStore, NewEntry, Posting, Receipt};
pub use order_store::OrderStore;
pub use proxy_provider::{
    Allocation, AllocationOutcome, AllocationRequest, ClientError, ProxyProvider,
};
pub use referral_store::ReferralStore;
pub use settings_store::SettingsStore;
pub use sla_store::SlaStore;
pub use uptime_probe::{ProbeOutcome, UptimeProbe};

use rust_decimal::Decimal;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Insufficient funds: available={available}, required={required}")]
    InsufficientFunds { available: Decimal, required: Decimal },

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StorageError::Database(format!("migration failed: {}", err))
    }
}

impl From<uuid::Error> for StorageError {
    fn from(err: uuid::Error) -> Self {
        StorageError::InvalidData(err.to_string())
    }
}

impl From<chrono::ParseError> for StorageError {
    fn from(err: chrono::ParseError) -> Self {
        StorageError::InvalidData(err.to_string())
    }
}

impl From<crate::model::UnknownVariant> for StorageError {
    fn from(err: crate::model::UnknownVariant) -> Self {
        StorageError::InvalidData(err.to_string())
    }
}

/// Every storage port, implemented by one backend.
///
/// Postings touch accounts, orders, referral earnings and SLA credits in a
/// single transaction, so all ports of a deployment share one backend.
pub trait Store:
    AccountStore
    + CatalogStore
    + LedgerStore
    + OrderStore
    + ReferralStore
    + SettingsStore
    + SlaStore
{
}

impl<T> Store for T where
    T: AccountStore
        + CatalogStore
        + LedgerStore
        + OrderStore
        + ReferralStore
        + SettingsStore
        + SlaStore
{
}
