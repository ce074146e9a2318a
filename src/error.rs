//! Service-level error taxonomy.

use rust_decimal::Decimal;

use crate::interfaces::StorageError;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by the services and mapped to HTTP statuses by the REST
/// handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Insufficient funds: available={available}, required={required}")]
    InsufficientFunds { available: Decimal, required: Decimal },

    #[error("Proxy provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation already happened. Callers treat this as success.
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Invalid(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InsufficientFunds {
                available,
                required,
            } => ServiceError::InsufficientFunds {
                available,
                required,
            },
            StorageError::AlreadyProcessed(what) => ServiceError::AlreadyProcessed(what),
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Storage(other),
        }
    }
}
