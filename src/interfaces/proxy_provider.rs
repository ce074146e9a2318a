//! Proxy reseller interface.
//!
//! The reseller's wire format is vendor-owned; the core only needs
//! "allocate this much of product Z for subuser X".

use async_trait::async_trait;

/// Result type for outbound collaborator calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Account handle at the reseller.
    pub subuser: String,
    /// Reseller product identifier.
    pub allocation_id: String,
    pub proxy_type: String,
    /// Total amount to allocate (`quantity * unit_size`).
    pub amount: u64,
}

/// Gateway the allocated proxies are reachable through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationOutcome {
    Allocated(Allocation),
    Rejected(String),
}

/// Interface to the proxy reseller.
///
/// Implementations:
/// - `ResellerClient`: HTTP/JSON reseller API
/// - `MockProxyProvider`: scripted fake for tests
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Allocate proxy balance. Not idempotent: a call that errors may still
    /// have succeeded remotely.
    async fn allocate(&self, request: &AllocationRequest) -> Result<AllocationOutcome>;
}
