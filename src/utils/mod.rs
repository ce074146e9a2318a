//! Utility helpers shared by the services and binaries.

pub mod account_locks;
pub mod bootstrap;
pub mod credentials;
pub mod signature;

pub use account_locks::{AccountGuard, AccountLocks};
