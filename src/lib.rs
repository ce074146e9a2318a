//! proxyhub - proxy reselling back office
//!
//! Prepaid wallets with an append-only ledger, proxy order fulfillment
//! through an external reseller, idempotent payment webhooks, referral
//! commissions held in escrow, and SLA credits computed from sampled uptime.

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod interfaces;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
