//! Account registration and administration.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::interfaces::{StorageError, Store};
use crate::model::{Account, ReferralLink, Role};
use crate::utils::credentials::generate_referral_code;

use super::require_admin;

/// Attempts at drawing an unused referral code.
const CODE_ATTEMPTS: usize = 5;

/// Sign-up request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub email: String,
    /// Code of the account that referred this one.
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub registration_ip: Option<String>,
}

pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a client account with a zero balance and link its referrer.
    ///
    /// Unknown referral codes are ignored. A referrer with the same email or
    /// the same registration IP is treated as a self-referral and not linked.
    pub async fn register(&self, registration: Registration) -> Result<Account> {
        let email = normalize_email(&registration.email)?;
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::invalid(format!(
                "email {} is already registered",
                email
            )));
        }
        let registration_ip = registration
            .registration_ip
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());

        let mut account = Account {
            id: Uuid::new_v4(),
            email,
            role: Role::Client,
            balance: Decimal::ZERO,
            referral_code: String::new(),
            referral_rate: None,
            registration_ip,
            created_at: Utc::now(),
        };

        let mut attempts = 0;
        loop {
            account.referral_code = generate_referral_code();
            match self.store.insert_account(&account).await {
                Ok(()) => break,
                Err(StorageError::Duplicate(what)) if attempts + 1 < CODE_ATTEMPTS => {
                    attempts += 1;
                    debug!(%what, attempts, "Referral code taken, retrying");
                }
                Err(StorageError::Duplicate(what)) => {
                    return Err(ServiceError::invalid(format!("cannot register: {}", what)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(account_id = %account.id, "Account registered");

        if let Some(code) = registration.referral_code.as_deref().map(str::trim) {
            if !code.is_empty() {
                self.link_referrer(&account, code).await?;
            }
        }
        Ok(account)
    }

    async fn link_referrer(&self, account: &Account, code: &str) -> Result<()> {
        let Some(referrer) = self.store.find_by_referral_code(code).await? else {
            debug!(account_id = %account.id, code, "Unknown referral code ignored");
            return Ok(());
        };

        if is_self_referral(&referrer, account) {
            warn!(
                account_id = %account.id,
                referrer_id = %referrer.id,
                "Self-referral detected, no link created"
            );
            return Ok(());
        }

        let link = ReferralLink {
            referred_id: account.id,
            referrer_id: referrer.id,
            created_at: Utc::now(),
        };
        match self.store.insert_link(&link).await {
            Ok(()) => {
                info!(account_id = %account.id, referrer_id = %referrer.id, "Referral linked");
                Ok(())
            }
            Err(StorageError::Duplicate(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("account {}", id)))
    }

    pub async fn set_role(&self, admin_id: Uuid, account_id: Uuid, role: Role) -> Result<Account> {
        require_admin(self.store.as_ref(), admin_id).await?;
        if admin_id == account_id && role != Role::Admin {
            return Err(ServiceError::invalid("administrators cannot demote themselves"));
        }
        self.store.set_role(account_id, role).await?;
        info!(%admin_id, %account_id, role = %role, "Account role changed");
        self.get(account_id).await
    }

    /// Soft delete: the account keeps its ledger but can no longer buy.
    pub async fn ban(&self, admin_id: Uuid, account_id: Uuid) -> Result<Account> {
        self.set_role(admin_id, account_id, Role::Banned).await
    }

    /// Set or clear the commission percentage paid to `account_id` as a
    /// referrer.
    pub async fn set_referral_rate(
        &self,
        admin_id: Uuid,
        account_id: Uuid,
        rate: Option<Decimal>,
    ) -> Result<Account> {
        require_admin(self.store.as_ref(), admin_id).await?;
        if let Some(rate) = rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(ServiceError::invalid(format!(
                    "referral rate must be between 0 and 100, got {}",
                    rate
                )));
            }
        }
        self.store.set_referral_rate(account_id, rate).await?;
        info!(%admin_id, %account_id, rate = ?rate, "Referral rate changed");
        self.get(account_id).await
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ServiceError::invalid(format!("invalid email address: {}", email)));
    }
    Ok(email)
}

fn is_self_referral(referrer: &Account, referred: &Account) -> bool {
    if referrer.email.eq_ignore_ascii_case(&referred.email) {
        return true;
    }
    matches!(
        (&referrer.registration_ip, &referred.registration_ip),
        (Some(a), Some(b)) if a == b
    )
}
