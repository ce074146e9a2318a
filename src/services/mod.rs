//! Business services.
//!
//! Each service owns one workflow and talks to storage only through the
//! [`Store`] ports. [`App`] wires them together for the binaries and the
//! HTTP surface.

pub mod accounts;
pub mod catalog;
pub mod fulfillment;
pub mod ledger;
pub mod payments;
pub mod referral;
pub mod scheduler;
pub mod settings;
pub mod sla;

pub use accounts::{AccountService, Registration};
pub use catalog::{CatalogService, NewProduct};
pub use fulfillment::{FulfillmentService, Purchase, PurchaseRequest};
pub use ledger::LedgerService;
pub use payments::{PaymentEvent, PaymentService, WebhookOutcome};
pub use referral::{ReferralService, ReferralSummary, SweepReport};
pub use scheduler::{Job, JobOutcome, JobScheduler};
pub use settings::{Settings, StaticSettings, StoreSettings};
pub use sla::{SampleReport, SlaService};

use std::sync::Arc;

use uuid::Uuid;

use crate::clients::{HttpUptimeProbe, ResellerClient, ResellerConfig};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::interfaces::{ClientError, ProxyProvider, Store, UptimeProbe};
use crate::model::Account;
use crate::utils::AccountLocks;

/// Load an account and require the admin role.
pub(crate) async fn require_admin(store: &dyn Store, admin_id: Uuid) -> Result<Account> {
    match store.get_account(admin_id).await? {
        Some(account) if account.is_admin() => Ok(account),
        Some(_) => Err(ServiceError::forbidden(format!(
            "account {} is not an administrator",
            admin_id
        ))),
        None => Err(ServiceError::forbidden(format!(
            "unknown administrator {}",
            admin_id
        ))),
    }
}

/// Every service of a running instance, sharing one store and one set of
/// account locks.
pub struct App {
    pub store: Arc<dyn Store>,
    pub ledger: Arc<LedgerService>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub fulfillment: Arc<FulfillmentService>,
    pub payments: Arc<PaymentService>,
    pub referral: Arc<ReferralService>,
    pub sla: Arc<SlaService>,
    pub scheduler: Arc<JobScheduler>,
}

impl App {
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        provider: Arc<dyn ProxyProvider>,
        probe: Arc<dyn UptimeProbe>,
    ) -> Self {
        let settings: Arc<dyn Settings> = Arc::new(StoreSettings::new(store.clone()));
        Self::with_settings(config, store, settings, provider, probe)
    }

    /// Wire the services with an explicit settings source.
    pub fn with_settings(
        config: &Config,
        store: Arc<dyn Store>,
        settings: Arc<dyn Settings>,
        provider: Arc<dyn ProxyProvider>,
        probe: Arc<dyn UptimeProbe>,
    ) -> Self {
        let ledger = Arc::new(LedgerService::new(store.clone(), AccountLocks::new()));
        let referral = Arc::new(ReferralService::new(
            store.clone(),
            ledger.clone(),
            settings.clone(),
            config.referral.clone(),
        ));
        let fulfillment = Arc::new(FulfillmentService::new(
            store.clone(),
            ledger.clone(),
            provider,
            referral.clone(),
            settings,
            config.orders.clone(),
            config.provider.timeout(),
        ));
        let payments = Arc::new(PaymentService::new(
            store.clone(),
            ledger.clone(),
            referral.clone(),
            config.payments.clone(),
        ));
        let sla = Arc::new(SlaService::new(
            store.clone(),
            ledger.clone(),
            probe,
            config.sla.clone(),
        ));
        let scheduler = Arc::new(JobScheduler::new(
            fulfillment.clone(),
            referral.clone(),
            sla.clone(),
            config.jobs.clone(),
        ));

        Self {
            accounts: Arc::new(AccountService::new(store.clone())),
            catalog: Arc::new(CatalogService::new(store.clone())),
            store,
            ledger,
            fulfillment,
            payments,
            referral,
            sla,
            scheduler,
        }
    }

    /// Wire the services with the HTTP reseller client and uptime probe.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn Store>,
    ) -> std::result::Result<Self, ClientError> {
        let provider = ResellerClient::new(ResellerConfig::from(&config.provider))?;
        let probe = HttpUptimeProbe::new(
            config.probe.target_url.clone(),
            config.sla.probe_timeout(),
        );
        Ok(Self::new(config, store, Arc::new(provider), Arc::new(probe)))
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
