//! Proxy order fulfillment.
//!
//! A purchase holds the buyer's account lock from the balance re-check until
//! the order posting commits, so a concurrent purchase can never spend the
//! same money. Nothing is written until the reseller has allocated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::OrdersConfig;
use crate::error::{Result, ServiceError};
use crate::interfaces::{
    Allocation, AllocationOutcome, AllocationRequest, Attachment, Posting, ProxyProvider, Store,
};
use crate::model::money::round_money;
use crate::model::{Account, Order, OrderStatus, Product, ProxyCredential};
use crate::utils::credentials::generate_secret;

use super::ledger::LedgerService;
use super::referral::ReferralService;
use super::settings::{self, Settings};

#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub account_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub geo: Option<String>,
}

/// A fulfilled order.
#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub order: Order,
    pub credentials: Vec<ProxyCredential>,
    /// Buyer's balance after the debit.
    pub balance: Decimal,
}

#[derive(Clone)]
pub struct FulfillmentService {
    store: Arc<dyn Store>,
    ledger: Arc<LedgerService>,
    provider: Arc<dyn ProxyProvider>,
    referral: Arc<ReferralService>,
    settings: Arc<dyn Settings>,
    config: OrdersConfig,
    provider_timeout: Duration,
}

impl FulfillmentService {
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<LedgerService>,
        provider: Arc<dyn ProxyProvider>,
        referral: Arc<ReferralService>,
        settings: Arc<dyn Settings>,
        config: OrdersConfig,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            provider,
            referral,
            settings,
            config,
            provider_timeout,
        }
    }

    pub async fn purchase(&self, request: PurchaseRequest) -> Result<Purchase> {
        if request.quantity == 0 || request.quantity > self.config.max_quantity {
            return Err(ServiceError::invalid(format!(
                "quantity must be between 1 and {}, got {}",
                self.config.max_quantity, request.quantity
            )));
        }

        let product = self
            .store
            .get_product(request.product_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| ServiceError::not_found(format!("product {}", request.product_id)))?;

        let total_cost = round_money(product.unit_price * Decimal::from(request.quantity));

        // Unlocked pre-check; the authoritative one happens under the lock.
        let account = self.load_buyer(request.account_id).await?;
        ensure_funds(&account, total_cost)?;

        // Runs detached from the caller: once the reseller has allocated, the
        // order is recorded even if the request future is dropped.
        let service = self.clone();
        tokio::spawn(async move { service.checkout(request, product, total_cost).await })
            .await
            .map_err(|e| ServiceError::Internal(format!("purchase task failed: {}", e)))?
    }

    /// Locked part of a purchase: re-check, allocate, commit, award.
    async fn checkout(
        &self,
        request: PurchaseRequest,
        product: Product,
        total_cost: Decimal,
    ) -> Result<Purchase> {
        let guard = self.ledger.locks().lock(request.account_id).await;
        let account = self.load_buyer(request.account_id).await?;
        ensure_funds(&account, total_cost)?;

        let allocation = self.allocate(&account, &product, request.quantity).await?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            account_id: account.id,
            product_id: product.id,
            proxy_type: product.proxy_type.clone(),
            quantity: request.quantity,
            total_cost,
            status: OrderStatus::Active,
            expires_at: now + chrono::Duration::days(i64::from(self.config.validity_days)),
            created_at: now,
        };
        let credentials = issue_credentials(&order, &account, &allocation, request.geo.as_deref());

        let posting = Posting::debit(
            account.id,
            total_cost,
            Some(format!("order:{}", order.id)),
            format!("Order: {} x{}", product.name, request.quantity),
        )
        .with(Attachment::CreateOrder {
            order: order.clone(),
            credentials: credentials.clone(),
        });

        let receipt = match self.ledger.post_locked(&guard, posting).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(
                    reconciliation_required = true,
                    account_id = %account.id,
                    order_id = %order.id,
                    product_id = %product.id,
                    allocation_id = %product.allocation_id,
                    amount = %total_cost,
                    error = %e,
                    "Proxies allocated but order was not recorded"
                );
                return Err(e);
            }
        };
        drop(guard);

        info!(
            account_id = %account.id,
            order_id = %order.id,
            quantity = order.quantity,
            amount = %total_cost,
            balance = %receipt.balance,
            "Order fulfilled"
        );

        if self
            .settings
            .get_bool(settings::REFERRAL_ON_PURCHASE, false)
            .await
        {
            self.referral
                .award(account.id, total_cost, &format!("Purchase {}", order.id))
                .await;
        }

        Ok(Purchase {
            order,
            credentials,
            balance: receipt.balance,
        })
    }

    async fn load_buyer(&self, account_id: Uuid) -> Result<Account> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("account {}", account_id)))?;
        if account.is_banned() {
            return Err(ServiceError::forbidden(format!(
                "account {} is banned",
                account_id
            )));
        }
        Ok(account)
    }

    /// Reserve capacity at the reseller. Every failure mode is reported as
    /// `ProviderUnavailable`.
    async fn allocate(
        &self,
        account: &Account,
        product: &Product,
        quantity: u32,
    ) -> Result<Allocation> {
        let request = AllocationRequest {
            subuser: account.subuser(),
            allocation_id: product.allocation_id.clone(),
            proxy_type: product.proxy_type.clone(),
            amount: u64::from(quantity) * u64::from(product.unit_size),
        };

        let outcome =
            tokio::time::timeout(self.provider_timeout, self.provider.allocate(&request)).await;

        let reason = match outcome {
            Ok(Ok(AllocationOutcome::Allocated(allocation))) => return Ok(allocation),
            Ok(Ok(AllocationOutcome::Rejected(reason))) => format!("rejected: {}", reason),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.provider_timeout),
        };

        error!(
            account_id = %account.id,
            subuser = %request.subuser,
            allocation_id = %request.allocation_id,
            proxy_type = %request.proxy_type,
            amount = request.amount,
            reason = %reason,
            "Proxy allocation failed"
        );
        Err(ServiceError::ProviderUnavailable(reason))
    }

    /// Mark active orders past their expiry as expired.
    pub async fn expire_orders(&self, now: DateTime<Utc>) -> Result<u64> {
        let expired = self.store.expire_due(now).await?;
        if expired > 0 {
            info!(expired, "Orders expired");
        }
        Ok(expired)
    }

    pub async fn orders(&self, account_id: Uuid) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_account(account_id).await?)
    }

    pub async fn credentials(&self, order_id: Uuid) -> Result<Vec<ProxyCredential>> {
        if self.store.get_order(order_id).await?.is_none() {
            warn!(%order_id, "Credentials requested for unknown order");
            return Err(ServiceError::not_found(format!("order {}", order_id)));
        }
        Ok(self.store.credentials(order_id).await?)
    }
}

fn ensure_funds(account: &Account, required: Decimal) -> Result<()> {
    if account.balance < required {
        return Err(ServiceError::InsufficientFunds {
            available: account.balance,
            required,
        });
    }
    Ok(())
}

/// One login per purchased unit, all on the allocated gateway.
fn issue_credentials(
    order: &Order,
    account: &Account,
    allocation: &Allocation,
    geo: Option<&str>,
) -> Vec<ProxyCredential> {
    let geo = geo.map(str::trim).filter(|g| !g.is_empty()).map(str::to_string);
    (0..order.quantity)
        .map(|_| ProxyCredential {
            id: Uuid::new_v4(),
            order_id: order.id,
            host: allocation.host.clone(),
            port: allocation.port,
            username: account.subuser(),
            password: generate_secret(),
            geo: geo.clone(),
        })
        .collect()
}
