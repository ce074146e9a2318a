//! Mock storage implementation for testing.
//!
//! A single in-memory backend implementing every storage port. Postings are
//! validated completely before any row is touched, so a rejected posting
//! leaves the state exactly as it was.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interfaces::{
    AccountStore, Attachment, CatalogStore, LedgerStore, OrderStore, Posting, Receipt,
    ReferralStore, Result, SettingsStore, SlaStore, StorageError,
};
use crate::model::{
    Account, BalanceAudit, CreditStatus, Direction, EarningStatus, LedgerEntry, Order,
    OrderStatus, Product, ProxyCredential, ReferralEarning, ReferralLink, Role, SlaConfig,
    SlaCredit, UptimeRecord, WebhookEvent,
};
use crate::model::money;

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    audits: Vec<BalanceAudit>,
    entries: Vec<LedgerEntry>,
    webhooks: HashMap<(String, String), WebhookEvent>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    credentials: Vec<ProxyCredential>,
    links: HashMap<Uuid, ReferralLink>,
    earnings: Vec<ReferralEarning>,
    sla_configs: BTreeMap<String, SlaConfig>,
    uptime: Vec<UptimeRecord>,
    credits: Vec<SlaCredit>,
    settings: HashMap<String, String>,
}

impl State {
    /// Check every guard of a posting without mutating anything.
    fn validate(&self, posting: &Posting) -> Result<Decimal> {
        let entry = &posting.entry;
        let account = self
            .accounts
            .get(&entry.account_id)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", entry.account_id)))?;

        if entry.amount <= Decimal::ZERO {
            return Err(StorageError::InvalidData(format!(
                "ledger amount must be positive, got {}",
                entry.amount
            )));
        }

        if let Some(reference) = &entry.reference {
            if self
                .entries
                .iter()
                .any(|e| e.reference.as_deref() == Some(reference.as_str()))
            {
                return Err(StorageError::AlreadyProcessed(format!(
                    "reference {}",
                    reference
                )));
            }
        }

        if entry.direction == Direction::Debit && account.balance < entry.amount {
            return Err(StorageError::InsufficientFunds {
                available: account.balance,
                required: entry.amount,
            });
        }

        let new_balance = account.balance + entry.direction.signed(entry.amount);
        if money::to_minor(new_balance).is_none() {
            return Err(StorageError::InvalidData(format!(
                "balance of account {} out of range after {} {}",
                entry.account_id, entry.direction, entry.amount
            )));
        }

        for attachment in &posting.attachments {
            match attachment {
                Attachment::RecordWebhook(event) => {
                    let key = (event.provider.clone(), event.event_id.clone());
                    if self.webhooks.contains_key(&key) {
                        return Err(StorageError::AlreadyProcessed(format!(
                            "webhook {}/{}",
                            event.provider, event.event_id
                        )));
                    }
                }
                Attachment::CreateOrder { order, .. } => {
                    if self.orders.contains_key(&order.id) {
                        return Err(StorageError::Duplicate(format!("order {}", order.id)));
                    }
                }
                Attachment::ReleaseEarning(id) => {
                    let earning = self
                        .earnings
                        .iter()
                        .find(|e| e.id == *id)
                        .ok_or_else(|| StorageError::NotFound(format!("earning {}", id)))?;
                    if earning.status != EarningStatus::Pending {
                        return Err(StorageError::AlreadyProcessed(format!("earning {}", id)));
                    }
                }
                Attachment::ApplySlaCredit(id) => {
                    let credit = self
                        .credits
                        .iter()
                        .find(|c| c.id == *id)
                        .ok_or_else(|| StorageError::NotFound(format!("sla credit {}", id)))?;
                    if credit.status != CreditStatus::Approved {
                        return Err(StorageError::AlreadyProcessed(format!("sla credit {}", id)));
                    }
                }
                Attachment::Audit { .. } => {}
            }
        }

        Ok(account.balance)
    }
}

/// Mock store that keeps everything in memory.
#[derive(Default)]
pub struct MockStore {
    state: RwLock<State>,
    fail_on_commit: RwLock<bool>,
    fail_on_insert_earning: RwLock<bool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `commit` fail with `StorageError::Unavailable`.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.fail_on_commit.write().await = fail;
    }

    /// Make every subsequent `insert_earning` fail with `StorageError::Unavailable`.
    pub async fn set_fail_on_insert_earning(&self, fail: bool) {
        *self.fail_on_insert_earning.write().await = fail;
    }

    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn webhook_count(&self) -> usize {
        self.state.read().await.webhooks.len()
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn credential_count(&self) -> usize {
        self.state.read().await.credentials.len()
    }

    /// Insert an order outside a posting, for tests that only need order rows.
    pub async fn seed_order(&self, order: Order, credentials: Vec<ProxyCredential>) {
        let mut state = self.state.write().await;
        state.orders.insert(order.id, order);
        state.credentials.extend(credentials);
    }
}

#[async_trait]
impl AccountStore for MockStore {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        let mut state = self.state.write().await;
        if state.accounts.contains_key(&account.id)
            || state.accounts.values().any(|a| {
                a.email.eq_ignore_ascii_case(&account.email)
                    || a.referral_code == account.referral_code
            })
        {
            return Err(StorageError::Duplicate(format!("account {}", account.email)));
        }
        let mut account = account.clone();
        account.balance = Decimal::ZERO;
        state.accounts.insert(account.id, account);
        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.referral_code == code)
            .cloned())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", id)))?;
        account.role = role;
        Ok(())
    }

    async fn set_referral_rate(&self, id: Uuid, rate: Option<Decimal>) -> Result<()> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", id)))?;
        account.referral_rate = rate;
        Ok(())
    }

    async fn audits(&self, account_id: Uuid) -> Result<Vec<BalanceAudit>> {
        let state = self.state.read().await;
        Ok(state
            .audits
            .iter()
            .filter(|a| a.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MockStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.contains_key(&product.id) {
            return Err(StorageError::Duplicate(format!("product {}", product.id)));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("product {}", product.id))),
        }
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

#[async_trait]
impl LedgerStore for MockStore {
    async fn commit(&self, posting: Posting) -> Result<Receipt> {
        if *self.fail_on_commit.read().await {
            return Err(StorageError::Unavailable("mock commit failure".to_string()));
        }

        let mut state = self.state.write().await;
        let old_balance = state.validate(&posting)?;
        let now = Utc::now();

        let Posting { entry, attachments } = posting;
        let new_balance = old_balance + entry.direction.signed(entry.amount);

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            account_id: entry.account_id,
            direction: entry.direction,
            amount: entry.amount,
            reference: entry.reference,
            description: entry.description,
            created_at: now,
        };
        if let Some(account) = state.accounts.get_mut(&entry.account_id) {
            account.balance = new_balance;
        }
        state.entries.push(entry.clone());

        let mut audit = None;
        for attachment in attachments {
            match attachment {
                Attachment::RecordWebhook(event) => {
                    state
                        .webhooks
                        .insert((event.provider.clone(), event.event_id.clone()), event);
                }
                Attachment::CreateOrder { order, credentials } => {
                    state.orders.insert(order.id, order);
                    state.credentials.extend(credentials);
                }
                Attachment::ReleaseEarning(id) => {
                    if let Some(earning) = state.earnings.iter_mut().find(|e| e.id == id) {
                        earning.status = EarningStatus::Completed;
                        earning.completed_at = Some(now);
                    }
                }
                Attachment::ApplySlaCredit(id) => {
                    if let Some(credit) = state.credits.iter_mut().find(|c| c.id == id) {
                        credit.status = CreditStatus::Applied;
                    }
                }
                Attachment::Audit { admin_id, reason } => {
                    let row = BalanceAudit {
                        id: Uuid::new_v4(),
                        account_id: entry.account_id,
                        admin_id,
                        old_balance,
                        new_balance,
                        reason,
                        created_at: now,
                    };
                    state.audits.push(row.clone());
                    audit = Some(row);
                }
            }
        }

        Ok(Receipt {
            entry,
            balance: new_balance,
            audit,
        })
    }

    async fn entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .find(|e| e.reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn webhook_event(&self, provider: &str, event_id: &str) -> Result<Option<WebhookEvent>> {
        let state = self.state.read().await;
        Ok(state
            .webhooks
            .get(&(provider.to_string(), event_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl OrderStore for MockStore {
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn credentials(&self, order_id: Uuid) -> Result<Vec<ProxyCredential>> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut expired = 0;
        for order in state.orders.values_mut() {
            if order.status == OrderStatus::Active && order.expires_at <= now {
                order.status = OrderStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn active_credentials(&self, proxy_type: &str) -> Result<Vec<ProxyCredential>> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .iter()
            .filter(|c| {
                state.orders.get(&c.order_id).is_some_and(|o| {
                    o.status == OrderStatus::Active && o.proxy_type == proxy_type
                })
            })
            .cloned()
            .collect())
    }

    async fn orders_overlapping(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.proxy_type == proxy_type && o.overlaps(start, end))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl ReferralStore for MockStore {
    async fn insert_link(&self, link: &ReferralLink) -> Result<()> {
        let mut state = self.state.write().await;
        if state.links.contains_key(&link.referred_id) {
            return Err(StorageError::Duplicate(format!(
                "referral link for {}",
                link.referred_id
            )));
        }
        state.links.insert(link.referred_id, link.clone());
        Ok(())
    }

    async fn link_for(&self, referred_id: Uuid) -> Result<Option<ReferralLink>> {
        Ok(self.state.read().await.links.get(&referred_id).cloned())
    }

    async fn referred_by(&self, referrer_id: Uuid) -> Result<Vec<ReferralLink>> {
        let state = self.state.read().await;
        let mut links: Vec<ReferralLink> = state
            .links
            .values()
            .filter(|l| l.referrer_id == referrer_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(links)
    }

    async fn insert_earning(&self, earning: &ReferralEarning) -> Result<()> {
        if *self.fail_on_insert_earning.read().await {
            return Err(StorageError::Unavailable("mock earning failure".to_string()));
        }
        let mut state = self.state.write().await;
        if state.earnings.iter().any(|e| e.id == earning.id) {
            return Err(StorageError::Duplicate(format!("earning {}", earning.id)));
        }
        state.earnings.push(earning.clone());
        Ok(())
    }

    async fn get_earning(&self, id: Uuid) -> Result<Option<ReferralEarning>> {
        let state = self.state.read().await;
        Ok(state.earnings.iter().find(|e| e.id == id).cloned())
    }

    async fn pending_earnings_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ReferralEarning>> {
        let state = self.state.read().await;
        let mut due: Vec<ReferralEarning> = state
            .earnings
            .iter()
            .filter(|e| e.status == EarningStatus::Pending && e.created_at <= cutoff)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(due)
    }

    async fn earnings_for(&self, referrer_id: Uuid) -> Result<Vec<ReferralEarning>> {
        let state = self.state.read().await;
        let mut earnings: Vec<ReferralEarning> = state
            .earnings
            .iter()
            .filter(|e| e.referrer_id == referrer_id)
            .cloned()
            .collect();
        earnings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(earnings)
    }
}

#[async_trait]
impl SettingsStore for MockStore {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.state
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl SlaStore for MockStore {
    async fn upsert_config(&self, config: &SlaConfig) -> Result<()> {
        self.state
            .write()
            .await
            .sla_configs
            .insert(config.proxy_type.clone(), config.clone());
        Ok(())
    }

    async fn get_config(&self, proxy_type: &str) -> Result<Option<SlaConfig>> {
        Ok(self.state.read().await.sla_configs.get(proxy_type).cloned())
    }

    async fn list_configs(&self) -> Result<Vec<SlaConfig>> {
        Ok(self
            .state
            .read()
            .await
            .sla_configs
            .values()
            .cloned()
            .collect())
    }

    async fn record_uptime(&self, record: &UptimeRecord) -> Result<()> {
        self.state.write().await.uptime.push(record.clone());
        Ok(())
    }

    async fn uptime_between(
        &self,
        proxy_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UptimeRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<UptimeRecord> = state
            .uptime
            .iter()
            .filter(|r| r.proxy_type == proxy_type && r.checked_at >= start && r.checked_at < end)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.checked_at.cmp(&b.checked_at));
        Ok(records)
    }

    async fn insert_credit(&self, credit: &SlaCredit) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.credits.iter().any(|c| {
            c.account_id == credit.account_id
                && c.proxy_type == credit.proxy_type
                && c.window_end == credit.window_end
        }) {
            return Ok(false);
        }
        state.credits.push(credit.clone());
        Ok(true)
    }

    async fn get_credit(&self, id: Uuid) -> Result<Option<SlaCredit>> {
        let state = self.state.read().await;
        Ok(state.credits.iter().find(|c| c.id == id).cloned())
    }

    async fn credits(&self, status: Option<CreditStatus>) -> Result<Vec<SlaCredit>> {
        let state = self.state.read().await;
        Ok(state
            .credits
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn transition_credit(
        &self,
        id: Uuid,
        from: CreditStatus,
        to: CreditStatus,
        reviewer: Uuid,
    ) -> Result<SlaCredit> {
        let mut state = self.state.write().await;
        let credit = state
            .credits
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("sla credit {}", id)))?;
        if credit.status != from {
            return Err(StorageError::AlreadyProcessed(format!(
                "sla credit {} is {}",
                id, credit.status
            )));
        }
        credit.status = to;
        credit.reviewed_by = Some(reviewer);
        Ok(credit.clone())
    }
}

#[cfg(test)]
mod tests;
