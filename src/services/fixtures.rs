//! Shared builders for service unit tests.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::Config;
use crate::interfaces::{AccountStore, CatalogStore, LedgerStore, Posting};
use crate::model::{Account, Product, Role};
use crate::storage::MockStore;
use crate::utils::AccountLocks;

use super::{LedgerService, StaticSettings};

pub fn euros(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

pub fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

pub fn ledger(store: &Arc<MockStore>) -> Arc<LedgerService> {
    Arc::new(LedgerService::new(store.clone(), AccountLocks::new()))
}

pub fn settings() -> Arc<StaticSettings> {
    Arc::new(StaticSettings::new())
}

pub fn config() -> Config {
    Config::for_test()
}

pub async fn account_with(store: &MockStore, email: &str, role: Role, ip: Option<&str>) -> Account {
    let account = Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        role,
        balance: Decimal::ZERO,
        referral_code: format!("R{}", &Uuid::new_v4().simple().to_string()[..7]).to_uppercase(),
        referral_rate: None,
        registration_ip: ip.map(str::to_string),
        created_at: Utc::now(),
    };
    store.insert_account(&account).await.unwrap();
    account
}

pub async fn client(store: &MockStore, email: &str) -> Account {
    account_with(store, email, Role::Client, None).await
}

pub async fn admin(store: &MockStore) -> Account {
    account_with(store, "ops@proxyhub.test", Role::Admin, None).await
}

/// Credit an account directly through the store.
pub async fn fund(store: &MockStore, account_id: Uuid, amount: Decimal) {
    store
        .commit(Posting::credit(account_id, amount, None, "Test funding"))
        .await
        .unwrap();
}

pub async fn product(store: &MockStore, proxy_type: &str, unit_price: Decimal) -> Product {
    let product = Product {
        id: Uuid::new_v4(),
        name: format!("{} pack", proxy_type),
        proxy_type: proxy_type.to_string(),
        unit_price,
        unit_size: 1,
        allocation_id: format!("alloc-{}", proxy_type),
        active: true,
    };
    store.insert_product(&product).await.unwrap();
    product
}
