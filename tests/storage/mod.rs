//! Shared storage contract tests.
//!
//! Every backend implements the same ports; each test binary builds its own
//! store and runs these functions through the `run_*_tests!` macros.

pub mod account_store_tests;
pub mod catalog_store_tests;
pub mod ledger_store_tests;
pub mod order_store_tests;
pub mod referral_store_tests;
pub mod sla_store_tests;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{AccountStore, CatalogStore, LedgerStore, Posting};
use proxyhub::model::{Account, Order, OrderStatus, Product, ProxyCredential, Role};

/// Parse an RFC 3339 timestamp.
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub fn euros(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

pub fn make_account(email: &str) -> Account {
    Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        role: Role::Client,
        balance: Decimal::ZERO,
        referral_code: Uuid::new_v4().simple().to_string()[..8].to_uppercase(),
        referral_rate: None,
        registration_ip: None,
        created_at: at("2026-01-01T00:00:00Z"),
    }
}

/// Insert a client account with a unique email.
pub async fn create_account<S: AccountStore>(store: &S) -> Account {
    let account = make_account(&format!("{}@example.com", Uuid::new_v4().simple()));
    store
        .insert_account(&account)
        .await
        .expect("insert account should succeed");
    account
}

pub async fn fund<S: LedgerStore>(store: &S, account_id: Uuid, amount: Decimal) {
    store
        .commit(Posting::credit(account_id, amount, None, "Funding"))
        .await
        .expect("funding should succeed");
}

pub fn make_product(proxy_type: &str) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: format!("{} pack", proxy_type),
        proxy_type: proxy_type.to_string(),
        unit_price: euros(5),
        unit_size: 1,
        allocation_id: format!("alloc-{}", proxy_type),
        active: true,
    }
}

pub async fn create_product<S: CatalogStore>(store: &S, proxy_type: &str) -> Product {
    let product = make_product(proxy_type);
    store
        .insert_product(&product)
        .await
        .expect("insert product should succeed");
    product
}

pub fn make_order(
    account_id: Uuid,
    product: &Product,
    quantity: u32,
    created_at: DateTime<Utc>,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        account_id,
        product_id: product.id,
        proxy_type: product.proxy_type.clone(),
        quantity,
        total_cost: product.unit_price * Decimal::from(quantity),
        status: OrderStatus::Active,
        expires_at: created_at + Duration::days(30),
        created_at,
    }
}

pub fn make_credentials(order: &Order, host: &str) -> Vec<ProxyCredential> {
    (0..order.quantity)
        .map(|i| ProxyCredential {
            id: Uuid::new_v4(),
            order_id: order.id,
            host: host.to_string(),
            port: 8000 + i as u16,
            username: format!("u{}", order.account_id.simple()),
            password: Uuid::new_v4().simple().to_string(),
            geo: Some("DE".to_string()),
        })
        .collect()
}
