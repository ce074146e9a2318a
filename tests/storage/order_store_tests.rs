//! OrderStore interface tests.
//!
//! Orders only enter a store through a `CreateOrder` posting, so every test
//! funds a buyer and commits the debit that carries the order.

use chrono::Duration;
use uuid::Uuid;

use proxyhub::interfaces::{
    AccountStore, Attachment, CatalogStore, LedgerStore, OrderStore, Posting, StorageError,
};
use proxyhub::model::{Order, OrderStatus, ProxyCredential};

use super::{at, create_account, create_product, euros, fund, make_credentials, make_order};

async fn place<S: LedgerStore>(
    store: &S,
    order: &Order,
    credentials: Vec<ProxyCredential>,
) -> proxyhub::interfaces::Result<()> {
    store
        .commit(
            Posting::debit(
                order.account_id,
                order.total_cost,
                Some(format!("order:{}", order.id)),
                "Proxy order",
            )
            .with(Attachment::CreateOrder {
                order: order.clone(),
                credentials,
            }),
        )
        .await
        .map(|_| ())
}

/// An order and its credentials commit with the debit.
pub async fn test_order_created_with_debit<
    S: AccountStore + CatalogStore + LedgerStore + OrderStore,
>(
    store: &S,
) {
    let buyer = create_account(store).await;
    let product = create_product(store, "residential").await;
    fund(store, buyer.id, euros(50)).await;

    let order = make_order(buyer.id, &product, 3, at("2026-04-01T12:00:00Z"));
    let credentials = make_credentials(&order, "gw.residential.test");
    place(store, &order, credentials.clone())
        .await
        .expect("order posting should succeed");

    let loaded = store
        .get_order(order.id)
        .await
        .expect("get should succeed")
        .expect("order should exist");
    assert_eq!(loaded, order);

    let stored = store
        .credentials(order.id)
        .await
        .expect("credentials should succeed");
    assert_eq!(stored.len(), 3);
    let mut ports: Vec<u16> = stored.iter().map(|c| c.port).collect();
    ports.sort_unstable();
    assert_eq!(ports, vec![8000, 8001, 8002]);

    let account = store
        .get_account(buyer.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(account.balance, euros(35));
}

/// A failed debit leaves no order and no credentials behind.
pub async fn test_unfunded_order_not_created<
    S: AccountStore + CatalogStore + LedgerStore + OrderStore,
>(
    store: &S,
) {
    let buyer = create_account(store).await;
    let product = create_product(store, "datacenter").await;
    fund(store, buyer.id, euros(20)).await;

    let order = make_order(buyer.id, &product, 5, at("2026-04-01T12:00:00Z"));
    let result = place(store, &order, make_credentials(&order, "gw.dc.test")).await;
    assert!(matches!(result, Err(StorageError::InsufficientFunds { .. })));

    assert!(store
        .get_order(order.id)
        .await
        .expect("get should succeed")
        .is_none());
    assert!(store
        .credentials(order.id)
        .await
        .expect("credentials should succeed")
        .is_empty());
    assert!(store
        .orders_for_account(buyer.id)
        .await
        .expect("list should succeed")
        .is_empty());
}

/// Orders list newest first.
pub async fn test_orders_for_account<
    S: AccountStore + CatalogStore + LedgerStore + OrderStore,
>(
    store: &S,
) {
    let buyer = create_account(store).await;
    let product = create_product(store, "mobile").await;
    fund(store, buyer.id, euros(30)).await;

    let older = make_order(buyer.id, &product, 1, at("2026-04-01T08:00:00Z"));
    let newer = make_order(buyer.id, &product, 1, at("2026-04-02T08:00:00Z"));
    place(store, &older, make_credentials(&older, "gw.mobile.test"))
        .await
        .expect("older order should succeed");
    place(store, &newer, make_credentials(&newer, "gw.mobile.test"))
        .await
        .expect("newer order should succeed");

    let orders = store
        .orders_for_account(buyer.id)
        .await
        .expect("list should succeed");
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

/// Expiry flips due active orders and hides their credentials from sampling.
pub async fn test_expire_due<S: AccountStore + CatalogStore + LedgerStore + OrderStore>(
    store: &S,
) {
    let proxy_type = format!("isp-{}", Uuid::new_v4().simple());
    let buyer = create_account(store).await;
    let product = create_product(store, &proxy_type).await;
    fund(store, buyer.id, euros(20)).await;

    let created = at("2026-05-01T00:00:00Z");
    let mut short = make_order(buyer.id, &product, 1, created);
    short.expires_at = created + Duration::days(1);
    let long = make_order(buyer.id, &product, 2, created);
    place(store, &short, make_credentials(&short, "gw.isp.test"))
        .await
        .expect("short order should succeed");
    place(store, &long, make_credentials(&long, "gw.isp.test"))
        .await
        .expect("long order should succeed");

    let live = store
        .active_credentials(&proxy_type)
        .await
        .expect("active credentials should succeed");
    assert_eq!(live.len(), 3);

    let expired = store
        .expire_due(created + Duration::days(1))
        .await
        .expect("expire should succeed");
    assert!(expired >= 1, "the one-day order is due exactly at its expiry");

    let short_loaded = store
        .get_order(short.id)
        .await
        .expect("get should succeed")
        .expect("order should exist");
    assert_eq!(short_loaded.status, OrderStatus::Expired);
    let long_loaded = store
        .get_order(long.id)
        .await
        .expect("get should succeed")
        .expect("order should exist");
    assert_eq!(long_loaded.status, OrderStatus::Active);

    let live = store
        .active_credentials(&proxy_type)
        .await
        .expect("active credentials should succeed");
    assert_eq!(live.len(), 2);
    assert!(live.iter().all(|c| c.order_id == long.id));
}

/// Overlap covers orders live at any point of the half-open window.
pub async fn test_orders_overlapping<
    S: AccountStore + CatalogStore + LedgerStore + OrderStore,
>(
    store: &S,
) {
    let proxy_type = format!("overlap-{}", Uuid::new_v4().simple());
    let buyer = create_account(store).await;
    let product = create_product(store, &proxy_type).await;
    let other_product = create_product(store, &format!("{}-other", proxy_type)).await;
    fund(store, buyer.id, euros(50)).await;

    let window_start = at("2026-06-10T00:00:00Z");
    let window_end = at("2026-06-11T00:00:00Z");

    let inside = make_order(buyer.id, &product, 1, at("2026-06-01T00:00:00Z"));
    let mut ended_before = make_order(buyer.id, &product, 1, at("2026-05-01T00:00:00Z"));
    ended_before.expires_at = window_start;
    let starts_at_end = make_order(buyer.id, &product, 1, window_end);
    let other_type = make_order(buyer.id, &other_product, 1, at("2026-06-01T00:00:00Z"));

    for order in [&inside, &ended_before, &starts_at_end, &other_type] {
        place(store, order, make_credentials(order, "gw.overlap.test"))
            .await
            .expect("order should succeed");
    }

    let overlapping = store
        .orders_overlapping(&proxy_type, window_start, window_end)
        .await
        .expect("overlap query should succeed");
    let ids: Vec<Uuid> = overlapping.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![inside.id]);
}

/// Run all OrderStore tests.
#[macro_export]
macro_rules! run_order_store_tests {
    ($store:expr) => {
        use $crate::storage::order_store_tests::*;

        test_order_created_with_debit($store).await;
        println!("  test_order_created_with_debit: PASSED");

        test_unfunded_order_not_created($store).await;
        println!("  test_unfunded_order_not_created: PASSED");

        test_orders_for_account($store).await;
        println!("  test_orders_for_account: PASSED");

        test_expire_due($store).await;
        println!("  test_expire_due: PASSED");

        test_orders_overlapping($store).await;
        println!("  test_orders_overlapping: PASSED");
    };
}
