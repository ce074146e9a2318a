//! CatalogStore and SettingsStore interface tests.

use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{CatalogStore, SettingsStore, StorageError};

use super::{create_product, make_product};

/// Products read back, update in place and list by name.
pub async fn test_products<S: CatalogStore>(store: &S) {
    let mut product = make_product("residential");
    product.name = format!("zz {}", Uuid::new_v4());
    product.unit_price = Decimal::new(1250, 2);
    product.unit_size = 10;
    store
        .insert_product(&product)
        .await
        .expect("insert should succeed");

    let loaded = store
        .get_product(product.id)
        .await
        .expect("get should succeed")
        .expect("product should exist");
    assert_eq!(loaded, product);

    product.active = false;
    product.unit_price = Decimal::new(999, 2);
    store
        .update_product(&product)
        .await
        .expect("update should succeed");
    let loaded = store
        .get_product(product.id)
        .await
        .expect("get should succeed")
        .expect("product should exist");
    assert!(!loaded.active);
    assert_eq!(loaded.unit_price, Decimal::new(999, 2));

    let result = store.update_product(&make_product("ghost")).await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));

    let mut first = make_product("datacenter");
    first.name = "aa first".to_string();
    store.insert_product(&first).await.expect("insert should succeed");

    let all = store.list_products(false).await.expect("list should succeed");
    let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "products list in name order");
    assert!(all.iter().any(|p| p.id == product.id));

    let active = store.list_products(true).await.expect("list should succeed");
    assert!(active.iter().all(|p| p.active));
    assert!(active.iter().any(|p| p.id == first.id));
    assert!(!active.iter().any(|p| p.id == product.id));
}

/// Duplicate product ids are rejected.
pub async fn test_duplicate_product<S: CatalogStore>(store: &S) {
    let product = create_product(store, "mobile").await;
    let result = store.insert_product(&product).await;
    assert!(matches!(result, Err(StorageError::Duplicate(_))));
}

/// Settings are plain strings; a put replaces the previous value.
pub async fn test_settings<S: SettingsStore>(store: &S) {
    let key = format!("test_{}", Uuid::new_v4().simple());
    assert!(store
        .get_setting(&key)
        .await
        .expect("get should succeed")
        .is_none());

    store.put_setting(&key, "true").await.expect("put should succeed");
    store.put_setting(&key, "false").await.expect("put should succeed");
    assert_eq!(
        store.get_setting(&key).await.expect("get should succeed"),
        Some("false".to_string())
    );
}

/// Run all CatalogStore and SettingsStore tests.
#[macro_export]
macro_rules! run_catalog_store_tests {
    ($store:expr) => {
        use $crate::storage::catalog_store_tests::*;

        test_products($store).await;
        println!("  test_products: PASSED");

        test_duplicate_product($store).await;
        println!("  test_duplicate_product: PASSED");

        test_settings($store).await;
        println!("  test_settings: PASSED");
    };
}
