//! AccountStore interface tests.

use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{AccountStore, Attachment, LedgerStore, Posting, StorageError};
use proxyhub::model::Role;

use super::{create_account, euros, make_account};

/// Inserted accounts read back by id, email and referral code.
pub async fn test_insert_and_lookup<S: AccountStore>(store: &S) {
    let mut account = make_account("Lookup@Example.com");
    account.registration_ip = Some("10.0.0.7".to_string());
    account.balance = euros(99);
    store.insert_account(&account).await.expect("insert should succeed");

    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.email, account.email);
    assert_eq!(loaded.role, Role::Client);
    assert_eq!(loaded.balance, Decimal::ZERO, "insert ignores the balance field");
    assert_eq!(loaded.registration_ip.as_deref(), Some("10.0.0.7"));
    assert_eq!(loaded.referral_rate, None);

    let by_email = store
        .find_by_email("lookup@example.com")
        .await
        .expect("find should succeed")
        .expect("email lookup ignores case");
    assert_eq!(by_email.id, account.id);

    let by_code = store
        .find_by_referral_code(&account.referral_code)
        .await
        .expect("find should succeed")
        .expect("code lookup should match");
    assert_eq!(by_code.id, account.id);

    assert!(store
        .get_account(Uuid::new_v4())
        .await
        .expect("get should succeed")
        .is_none());
}

/// Email and referral code are unique.
pub async fn test_duplicates_rejected<S: AccountStore>(store: &S) {
    let first = create_account(store).await;

    let mut same_email = make_account(&first.email.to_uppercase());
    same_email.referral_code = "UNIQUE01".to_string();
    let result = store.insert_account(&same_email).await;
    assert!(
        matches!(result, Err(StorageError::Duplicate(_))),
        "same email should be a duplicate, got {:?}",
        result
    );

    let mut same_code = make_account("other-code@example.com");
    same_code.referral_code = first.referral_code.clone();
    let result = store.insert_account(&same_code).await;
    assert!(matches!(result, Err(StorageError::Duplicate(_))));
}

/// Role and referral rate updates persist; unknown ids are NotFound.
pub async fn test_role_and_rate_updates<S: AccountStore>(store: &S) {
    let account = create_account(store).await;

    store
        .set_role(account.id, Role::Banned)
        .await
        .expect("set_role should succeed");
    store
        .set_referral_rate(account.id, Some(Decimal::new(125, 1)))
        .await
        .expect("set_referral_rate should succeed");

    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.role, Role::Banned);
    assert_eq!(loaded.referral_rate, Some(Decimal::new(125, 1)));

    store
        .set_referral_rate(account.id, None)
        .await
        .expect("clearing the rate should succeed");
    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.referral_rate, None);

    let result = store.set_role(Uuid::new_v4(), Role::Admin).await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
    let result = store.set_referral_rate(Uuid::new_v4(), None).await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

/// Audit rows capture the balance before and after an adjustment.
pub async fn test_audits_recorded<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    let admin = create_account(store).await;

    store
        .commit(Posting::credit(account.id, euros(10), None, "Top up"))
        .await
        .expect("credit should succeed");
    let receipt = store
        .commit(
            Posting::debit(account.id, euros(3), None, "Admin adjustment: refund clawback").with(
                Attachment::Audit {
                    admin_id: admin.id,
                    reason: "refund clawback".to_string(),
                },
            ),
        )
        .await
        .expect("adjustment should succeed");

    let audit = receipt.audit.expect("audit attachment yields a row");
    assert_eq!(audit.old_balance, euros(10));
    assert_eq!(audit.new_balance, euros(7));
    assert_eq!(audit.admin_id, admin.id);

    let audits = store.audits(account.id).await.expect("audits should succeed");
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].id, audit.id);
    assert_eq!(audits[0].reason, "refund clawback");
    assert!(store
        .audits(admin.id)
        .await
        .expect("audits should succeed")
        .is_empty());
}

/// Run all AccountStore tests.
#[macro_export]
macro_rules! run_account_store_tests {
    ($store:expr) => {
        use $crate::storage::account_store_tests::*;

        test_insert_and_lookup($store).await;
        println!("  test_insert_and_lookup: PASSED");

        test_duplicates_rejected($store).await;
        println!("  test_duplicates_rejected: PASSED");

        test_role_and_rate_updates($store).await;
        println!("  test_role_and_rate_updates: PASSED");

        test_audits_recorded($store).await;
        println!("  test_audits_recorded: PASSED");
    };
}
