//! LedgerStore interface tests.
//!
//! Postings are all-or-nothing: a rejected posting leaves balance, entries
//! and attachments untouched.

use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{AccountStore, Attachment, LedgerStore, Posting, StorageError};
use proxyhub::model::{Direction, WebhookEvent};

use super::{at, create_account, euros, fund};

/// Credits and debits move the balance by their signed amount.
pub async fn test_credit_then_debit<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;

    let receipt = store
        .commit(Posting::credit(
            account.id,
            Decimal::new(2050, 2),
            Some(format!("test:{}", Uuid::new_v4())),
            "Top up",
        ))
        .await
        .expect("credit should succeed");
    assert_eq!(receipt.balance, Decimal::new(2050, 2));
    assert_eq!(receipt.entry.direction, Direction::Credit);
    assert_eq!(receipt.entry.account_id, account.id);
    assert!(receipt.audit.is_none());

    let receipt = store
        .commit(Posting::debit(account.id, Decimal::new(550, 2), None, "Order"))
        .await
        .expect("debit should succeed");
    assert_eq!(receipt.balance, euros(15));

    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.balance, euros(15));

    let entries = store.entries(account.id).await.expect("entries should succeed");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].direction, Direction::Credit);
    assert_eq!(entries[1].direction, Direction::Debit);
    assert_eq!(entries[1].amount, Decimal::new(550, 2));
    assert_eq!(entries[1].description, "Order");
}

/// A debit larger than the balance writes nothing.
pub async fn test_overdraft_rejected<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    fund(store, account.id, euros(5)).await;

    let result = store
        .commit(Posting::debit(account.id, Decimal::new(501, 2), None, "Too much"))
        .await;
    match result {
        Err(StorageError::InsufficientFunds {
            available,
            required,
        }) => {
            assert_eq!(available, euros(5));
            assert_eq!(required, Decimal::new(501, 2));
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    let entries = store.entries(account.id).await.expect("entries should succeed");
    assert_eq!(entries.len(), 1, "rejected debit adds no entry");

    let receipt = store
        .commit(Posting::debit(account.id, euros(5), None, "Exact"))
        .await
        .expect("debit of the whole balance should succeed");
    assert_eq!(receipt.balance, Decimal::ZERO);
}

/// A reference is posted at most once.
pub async fn test_reference_idempotent<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    let reference = format!("test:{}", Uuid::new_v4());

    store
        .commit(Posting::credit(account.id, euros(10), Some(reference.clone()), "Once"))
        .await
        .expect("first posting should succeed");
    let result = store
        .commit(Posting::credit(account.id, euros(10), Some(reference.clone()), "Twice"))
        .await;
    assert!(
        matches!(result, Err(StorageError::AlreadyProcessed(_))),
        "replayed reference should be AlreadyProcessed, got {:?}",
        result
    );

    let found = store
        .find_by_reference(&reference)
        .await
        .expect("lookup should succeed")
        .expect("reference should be recorded");
    assert_eq!(found.description, "Once");
    assert!(store
        .find_by_reference("test:missing")
        .await
        .expect("lookup should succeed")
        .is_none());

    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.balance, euros(10));
}

/// Postings against unknown accounts or with non-positive amounts fail.
pub async fn test_invalid_postings<S: AccountStore + LedgerStore>(store: &S) {
    let result = store
        .commit(Posting::credit(Uuid::new_v4(), euros(1), None, "Ghost"))
        .await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));

    let account = create_account(store).await;
    let result = store
        .commit(Posting::credit(account.id, Decimal::ZERO, None, "Nothing"))
        .await;
    assert!(matches!(result, Err(StorageError::InvalidData(_))));
    assert!(store
        .entries(account.id)
        .await
        .expect("entries should succeed")
        .is_empty());
}

/// A webhook event is recorded once; a replay rolls back the whole posting.
pub async fn test_webhook_guard<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    let event = WebhookEvent {
        provider: "stripe".to_string(),
        event_id: format!("evt_{}", Uuid::new_v4().simple()),
        account_id: account.id,
        amount: euros(25),
        received_at: at("2026-03-01T10:00:00Z"),
    };

    store
        .commit(
            Posting::credit(
                account.id,
                euros(25),
                Some(format!("webhook:stripe:{}", event.event_id)),
                "Payment",
            )
            .with(Attachment::RecordWebhook(event.clone())),
        )
        .await
        .expect("first delivery should succeed");

    // Different reference, same event: the webhook row alone must reject it.
    let result = store
        .commit(
            Posting::credit(account.id, euros(25), None, "Payment again")
                .with(Attachment::RecordWebhook(event.clone())),
        )
        .await;
    assert!(matches!(result, Err(StorageError::AlreadyProcessed(_))));

    let recorded = store
        .webhook_event("stripe", &event.event_id)
        .await
        .expect("lookup should succeed")
        .expect("event should be recorded");
    assert_eq!(recorded.account_id, account.id);
    assert_eq!(recorded.amount, euros(25));
    assert!(store
        .webhook_event("paypal", &event.event_id)
        .await
        .expect("lookup should succeed")
        .is_none());

    let entries = store.entries(account.id).await.expect("entries should succeed");
    assert_eq!(entries.len(), 1);
    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.balance, euros(25));
}

/// The sum of signed entries always equals the stored balance.
pub async fn test_balance_matches_entries<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    fund(store, account.id, euros(40)).await;
    for cents in [150, 275, 999] {
        store
            .commit(Posting::debit(account.id, Decimal::new(cents, 2), None, "Spend"))
            .await
            .expect("debit should succeed");
    }
    store
        .commit(Posting::credit(account.id, Decimal::new(1, 2), None, "Rounding"))
        .await
        .expect("credit should succeed");

    let entries = store.entries(account.id).await.expect("entries should succeed");
    let sum: Decimal = entries
        .iter()
        .map(|e| e.direction.signed(e.amount))
        .sum();
    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(sum, loaded.balance);
    assert_eq!(loaded.balance, Decimal::new(2577, 2));
}

/// A posting whose result does not fit the balance column is refused cleanly.
pub async fn test_balance_overflow_rejected<S: AccountStore + LedgerStore>(store: &S) {
    let account = create_account(store).await;
    fund(store, account.id, Decimal::new(1, 2)).await;

    let result = store
        .commit(Posting::credit(
            account.id,
            Decimal::new(i64::MAX, 2),
            Some(format!("test:{}", Uuid::new_v4())),
            "Huge top up",
        ))
        .await;
    assert!(
        matches!(result, Err(StorageError::InvalidData(_))),
        "expected InvalidData, got {:?}",
        result
    );

    let entries = store.entries(account.id).await.expect("entries should succeed");
    assert_eq!(entries.len(), 1);
    let loaded = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(loaded.balance, Decimal::new(1, 2));

    // The store is still usable afterwards.
    let receipt = store
        .commit(Posting::credit(account.id, euros(1), None, "Top up"))
        .await
        .expect("credit should succeed");
    assert_eq!(receipt.balance, Decimal::new(101, 2));
}

/// Run all LedgerStore tests.
#[macro_export]
macro_rules! run_ledger_store_tests {
    ($store:expr) => {
        use $crate::storage::ledger_store_tests::*;

        test_credit_then_debit($store).await;
        println!("  test_credit_then_debit: PASSED");

        test_overdraft_rejected($store).await;
        println!("  test_overdraft_rejected: PASSED");

        test_reference_idempotent($store).await;
        println!("  test_reference_idempotent: PASSED");

        test_invalid_postings($store).await;
        println!("  test_invalid_postings: PASSED");

        test_webhook_guard($store).await;
        println!("  test_webhook_guard: PASSED");

        test_balance_matches_entries($store).await;
        println!("  test_balance_matches_entries: PASSED");

        test_balance_overflow_rejected($store).await;
        println!("  test_balance_overflow_rejected: PASSED");
    };
}
