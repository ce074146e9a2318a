use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;
use crate::interfaces::{Attachment, Posting};
use crate::model::{Account, EarningStatus, ReferralEarning, Role};

fn account(email: &str, code: &str) -> Account {
    Account {
        id: Uuid::new_v4(),
        email: email.to_string(),
        role: Role::Client,
        balance: Decimal::new(999, 0),
        referral_code: code.to_string(),
        referral_rate: None,
        registration_ip: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_insert_account_starts_at_zero() {
    let store = MockStore::new();
    let acct = account("a@example.com", "AAAA1111");
    store.insert_account(&acct).await.unwrap();

    let stored = store.get_account(acct.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_insert_account_rejects_duplicate_email() {
    let store = MockStore::new();
    store
        .insert_account(&account("a@example.com", "AAAA1111"))
        .await
        .unwrap();

    let err = store
        .insert_account(&account("A@Example.com", "BBBB2222"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Duplicate(_)));
}

#[tokio::test]
async fn test_fail_on_commit() {
    let store = MockStore::new();
    let acct = account("a@example.com", "AAAA1111");
    store.insert_account(&acct).await.unwrap();
    store.set_fail_on_commit(true).await;

    let err = store
        .commit(Posting::credit(acct.id, Decimal::ONE, None, "top-up"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Unavailable(_)));
    assert_eq!(store.entry_count().await, 0);
}

#[tokio::test]
async fn test_rejected_attachment_rolls_back_entry() {
    let store = MockStore::new();
    let referrer = account("r@example.com", "REFR0001");
    store.insert_account(&referrer).await.unwrap();

    let earning = ReferralEarning {
        id: Uuid::new_v4(),
        referrer_id: referrer.id,
        referred_id: Uuid::new_v4(),
        amount: Decimal::new(150, 2),
        status: EarningStatus::Completed,
        description: "already paid".to_string(),
        created_at: Utc::now() - Duration::days(30),
        completed_at: Some(Utc::now()),
    };
    store.insert_earning(&earning).await.unwrap();

    let err = store
        .commit(
            Posting::credit(referrer.id, earning.amount, None, "release")
                .with(Attachment::ReleaseEarning(earning.id)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::AlreadyProcessed(_)));

    let stored = store.get_account(referrer.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, Decimal::ZERO);
    assert_eq!(store.entry_count().await, 0);
}

#[tokio::test]
async fn test_audit_attachment_captures_balances() {
    let store = MockStore::new();
    let acct = account("a@example.com", "AAAA1111");
    store.insert_account(&acct).await.unwrap();
    store
        .commit(Posting::credit(acct.id, Decimal::new(10, 0), None, "top-up"))
        .await
        .unwrap();

    let admin = Uuid::new_v4();
    let receipt = store
        .commit(
            Posting::debit(acct.id, Decimal::new(4, 0), None, "correction").with(
                Attachment::Audit {
                    admin_id: admin,
                    reason: "duplicate top-up".to_string(),
                },
            ),
        )
        .await
        .unwrap();

    let audit = receipt.audit.unwrap();
    assert_eq!(audit.old_balance, Decimal::new(10, 0));
    assert_eq!(audit.new_balance, Decimal::new(6, 0));
    assert_eq!(audit.admin_id, admin);
    assert_eq!(store.audits(acct.id).await.unwrap().len(), 1);
}
