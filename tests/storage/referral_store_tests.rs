//! ReferralStore interface tests.

use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{
    AccountStore, Attachment, LedgerStore, Posting, ReferralStore, StorageError,
};
use proxyhub::model::{EarningStatus, ReferralEarning, ReferralLink};

use super::{at, create_account};

fn make_earning(referrer_id: Uuid, referred_id: Uuid, cents: i64, rfc3339: &str) -> ReferralEarning {
    ReferralEarning {
        id: Uuid::new_v4(),
        referrer_id,
        referred_id,
        amount: Decimal::new(cents, 2),
        status: EarningStatus::Pending,
        description: "Referral commission".to_string(),
        created_at: at(rfc3339),
        completed_at: None,
    }
}

/// Each referred account has at most one referrer.
pub async fn test_links<S: AccountStore + ReferralStore>(store: &S) {
    let referrer = create_account(store).await;
    let first = create_account(store).await;
    let second = create_account(store).await;

    for (referred, when) in [
        (&second, "2026-02-02T00:00:00Z"),
        (&first, "2026-02-01T00:00:00Z"),
    ] {
        store
            .insert_link(&ReferralLink {
                referred_id: referred.id,
                referrer_id: referrer.id,
                created_at: at(when),
            })
            .await
            .expect("link should insert");
    }

    let result = store
        .insert_link(&ReferralLink {
            referred_id: first.id,
            referrer_id: second.id,
            created_at: at("2026-02-03T00:00:00Z"),
        })
        .await;
    assert!(
        matches!(result, Err(StorageError::Duplicate(_))),
        "second link for the same account should be Duplicate, got {:?}",
        result
    );

    let link = store
        .link_for(first.id)
        .await
        .expect("lookup should succeed")
        .expect("link should exist");
    assert_eq!(link.referrer_id, referrer.id);
    assert!(store
        .link_for(referrer.id)
        .await
        .expect("lookup should succeed")
        .is_none());

    let referred: Vec<Uuid> = store
        .referred_by(referrer.id)
        .await
        .expect("list should succeed")
        .iter()
        .map(|l| l.referred_id)
        .collect();
    assert_eq!(referred, vec![first.id, second.id]);
}

/// Pending earnings become due once their creation time passes the cutoff.
pub async fn test_pending_earnings_before<S: AccountStore + ReferralStore>(store: &S) {
    let referrer = create_account(store).await;
    let referred = create_account(store).await;

    let old = make_earning(referrer.id, referred.id, 150, "2026-03-01T00:00:00Z");
    let recent = make_earning(referrer.id, referred.id, 275, "2026-03-20T00:00:00Z");
    store.insert_earning(&recent).await.expect("insert should succeed");
    store.insert_earning(&old).await.expect("insert should succeed");

    let result = store.insert_earning(&old).await;
    assert!(matches!(result, Err(StorageError::Duplicate(_))));

    let cutoff = at("2026-03-20T00:00:00Z") - Duration::days(7);
    let due: Vec<Uuid> = store
        .pending_earnings_before(cutoff)
        .await
        .expect("query should succeed")
        .into_iter()
        .filter(|e| e.referrer_id == referrer.id)
        .map(|e| e.id)
        .collect();
    assert_eq!(due, vec![old.id]);

    let due_later: Vec<Uuid> = store
        .pending_earnings_before(at("2026-03-20T00:00:00Z"))
        .await
        .expect("query should succeed")
        .into_iter()
        .filter(|e| e.referrer_id == referrer.id)
        .map(|e| e.id)
        .collect();
    assert_eq!(due_later, vec![old.id, recent.id], "cutoff is inclusive");

    let earnings = store
        .earnings_for(referrer.id)
        .await
        .expect("list should succeed");
    assert_eq!(earnings.len(), 2);
    assert_eq!(earnings[0].id, old.id);
    assert_eq!(earnings[0].amount, Decimal::new(150, 2));
    assert!(store
        .earnings_for(referred.id)
        .await
        .expect("list should succeed")
        .is_empty());
}

/// Releasing an earning credits the referrer exactly once.
pub async fn test_release_earning<S: AccountStore + LedgerStore + ReferralStore>(store: &S) {
    let referrer = create_account(store).await;
    let referred = create_account(store).await;
    let earning = make_earning(referrer.id, referred.id, 420, "2026-03-01T00:00:00Z");
    store.insert_earning(&earning).await.expect("insert should succeed");

    let release = || {
        Posting::credit(
            referrer.id,
            earning.amount,
            None,
            "Referral commission released",
        )
        .with(Attachment::ReleaseEarning(earning.id))
    };

    let receipt = store
        .commit(release())
        .await
        .expect("first release should succeed");
    assert_eq!(receipt.balance, Decimal::new(420, 2));

    let result = store.commit(release()).await;
    assert!(
        matches!(result, Err(StorageError::AlreadyProcessed(_))),
        "second release should be AlreadyProcessed, got {:?}",
        result
    );

    let loaded = store
        .get_earning(earning.id)
        .await
        .expect("get should succeed")
        .expect("earning should exist");
    assert_eq!(loaded.status, EarningStatus::Completed);
    assert!(loaded.completed_at.is_some());

    let account = store
        .get_account(referrer.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(account.balance, Decimal::new(420, 2));

    let result = store
        .commit(
            Posting::credit(referrer.id, Decimal::ONE, None, "Ghost release")
                .with(Attachment::ReleaseEarning(Uuid::new_v4())),
        )
        .await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

/// Run all ReferralStore tests.
#[macro_export]
macro_rules! run_referral_store_tests {
    ($store:expr) => {
        use $crate::storage::referral_store_tests::*;

        test_links($store).await;
        println!("  test_links: PASSED");

        test_pending_earnings_before($store).await;
        println!("  test_pending_earnings_before: PASSED");

        test_release_earning($store).await;
        println!("  test_release_earning: PASSED");
    };
}
