//! SlaStore interface tests.

use rust_decimal::Decimal;
use uuid::Uuid;

use proxyhub::interfaces::{
    AccountStore, Attachment, LedgerStore, Posting, SlaStore, StorageError,
};
use proxyhub::model::{CreditStatus, SlaConfig, SlaCredit, UptimeRecord, UptimeStatus};

use super::{at, create_account};

fn make_config(proxy_type: &str, guaranteed: Decimal) -> SlaConfig {
    SlaConfig {
        proxy_type: proxy_type.to_string(),
        guaranteed_uptime: guaranteed,
        credit_per_percent: Decimal::new(500, 2),
        measurement_window_hours: 24,
        active: true,
    }
}

fn make_credit(account_id: Uuid, proxy_type: &str, window_end: &str, created: &str) -> SlaCredit {
    SlaCredit {
        id: Uuid::new_v4(),
        account_id,
        proxy_type: proxy_type.to_string(),
        guaranteed_uptime: Decimal::new(999, 1),
        actual_uptime: Decimal::new(980, 1),
        credit_amount: Decimal::new(950, 2),
        status: CreditStatus::Pending,
        window_start: at(window_end) - chrono::Duration::hours(24),
        window_end: at(window_end),
        reviewed_by: None,
        created_at: at(created),
    }
}

/// Configurations upsert by proxy type and list in name order.
pub async fn test_configs<S: SlaStore>(store: &S) {
    let suffix = Uuid::new_v4().simple().to_string();
    let beta = format!("beta-{}", suffix);
    let alpha = format!("alpha-{}", suffix);

    store
        .upsert_config(&make_config(&beta, Decimal::new(995, 1)))
        .await
        .expect("upsert should succeed");
    store
        .upsert_config(&make_config(&alpha, Decimal::new(990, 1)))
        .await
        .expect("upsert should succeed");

    let mut replaced = make_config(&beta, Decimal::new(9995, 2));
    replaced.active = false;
    replaced.measurement_window_hours = 6;
    store
        .upsert_config(&replaced)
        .await
        .expect("second upsert should replace");

    let loaded = store
        .get_config(&beta)
        .await
        .expect("get should succeed")
        .expect("config should exist");
    assert_eq!(loaded, replaced);
    assert!(store
        .get_config("no-such-type")
        .await
        .expect("get should succeed")
        .is_none());

    let listed: Vec<String> = store
        .list_configs()
        .await
        .expect("list should succeed")
        .into_iter()
        .map(|c| c.proxy_type)
        .filter(|t| t.ends_with(&suffix))
        .collect();
    assert_eq!(listed, vec![alpha, beta]);
}

/// Uptime samples are selected by a half-open window.
pub async fn test_uptime_between<S: SlaStore>(store: &S) {
    let proxy_type = format!("uptime-{}", Uuid::new_v4().simple());
    let samples = [
        ("2026-07-01T00:00:00Z", UptimeStatus::Up, Some(120)),
        ("2026-07-01T12:00:00Z", UptimeStatus::Degraded, Some(4100)),
        ("2026-07-01T23:59:59Z", UptimeStatus::Down, None),
        ("2026-07-02T00:00:00Z", UptimeStatus::Up, Some(90)),
    ];
    // Insert out of order to check the sort.
    for (when, status, latency) in samples.iter().rev() {
        store
            .record_uptime(&UptimeRecord {
                id: Uuid::new_v4(),
                proxy_type: proxy_type.clone(),
                status: *status,
                latency_ms: *latency,
                checked_at: at(when),
            })
            .await
            .expect("record should succeed");
    }

    let window = store
        .uptime_between(
            &proxy_type,
            at("2026-07-01T00:00:00Z"),
            at("2026-07-02T00:00:00Z"),
        )
        .await
        .expect("query should succeed");
    let statuses: Vec<UptimeStatus> = window.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![UptimeStatus::Up, UptimeStatus::Degraded, UptimeStatus::Down]
    );
    assert_eq!(window[1].latency_ms, Some(4100));
    assert_eq!(window[2].latency_ms, None);

    let other = store
        .uptime_between(
            "other-type",
            at("2026-07-01T00:00:00Z"),
            at("2026-07-02T00:00:00Z"),
        )
        .await
        .expect("query should succeed");
    assert!(other.is_empty());
}

/// One credit per account, proxy type and window end.
pub async fn test_credit_dedup<S: AccountStore + SlaStore>(store: &S) {
    let account = create_account(store).await;
    let proxy_type = format!("dedup-{}", Uuid::new_v4().simple());

    let first = make_credit(account.id, &proxy_type, "2026-07-02T00:00:00Z", "2026-07-02T00:05:00Z");
    assert!(store.insert_credit(&first).await.expect("insert should succeed"));

    let again = make_credit(account.id, &proxy_type, "2026-07-02T00:00:00Z", "2026-07-02T00:10:00Z");
    assert!(
        !store.insert_credit(&again).await.expect("insert should succeed"),
        "same window must not produce a second credit"
    );

    let next = make_credit(account.id, &proxy_type, "2026-07-03T00:00:00Z", "2026-07-03T00:05:00Z");
    assert!(store.insert_credit(&next).await.expect("insert should succeed"));

    assert!(store
        .get_credit(again.id)
        .await
        .expect("get should succeed")
        .is_none());
    let loaded = store
        .get_credit(first.id)
        .await
        .expect("get should succeed")
        .expect("credit should exist");
    assert_eq!(loaded, first);
}

/// Review transitions are guarded by the current status.
pub async fn test_credit_review<S: AccountStore + LedgerStore + SlaStore>(store: &S) {
    let account = create_account(store).await;
    let reviewer = create_account(store).await;
    let proxy_type = format!("review-{}", Uuid::new_v4().simple());

    let approved = make_credit(account.id, &proxy_type, "2026-08-02T00:00:00Z", "2026-08-02T00:05:00Z");
    let rejected = make_credit(account.id, &proxy_type, "2026-08-03T00:00:00Z", "2026-08-03T00:05:00Z");
    store.insert_credit(&approved).await.expect("insert should succeed");
    store.insert_credit(&rejected).await.expect("insert should succeed");

    let credit = store
        .transition_credit(approved.id, CreditStatus::Pending, CreditStatus::Approved, reviewer.id)
        .await
        .expect("approve should succeed");
    assert_eq!(credit.status, CreditStatus::Approved);
    assert_eq!(credit.reviewed_by, Some(reviewer.id));

    store
        .transition_credit(rejected.id, CreditStatus::Pending, CreditStatus::Rejected, reviewer.id)
        .await
        .expect("reject should succeed");
    let result = store
        .transition_credit(rejected.id, CreditStatus::Pending, CreditStatus::Approved, reviewer.id)
        .await;
    assert!(matches!(result, Err(StorageError::AlreadyProcessed(_))));
    let result = store
        .transition_credit(Uuid::new_v4(), CreditStatus::Pending, CreditStatus::Approved, reviewer.id)
        .await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));

    // Applying pays out once, and only from Approved.
    let apply = |id: Uuid| {
        Posting::credit(account.id, Decimal::new(950, 2), None, "SLA credit")
            .with(Attachment::ApplySlaCredit(id))
    };
    let result = store.commit(apply(rejected.id)).await;
    assert!(matches!(result, Err(StorageError::AlreadyProcessed(_))));
    let receipt = store
        .commit(apply(approved.id))
        .await
        .expect("apply should succeed");
    assert_eq!(receipt.balance, Decimal::new(950, 2));
    let result = store.commit(apply(approved.id)).await;
    assert!(matches!(result, Err(StorageError::AlreadyProcessed(_))));

    let applied: Vec<Uuid> = store
        .credits(Some(CreditStatus::Applied))
        .await
        .expect("list should succeed")
        .into_iter()
        .filter(|c| c.proxy_type == proxy_type)
        .map(|c| c.id)
        .collect();
    assert_eq!(applied, vec![approved.id]);

    let all: Vec<Uuid> = store
        .credits(None)
        .await
        .expect("list should succeed")
        .into_iter()
        .filter(|c| c.proxy_type == proxy_type)
        .map(|c| c.id)
        .collect();
    assert_eq!(all, vec![approved.id, rejected.id]);

    let account = store
        .get_account(account.id)
        .await
        .expect("get should succeed")
        .expect("account should exist");
    assert_eq!(account.balance, Decimal::new(950, 2));
}

/// Run all SlaStore tests.
#[macro_export]
macro_rules! run_sla_store_tests {
    ($store:expr) => {
        use $crate::storage::sla_store_tests::*;

        test_configs($store).await;
        println!("  test_configs: PASSED");

        test_uptime_between($store).await;
        println!("  test_uptime_between: PASSED");

        test_credit_dedup($store).await;
        println!("  test_credit_dedup: PASSED");

        test_credit_review($store).await;
        println!("  test_credit_review: PASSED");
    };
}
