//! Per-account mutual exclusion.
//!
//! Every balance mutation holds its account's lock from the balance check to
//! the commit. Locks are created on first use and dropped from the map when
//! the last holder releases them, so the map only holds accounts that are
//! currently busy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = HashMap<Uuid, Arc<Mutex<()>>>;

/// Keyed async locks, one per account id.
#[derive(Default, Clone)]
pub struct AccountLocks {
    locks: Arc<StdMutex<LockMap>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account_id`.
    pub async fn lock(&self, account_id: Uuid) -> AccountGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(account_id).or_default())
        };
        let guard = mutex.lock_owned().await;
        AccountGuard {
            account_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of accounts with a live lock entry.
    pub fn active(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Exclusive access to one account until dropped.
pub struct AccountGuard {
    account_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl AccountGuard {
    pub fn account_id(&self) -> Uuid {
        self.account_id
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(guard) = self.guard.take() {
            let mutex = Arc::clone(OwnedMutexGuard::mutex(&guard));
            drop(guard);
            // Map entry, this clone: nobody else holds or waits for the lock.
            if Arc::strong_count(&mutex) == 2 {
                locks.remove(&self.account_id);
            }
        }
    }
}
