use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::AccountId;

use super::AppError;

/// One async mutex per account id, created on first use.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

/// Holds the locks of both accounts involved in a transfer. Dropping it
/// releases them.
#[derive(Debug)]
pub struct PairGuard {
    _low: OwnedMutexGuard<()>,
    _high: Option<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: AccountId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().await;
        slots.entry(id).or_default().clone()
    }

    /// Lock both accounts, lowest id first, so two transfers over the same
    /// pair can never wait on each other in opposite order.
    pub async fn lock_pair(&self, a: AccountId, b: AccountId) -> PairGuard {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let low_guard = self.slot(low).await.lock_owned().await;
        let high_guard = if high == low {
            None
        } else {
            Some(self.slot(high).await.lock_owned().await)
        };

        PairGuard {
            _low: low_guard,
            _high: high_guard,
        }
    }

    /// Like [`lock_pair`](Self::lock_pair), but fails with `ConflictOrTimeout`
    /// if both locks are not held within `timeout`. A lock already taken when
    /// the deadline passes is released.
    pub async fn lock_pair_within(
        &self,
        a: AccountId,
        b: AccountId,
        timeout: Duration,
    ) -> Result<PairGuard, AppError> {
        tokio::time::timeout(timeout, self.lock_pair(a, b))
            .await
            .map_err(|_| {
                AppError::ConflictOrTimeout(format!(
                    "timed out after {:?} waiting for accounts {} and {}",
                    timeout, a, b
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overlapping_pair_waits() {
        let locks = AccountLocks::new();
        let held = locks.lock_pair(1, 2).await;

        let err = locks
            .lock_pair_within(2, 3, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConflictOrTimeout(_)));

        drop(held);
        locks
            .lock_pair_within(2, 3, Duration::from_millis(20))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_pairs_do_not_block() {
        let locks = AccountLocks::new();
        let _held = locks.lock_pair(1, 2).await;
        locks
            .lock_pair_within(3, 4, Duration::from_millis(20))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_timed_out_attempt_releases_partial_lock() {
        let locks = AccountLocks::new();
        let held = locks.lock_pair(5, 6).await;

        // Takes 1, then stalls on 5
        assert!(
            locks
                .lock_pair_within(1, 5, Duration::from_millis(20))
                .await
                .is_err()
        );

        // 1 must be free again
        locks
            .lock_pair_within(1, 2, Duration::from_millis(20))
            .await
            .unwrap();
        drop(held);
    }
}
