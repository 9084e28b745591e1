//! Per-key mutual exclusion.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async locks keyed by content key.
///
/// Locks are created on demand and dropped once nobody holds or waits for
/// them.
///
/// # Example
///
/// ```rust
/// use vellum_store::KeyLocks;
///
/// # async fn example() {
/// let locks = KeyLocks::default();
/// let guard = locks.lock("claims/42").await;
/// // writes to claims/42 are serialized until `guard` drops
/// drop(guard);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive hold on one key.
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyLocks {
    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };

        KeyGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of keys currently held or awaited.
    pub async fn active(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
