// Per-user serialization primitive

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-user async mutexes.
///
/// The session cap check-evict-insert sequence and the lockout counter
/// read-modify-write are the two paths where a bare read-then-write
/// races under parallel requests. Both run while holding the guard for
/// their user id, so updates for one user are linearized while distinct
/// users proceed in parallel.
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for a user, creating it on first use.
    ///
    /// The guard is owned, so it can be held across awaits on storage
    /// calls. Dropping it releases the user's lock.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;

            // Reap entries nobody holds or waits on; guards and
            // waiters each keep a clone, so a strong count of one
            // means only the map still references the mutex
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);

            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked_users(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}
