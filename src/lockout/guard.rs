// Failed-login tracking and account lockout

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::storage::LockoutStore;
use super::types::{AccountLockoutStatus, FailedAttemptOutcome, LockoutState};
use crate::config::LockoutConfig;
use crate::error::SecurityError;
use crate::sync::UserLocks;

/// Tracks failed-login counters and lock state per account.
///
/// Locks expire lazily: every read applies `LockoutState::reconcile`
/// and heals the row in place, so no background sweep is needed.
pub struct LockoutGuard {
    store: Arc<dyn LockoutStore>,
    config: LockoutConfig,
    user_locks: UserLocks,
}

impl LockoutGuard {
    /// Create a new lockout guard
    pub fn new(store: Arc<dyn LockoutStore>, config: LockoutConfig) -> Self {
        Self {
            store,
            config,
            user_locks: UserLocks::new(),
        }
    }

    /// Whether the account is currently locked.
    ///
    /// An expired lock is cleared and its counter zeroed as a side
    /// effect before returning false.
    pub async fn is_account_locked(&self, user_id: &str) -> Result<bool, SecurityError> {
        let mut state = self.store.get_state(user_id).await?;
        let now = Utc::now();

        if state.reconcile(now) {
            info!("Lockout on account {} expired; clearing", user_id);
            self.store.put_state(user_id, state).await?;
            return Ok(false);
        }

        Ok(state.is_locked(now))
    }

    /// Minutes left on an active lock, rounded up; None when unlocked
    pub async fn remaining_lockout_time(
        &self,
        user_id: &str,
    ) -> Result<Option<i64>, SecurityError> {
        let state = self.store.get_state(user_id).await?;
        Ok(remaining_minutes(&state, Utc::now()))
    }

    /// Record a failed login attempt.
    ///
    /// A failure more than one forgiveness window after the previous
    /// one starts a fresh burst at count 1; otherwise the counter
    /// increments. Reaching the threshold sets the lock. The
    /// read-modify-write runs under the user's lock so parallel
    /// failures cannot lose increments.
    pub async fn record_failed_attempt(
        &self,
        user_id: &str,
    ) -> Result<FailedAttemptOutcome, SecurityError> {
        let _guard = self.user_locks.acquire(user_id).await;

        let mut state = self.store.get_state(user_id).await?;
        let now = Utc::now();

        // A lock that lapsed without an intervening is_account_locked
        // read must not leak into this outcome
        state.reconcile(now);

        let forgiveness = Duration::seconds(self.config.forgiveness_window_secs);
        let within_window = state
            .last_failed_attempt
            .is_some_and(|last| now - last <= forgiveness);

        state.failed_attempts = if within_window {
            state.failed_attempts + 1
        } else {
            1
        };
        state.last_failed_attempt = Some(now);

        if state.failed_attempts >= self.config.max_failed_attempts {
            state.locked_until = Some(now + Duration::seconds(self.config.lockout_duration_secs));
            warn!(
                "Account {} locked after {} failed attempts",
                user_id, state.failed_attempts
            );
        }

        let outcome = FailedAttemptOutcome {
            is_locked: state.locked_until.is_some(),
            remaining_attempts: self
                .config
                .max_failed_attempts
                .saturating_sub(state.failed_attempts),
            locked_until: state.locked_until,
        };

        self.store.put_state(user_id, state).await?;

        Ok(outcome)
    }

    /// Clear all lockout fields after a successful authentication
    pub async fn reset_failed_attempts(&self, user_id: &str) -> Result<(), SecurityError> {
        self.store
            .put_state(user_id, LockoutState::default())
            .await
    }

    /// Admin override: clear the lock and counters in any state
    pub async fn unlock_account(&self, user_id: &str) -> Result<(), SecurityError> {
        self.store
            .put_state(user_id, LockoutState::default())
            .await?;
        info!("Account {} unlocked by operator", user_id);
        Ok(())
    }

    /// Composite lockout read for admin tooling.
    ///
    /// Read-only: an expired lock reports as clean here but the row
    /// itself is healed by the next `is_account_locked` call.
    pub async fn lockout_status(
        &self,
        user_id: &str,
    ) -> Result<AccountLockoutStatus, SecurityError> {
        let mut state = self.store.get_state(user_id).await?;
        let now = Utc::now();

        state.reconcile(now);

        Ok(AccountLockoutStatus {
            failed_attempts: state.failed_attempts,
            last_failed_attempt: state.last_failed_attempt,
            is_locked: state.is_locked(now),
            locked_until: state.locked_until,
            remaining_minutes: remaining_minutes(&state, now),
        })
    }
}

fn remaining_minutes(state: &LockoutState, now: chrono::DateTime<Utc>) -> Option<i64> {
    let until = state.locked_until.filter(|until| *until > now)?;
    // Ceiling over milliseconds so 1m01s reports as 2 minutes
    let millis = (until - now).num_milliseconds();
    Some((millis + 59_999) / 60_000)
}
