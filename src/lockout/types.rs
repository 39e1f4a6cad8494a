// Lockout types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-account lockout fields
///
/// Default is the pristine unlocked state; accounts with no stored row
/// read as default. `locked_until` is set only when the attempt
/// threshold is reached, and a reset clears every field together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutState {
    /// Failed attempts in the current burst
    pub failed_attempts: u32,
    /// When the most recent failure happened
    pub last_failed_attempt: Option<DateTime<Utc>>,
    /// End of the active lock, if one is in force
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Whether a lock is in force at `now`
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Collapse an expired lock back to the pristine state.
    ///
    /// Returns true when the state transitioned, so callers know to
    /// persist. An in-force lock and an already-clean state are left
    /// untouched.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) if until <= now => {
                *self = LockoutState::default();
                true
            }
            _ => false,
        }
    }
}

/// Result of recording a failed login attempt
#[derive(Debug, Clone, Serialize)]
pub struct FailedAttemptOutcome {
    /// Whether this attempt tripped (or found) a lock
    pub is_locked: bool,
    /// Attempts left before the account locks
    pub remaining_attempts: u32,
    /// End of the lock when `is_locked` is true
    pub locked_until: Option<DateTime<Utc>>,
}

/// Composite lockout read for admin tooling
#[derive(Debug, Clone, Serialize)]
pub struct AccountLockoutStatus {
    pub failed_attempts: u32,
    pub last_failed_attempt: Option<DateTime<Utc>>,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    /// Ceiling of the remaining lock time in minutes
    pub remaining_minutes: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_state_is_unlocked() {
        let state = LockoutState::default();
        assert!(!state.is_locked(Utc::now()));
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn test_reconcile_clears_expired_lock() {
        let now = Utc::now();
        let mut state = LockoutState {
            failed_attempts: 5,
            last_failed_attempt: Some(now - Duration::minutes(31)),
            locked_until: Some(now - Duration::seconds(1)),
        };

        assert!(state.reconcile(now));
        assert_eq!(state, LockoutState::default());
    }

    #[test]
    fn test_reconcile_keeps_active_lock() {
        let now = Utc::now();
        let mut state = LockoutState {
            failed_attempts: 5,
            last_failed_attempt: Some(now),
            locked_until: Some(now + Duration::minutes(30)),
        };

        assert!(!state.reconcile(now));
        assert!(state.is_locked(now));
        assert_eq!(state.failed_attempts, 5);
    }
}
