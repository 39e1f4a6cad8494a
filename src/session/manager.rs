// Session manager for high-level session operations

use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::SessionStore;
use super::types::Session;
use crate::config::SessionConfig;
use crate::error::SecurityError;
use crate::sync::UserLocks;

/// Session manager handling session lifecycle and the concurrency cap
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    user_locks: UserLocks,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, mut config: SessionConfig) -> Self {
        // A cap of zero would make every login unsatisfiable
        if config.max_concurrent_sessions == 0 {
            warn!("max_concurrent_sessions of 0 is not usable; clamping to 1");
            config.max_concurrent_sessions = 1;
        }

        Self {
            store,
            config,
            user_locks: UserLocks::new(),
        }
    }

    /// Create a new session for a user, enforcing the concurrency cap.
    ///
    /// Runs under the user's lock: two parallel logins must not both
    /// observe `count = cap - 1` and insert past the cap. Expired rows
    /// are reconciled first so stale sessions never count against the
    /// cap; if the user is still at the cap, the oldest active sessions
    /// are evicted until the new one fits.
    pub async fn create_session(
        &self,
        user_id: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<Session, SecurityError> {
        let _guard = self.user_locks.acquire(user_id).await;

        let mut sessions = self.store.user_sessions(user_id).await?;
        let now = Utc::now();

        for session in sessions.iter_mut() {
            if session.reconcile(now) {
                debug!("Expiring stale session {} for user {}", session.session_id, user_id);
                self.store.deactivate(&session.session_id).await?;
            }
        }

        let mut active: Vec<Session> = sessions.into_iter().filter(|s| s.is_valid(now)).collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        // Evict oldest-first until the new session fits under the cap
        let cap = self.config.max_concurrent_sessions;
        if active.len() >= cap {
            let excess = active.len() - (cap - 1);
            for victim in active.drain(..excess) {
                warn!(
                    "User {} at session cap; evicting oldest session {}",
                    user_id, victim.session_id
                );
                self.store.deactivate(&victim.session_id).await?;
            }
        }

        let session = Session::new(
            user_id.to_string(),
            ip_address.map(|s| s.to_string()),
            user_agent.map(|s| s.to_string()),
            &self.config,
        );

        self.store.insert(session.clone()).await?;

        info!("Created session {} for user {}", session.session_id, user_id);

        Ok(session)
    }

    /// Validate a session token and slide its expiration.
    ///
    /// Returns None for unknown, inactive, or expired tokens. Expired
    /// rows are marked terminal on the way out. A valid hit gets
    /// `expires_at = now + timeout` persisted; this is the only path
    /// that extends a session's life.
    ///
    /// The renewal is a single conditional store write, not a
    /// get-then-update: a sign-out landing while this call is in
    /// flight wins, and the terminated row stays terminal.
    pub async fn validate_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Session>, SecurityError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.timeout_secs);

        self.store.renew_if_valid(session_id, now, expires_at).await
    }

    /// Mark a session inactive. Idempotent; returns true when the
    /// session exists, false for unknown tokens.
    pub async fn invalidate_session(&self, session_id: &str) -> Result<bool, SecurityError> {
        let found = self.store.deactivate(session_id).await?;

        if found {
            info!("Invalidated session {}", session_id);
        }

        Ok(found)
    }

    /// Mark every active session for a user inactive (sign out
    /// everywhere). Returns the number of sessions transitioned.
    pub async fn invalidate_all_user_sessions(
        &self,
        user_id: &str,
    ) -> Result<usize, SecurityError> {
        let count = self.store.deactivate_user_sessions(user_id).await?;

        info!("Invalidated {} sessions for user {}", count, user_id);
        Ok(count)
    }

    /// Active, unexpired sessions for a user, newest first
    pub async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<Session>, SecurityError> {
        let now = Utc::now();
        let mut sessions: Vec<Session> = self
            .store
            .user_sessions(user_id)
            .await?
            .into_iter()
            .filter(|s| s.is_valid(now))
            .collect();

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(sessions)
    }

    /// Aggregate session counts for operations dashboards
    pub async fn get_session_stats(&self) -> Result<SessionStats, SecurityError> {
        let sessions = self.store.all_sessions().await?;
        let now = Utc::now();

        let mut stats = SessionStats {
            total_sessions: sessions.len(),
            active_sessions: 0,
            inactive_sessions: 0,
            users_with_active_sessions: 0,
        };

        let mut active_users = HashSet::new();

        for session in &sessions {
            if session.is_valid(now) {
                stats.active_sessions += 1;
                active_users.insert(session.user_id.as_str());
            } else {
                stats.inactive_sessions += 1;
            }
        }

        stats.users_with_active_sessions = active_users.len();

        Ok(stats)
    }
}

/// Session statistics for monitoring
#[derive(Debug, serde::Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub inactive_sessions: usize,
    pub users_with_active_sessions: usize,
}
