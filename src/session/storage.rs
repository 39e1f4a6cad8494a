// Session storage backends

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::Session;
use crate::error::SecurityError;

/// Trait for session storage backends
///
/// Policy (the concurrency cap, when to renew) lives in
/// `SessionManager`; the state transitions themselves are conditional
/// writes applied under the store's write lock. Renewal and
/// deactivation never replace a whole row, so an in-flight validation
/// cannot write back a stale active snapshot over a sign-out.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session
    async fn insert(&self, session: Session) -> Result<(), SecurityError>;

    /// Get a session by its token
    async fn get(&self, session_id: &str) -> Result<Option<Session>, SecurityError>;

    /// Replace an existing session row
    async fn update(&self, session: Session) -> Result<(), SecurityError>;

    /// Get all sessions for a user, in no particular order
    async fn user_sessions(&self, user_id: &str) -> Result<Vec<Session>, SecurityError>;

    /// Get every session row
    async fn all_sessions(&self) -> Result<Vec<Session>, SecurityError>;

    /// Slide `expires_at` on a still-valid session.
    ///
    /// The active-and-unexpired check and the write happen under the
    /// store's write lock; a row that expired or was deactivated in
    /// the meantime comes back as None (expired rows are collapsed to
    /// terminal on the way). This is the only life-extending write.
    async fn renew_if_valid(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, SecurityError>;

    /// Mark a session inactive in place. Idempotent; returns true
    /// when the row exists, false for unknown tokens.
    async fn deactivate(&self, session_id: &str) -> Result<bool, SecurityError>;

    /// Mark every active session for a user inactive in place.
    /// Returns the number of rows transitioned.
    async fn deactivate_user_sessions(&self, user_id: &str) -> Result<usize, SecurityError>;

    /// Set `last_activity_at` on a still-active session.
    ///
    /// Returns false when the session is missing or already inactive;
    /// the write must not revive a terminated row.
    async fn touch_last_activity(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, SecurityError>;
}

/// In-memory session store, keyed by session token
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), SecurityError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, SecurityError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn update(&self, session: Session) -> Result<(), SecurityError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn user_sessions(&self, user_id: &str) -> Result<Vec<Session>, SecurityError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_sessions(&self) -> Result<Vec<Session>, SecurityError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().cloned().collect())
    }

    async fn renew_if_valid(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, SecurityError> {
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(None);
        };

        if session.reconcile(now) || !session.is_active {
            return Ok(None);
        }

        session.expires_at = expires_at;
        Ok(Some(session.clone()))
    }

    async fn deactivate(&self, session_id: &str) -> Result<bool, SecurityError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(session) => {
                session.deactivate();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn deactivate_user_sessions(&self, user_id: &str) -> Result<usize, SecurityError> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;

        for session in sessions.values_mut() {
            if session.user_id == user_id && session.is_active {
                session.deactivate();
                count += 1;
            }
        }

        Ok(count)
    }

    async fn touch_last_activity(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, SecurityError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(session_id) {
            Some(session) if session.is_active => {
                session.last_activity_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
