// Session types and data structures

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// An authenticated session with sliding expiration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Row identifier
    pub id: String,
    /// Opaque session token presented by the client
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// IP address the session was created from
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// False is terminal; an inactive session is never revived
    pub is_active: bool,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Last recorded request against this session
    pub last_activity_at: DateTime<Utc>,
    /// When the session expires; pushed forward on each validation
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new active session expiring one timeout from now
    pub fn new(
        user_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
        config: &SessionConfig,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: generate_session_token(),
            user_id,
            ip_address,
            user_agent,
            is_active: true,
            created_at: now,
            last_activity_at: now,
            expires_at: now + Duration::seconds(config.timeout_secs),
        }
    }

    /// Whether the session is active and unexpired at `now`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// Collapse an expired-but-still-active row to its terminal state.
    ///
    /// Returns true when the row transitioned, so callers know to
    /// persist. Applied on every read path; there is no background
    /// sweep.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active && self.expires_at <= now {
            self.is_active = false;
            return true;
        }
        false
    }

    /// Mark the session terminated
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Generate a session token: 32 bytes from the OS RNG, URL-safe
/// base64 without padding. Fixed 43-character length, 256 bits of
/// entropy.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_valid() {
        let config = SessionConfig::default();
        let session = Session::new(
            "user-123".to_string(),
            Some("192.168.1.1".to_string()),
            Some("Mozilla/5.0".to_string()),
            &config,
        );

        assert!(session.is_active);
        assert!(session.is_valid(Utc::now()));
        assert!(session.expires_at > session.created_at);
    }

    #[test]
    fn test_reconcile_marks_expired_terminal() {
        let config = SessionConfig::default();
        let mut session = Session::new("user-123".to_string(), None, None, &config);

        let before_expiry = session.expires_at - Duration::seconds(1);
        assert!(!session.reconcile(before_expiry));
        assert!(session.is_active);

        let at_expiry = session.expires_at;
        assert!(session.reconcile(at_expiry));
        assert!(!session.is_active);

        // Already terminal; no further transition
        assert!(!session.reconcile(at_expiry));
    }

    #[test]
    fn test_token_is_fixed_length_url_safe() {
        let token = generate_session_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );

        // Two draws should never collide
        assert_ne!(token, generate_session_token());
    }
}
