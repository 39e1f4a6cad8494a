// Activity record types and structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single recorded request against a session. Append-only; records
/// are never mutated or deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Record identifier
    pub id: String,
    /// Session the request ran under
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// What the request did
    pub action: ActivityAction,
    /// Resource path accessed
    pub resource: Option<String>,
    /// HTTP method
    pub method: Option<String>,
    /// Requester IP address
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Opaque key/value payload supplied by the request layer. Only
    /// `responseStatus` and `duration` are interpreted, for risk
    /// classification; the rest passes through untouched.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Classified risk of this activity
    pub risk_level: RiskLevel,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// Kinds of recorded session activity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Login,
    Logout,
    PageView,
    ApiCall,
    PasswordChange,
    ProfileUpdate,
    PaymentInitiated,
    WithdrawalRequest,
    SuspiciousActivity,
    SensitiveAction,
}

impl ActivityAction {
    /// Get a string representation of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::PageView => "page_view",
            ActivityAction::ApiCall => "api_call",
            ActivityAction::PasswordChange => "password_change",
            ActivityAction::ProfileUpdate => "profile_update",
            ActivityAction::PaymentInitiated => "payment_initiated",
            ActivityAction::WithdrawalRequest => "withdrawal_request",
            ActivityAction::SuspiciousActivity => "suspicious_activity",
            ActivityAction::SensitiveAction => "sensitive_action",
        }
    }
}

/// Ordinal risk classification attached to each activity record
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Query parameters for searching activity records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    /// Filter by session
    pub session_id: Option<String>,
    /// Filter by user
    pub user_id: Option<String>,
    /// Filter by action
    pub action: Option<ActivityAction>,
    /// Filter by exact risk level
    pub risk_level: Option<RiskLevel>,
    /// Filter by start timestamp
    pub start_time: Option<DateTime<Utc>>,
    /// Filter by end timestamp
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Offset for pagination
    pub offset: Option<usize>,
}

/// Aggregate activity counts for security review
#[derive(Debug, Serialize)]
pub struct ActivityStats {
    pub total_records: usize,
    pub by_risk_level: HashMap<String, usize>,
    pub by_action: HashMap<String, usize>,
    /// The 10 most recent critical-risk records
    pub recent_critical: Vec<ActivityRecord>,
}

/// Activity to be recorded, assembled with `ActivityEvent::builder()`
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub session_id: String,
    pub user_id: String,
    pub action: ActivityAction,
    pub resource: Option<String>,
    pub method: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Overrides classification when supplied
    pub risk_level: Option<RiskLevel>,
}

impl ActivityEvent {
    pub fn builder(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        action: ActivityAction,
    ) -> ActivityEventBuilder {
        ActivityEventBuilder {
            event: ActivityEvent {
                session_id: session_id.into(),
                user_id: user_id.into(),
                action,
                resource: None,
                method: None,
                ip_address: None,
                user_agent: None,
                metadata: HashMap::new(),
                risk_level: None,
            },
        }
    }
}

/// Builder for activity events
pub struct ActivityEventBuilder {
    event: ActivityEvent,
}

impl ActivityEventBuilder {
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.event.resource = Some(resource.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.event.method = Some(method.into());
        self
    }

    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.event.ip_address = Some(ip_address.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.event.user_agent = Some(user_agent.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.event.metadata.insert(key.into(), value);
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.event.risk_level = Some(risk_level);
        self
    }

    pub fn build(self) -> ActivityEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_event_builder() {
        let event = ActivityEvent::builder("sess-1", "user-123", ActivityAction::ApiCall)
            .resource("/api/loans")
            .method("GET")
            .ip_address("10.0.0.1")
            .metadata("responseStatus", serde_json::json!(200))
            .build();

        assert_eq!(event.session_id, "sess-1");
        assert_eq!(event.action, ActivityAction::ApiCall);
        assert_eq!(event.resource.as_deref(), Some("/api/loans"));
        assert_eq!(
            event.metadata.get("responseStatus"),
            Some(&serde_json::json!(200))
        );
        assert!(event.risk_level.is_none());
    }
}
