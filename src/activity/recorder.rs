// Activity recorder: fail-silent audit logging and risk classification

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use super::storage::ActivityStore;
use super::types::{
    ActivityAction, ActivityEvent, ActivityQuery, ActivityRecord, ActivityStats, RiskLevel,
};
use crate::config::ActivityConfig;
use crate::error::SecurityError;
use crate::session::storage::SessionStore;

const DEFAULT_PAGE_SIZE: usize = 100;
const RECENT_CRITICAL_COUNT: usize = 10;

/// Records per-request activity against sessions and classifies risk.
///
/// Everything on the write path is fire-and-forget: a storage failure
/// here must never break the request being served, so errors are
/// logged and swallowed. This is the opposite of the session and
/// lockout paths, which fail loud.
pub struct ActivityRecorder {
    store: Arc<dyn ActivityStore>,
    sessions: Arc<dyn SessionStore>,
    config: ActivityConfig,
}

impl ActivityRecorder {
    /// Create a new activity recorder
    pub fn new(
        store: Arc<dyn ActivityStore>,
        sessions: Arc<dyn SessionStore>,
        config: ActivityConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            config,
        }
    }

    /// Record an activity event. Never fails; storage errors are
    /// logged at `error` and swallowed.
    pub async fn log_session_activity(&self, event: ActivityEvent) {
        if let Err(e) = self.try_log(event).await {
            error!("Failed to record session activity: {}", e);
        }
    }

    async fn try_log(&self, event: ActivityEvent) -> Result<(), SecurityError> {
        let now = Utc::now();

        // Keep the liveness timestamp fresh, but only while the
        // session is still active; a heartbeat must not revive a
        // terminated row
        self.sessions
            .touch_last_activity(&event.session_id, now)
            .await?;

        let risk_level = event.risk_level.unwrap_or_else(|| {
            self.classify_risk(event.action, event.resource.as_deref(), &event.metadata)
        });

        let record = ActivityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: event.session_id,
            user_id: event.user_id,
            action: event.action,
            resource: event.resource,
            method: event.method,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            metadata: event.metadata,
            risk_level,
            created_at: now,
        };

        self.store.append(record).await
    }

    /// Classify the risk of an activity.
    ///
    /// Deterministic ordered precedence; action-based rules always
    /// dominate resource- and metadata-based ones.
    pub fn classify_risk(
        &self,
        action: ActivityAction,
        resource: Option<&str>,
        metadata: &HashMap<String, serde_json::Value>,
    ) -> RiskLevel {
        match action {
            ActivityAction::PasswordChange
            | ActivityAction::WithdrawalRequest
            | ActivityAction::SuspiciousActivity
            | ActivityAction::SensitiveAction => return RiskLevel::Critical,
            ActivityAction::PaymentInitiated | ActivityAction::ProfileUpdate => {
                return RiskLevel::High
            }
            _ => {}
        }

        if let Some(status) = metadata.get("responseStatus").and_then(|v| v.as_i64()) {
            if (400..500).contains(&status) {
                return RiskLevel::Medium;
            }
            if status >= 500 {
                return RiskLevel::Low;
            }
        }

        if let Some(duration) = metadata.get("duration").and_then(|v| v.as_i64()) {
            if duration > self.config.slow_request_threshold_ms {
                return RiskLevel::Medium;
            }
        }

        if let Some(resource) = resource {
            if self
                .config
                .sensitive_prefixes
                .iter()
                .any(|prefix| resource.starts_with(prefix.as_str()))
            {
                return RiskLevel::High;
            }
        }

        RiskLevel::Low
    }

    /// Read a page of activity records, most recent first
    pub async fn get_session_activities(
        &self,
        mut query: ActivityQuery,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityRecord>, SecurityError> {
        query.limit = Some(limit.unwrap_or(DEFAULT_PAGE_SIZE));
        self.store.query(query).await
    }

    /// Aggregate totals by risk level and action for a filter, plus
    /// the most recent critical-risk records
    pub async fn get_activity_stats(
        &self,
        mut query: ActivityQuery,
    ) -> Result<ActivityStats, SecurityError> {
        query.limit = None;
        query.offset = None;

        let records = self.store.query(query).await?;

        let mut stats = ActivityStats {
            total_records: records.len(),
            by_risk_level: HashMap::new(),
            by_action: HashMap::new(),
            recent_critical: Vec::new(),
        };

        for record in &records {
            *stats
                .by_risk_level
                .entry(record.risk_level.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_action
                .entry(record.action.as_str().to_string())
                .or_insert(0) += 1;
        }

        // Records arrive newest first, so the first N criticals are
        // the most recent ones
        stats.recent_critical = records
            .into_iter()
            .filter(|r| r.risk_level == RiskLevel::Critical)
            .take(RECENT_CRITICAL_COUNT)
            .collect();

        Ok(stats)
    }

    /// Lightweight heartbeat touching only the session's
    /// `last_activity_at`. Fail-silent like the rest of this path.
    pub async fn update_session_activity(&self, session_id: &str) {
        if let Err(e) = self
            .sessions
            .touch_last_activity(session_id, Utc::now())
            .await
        {
            error!("Failed to touch session {}: {}", session_id, e);
        }
    }
}
