// End-to-end tests across the session, lockout, and activity
// components, including the concurrency properties.

use std::sync::Arc;

use chrono::{Duration, Utc};
use session_guard::activity::{
    ActivityAction, ActivityEvent, ActivityQuery, ActivityRecorder, MemoryActivityStore, RiskLevel,
};
use session_guard::config::SecurityConfig;
use session_guard::lockout::{LockoutGuard, LockoutState, LockoutStore, MemoryLockoutStore};
use session_guard::session::{MemorySessionStore, SessionManager, SessionStore};

fn security_core() -> (
    SessionManager,
    LockoutGuard,
    ActivityRecorder,
    Arc<MemorySessionStore>,
    Arc<MemoryLockoutStore>,
) {
    let config = SecurityConfig::default();
    let sessions = Arc::new(MemorySessionStore::new());
    let lockouts = Arc::new(MemoryLockoutStore::new());
    let activities = Arc::new(MemoryActivityStore::new());

    let manager = SessionManager::new(sessions.clone(), config.session.clone());
    let guard = LockoutGuard::new(lockouts.clone(), config.lockout.clone());
    let recorder = ActivityRecorder::new(activities, sessions.clone(), config.activity.clone());

    (manager, guard, recorder, sessions, lockouts)
}

#[tokio::test]
async fn cap_scenario_fourth_login_evicts_first() {
    let (manager, _, _, _, _) = security_core();

    let a = manager.create_session("member-9", None, None).await.unwrap();
    let b = manager.create_session("member-9", None, None).await.unwrap();
    let c = manager.create_session("member-9", None, None).await.unwrap();
    let d = manager.create_session("member-9", None, None).await.unwrap();

    let active = manager.get_user_sessions("member-9").await.unwrap();
    assert_eq!(active.len(), 3);

    let tokens: Vec<&str> = active.iter().map(|s| s.session_id.as_str()).collect();
    assert!(!tokens.contains(&a.session_id.as_str()));
    for survivor in [&b, &c, &d] {
        assert!(tokens.contains(&survivor.session_id.as_str()));
    }
}

#[tokio::test]
async fn cap_holds_under_concurrent_logins() {
    let (manager, _, _, _, _) = security_core();
    let manager = Arc::new(manager);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.create_session("member-9", None, None).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let active = manager.get_user_sessions("member-9").await.unwrap();
    assert!(
        active.len() <= 3,
        "cap breached: {} active sessions",
        active.len()
    );
}

#[tokio::test]
async fn sliding_expiry_renews_only_valid_sessions() {
    let (manager, _, _, sessions, _) = security_core();

    let session = manager.create_session("member-9", None, None).await.unwrap();

    // Validation before expiry slides the window forward
    let renewed = manager
        .validate_session(&session.session_id)
        .await
        .unwrap()
        .expect("session should validate");
    assert!(renewed.expires_at >= session.expires_at);

    // Force the session past its expiry; validation now rejects it
    // and marks the row terminal
    let mut expired = renewed.clone();
    expired.expires_at = Utc::now() - Duration::milliseconds(1);
    sessions.update(expired).await.unwrap();

    assert!(manager
        .validate_session(&session.session_id)
        .await
        .unwrap()
        .is_none());

    let row = sessions.get(&session.session_id).await.unwrap().unwrap();
    assert!(!row.is_active, "expired session must not be revived");
}

#[tokio::test]
async fn lockout_burst_scenario() {
    let (_, guard, _, _, _) = security_core();

    // 5 rapid failures: the 5th trips the lock
    let mut last = None;
    for _ in 0..5 {
        last = Some(guard.record_failed_attempt("member-9").await.unwrap());
    }

    let outcome = last.unwrap();
    assert!(outcome.is_locked);
    assert_eq!(outcome.remaining_attempts, 0);
    let locked_until = outcome.locked_until.unwrap();
    assert!(locked_until > Utc::now() + Duration::minutes(29));
    assert!(locked_until <= Utc::now() + Duration::minutes(30));

    assert!(guard.is_account_locked("member-9").await.unwrap());

    // Successful auth elsewhere clears everything
    guard.reset_failed_attempts("member-9").await.unwrap();
    assert!(!guard.is_account_locked("member-9").await.unwrap());
    let status = guard.lockout_status("member-9").await.unwrap();
    assert_eq!(status.failed_attempts, 0);
    assert!(status.locked_until.is_none());
}

#[tokio::test]
async fn forgiveness_window_restarts_count() {
    let (_, guard, _, _, lockouts) = security_core();

    lockouts
        .put_state(
            "member-9",
            LockoutState {
                failed_attempts: 4,
                last_failed_attempt: Some(Utc::now() - Duration::minutes(16)),
                locked_until: None,
            },
        )
        .await
        .unwrap();

    // Would have been the locking attempt inside the window; instead
    // it starts a fresh burst
    let outcome = guard.record_failed_attempt("member-9").await.unwrap();
    assert!(!outcome.is_locked);
    assert_eq!(outcome.remaining_attempts, 4);
}

#[tokio::test]
async fn expired_lock_lazily_collapses() {
    let (_, guard, _, _, lockouts) = security_core();

    lockouts
        .put_state(
            "member-9",
            LockoutState {
                failed_attempts: 5,
                last_failed_attempt: Some(Utc::now()),
                locked_until: Some(Utc::now() + Duration::milliseconds(1)),
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    assert!(!guard.is_account_locked("member-9").await.unwrap());
    let status = guard.lockout_status("member-9").await.unwrap();
    assert_eq!(status.failed_attempts, 0);
    assert!(status.locked_until.is_none());
}

#[tokio::test]
async fn activity_trail_is_append_only_and_risk_classified() {
    let (manager, _, recorder, _, _) = security_core();

    let session = manager.create_session("member-9", None, None).await.unwrap();

    recorder
        .log_session_activity(
            ActivityEvent::builder(&session.session_id, "member-9", ActivityAction::PageView)
                .resource("/dashboard")
                .method("GET")
                .metadata("responseStatus", serde_json::json!(200))
                .build(),
        )
        .await;
    recorder
        .log_session_activity(
            ActivityEvent::builder(
                &session.session_id,
                "member-9",
                ActivityAction::WithdrawalRequest,
            )
            .resource("/withdrawals")
            .method("POST")
            .build(),
        )
        .await;

    let query = ActivityQuery {
        user_id: Some("member-9".to_string()),
        ..Default::default()
    };

    let records = recorder
        .get_session_activities(query.clone(), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    // Newest first: the withdrawal is on top, classified critical
    assert_eq!(records[0].action, ActivityAction::WithdrawalRequest);
    assert_eq!(records[0].risk_level, RiskLevel::Critical);
    assert_eq!(records[1].risk_level, RiskLevel::Low);

    // The record count for a fixed filter never decreases
    recorder
        .log_session_activity(
            ActivityEvent::builder(&session.session_id, "member-9", ActivityAction::Logout)
                .build(),
        )
        .await;
    let records = recorder.get_session_activities(query, None).await.unwrap();
    assert_eq!(records.len(), 3);

    let stats = recorder
        .get_activity_stats(ActivityQuery::default())
        .await
        .unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.by_risk_level.get("critical"), Some(&1));
    assert_eq!(stats.recent_critical.len(), 1);
}

#[tokio::test]
async fn login_flow_end_to_end() {
    let (manager, guard, recorder, _, _) = security_core();

    // Two mistyped passwords, then a successful login
    assert!(!guard.is_account_locked("member-9").await.unwrap());
    guard.record_failed_attempt("member-9").await.unwrap();
    guard.record_failed_attempt("member-9").await.unwrap();

    assert!(!guard.is_account_locked("member-9").await.unwrap());
    guard.reset_failed_attempts("member-9").await.unwrap();

    let session = manager
        .create_session("member-9", Some("203.0.113.7"), Some("Mozilla/5.0"))
        .await
        .unwrap();

    recorder
        .log_session_activity(
            ActivityEvent::builder(&session.session_id, "member-9", ActivityAction::Login)
                .ip_address("203.0.113.7")
                .build(),
        )
        .await;

    // Per-request path: validate then record
    let validated = manager
        .validate_session(&session.session_id)
        .await
        .unwrap();
    assert!(validated.is_some());

    recorder.update_session_activity(&session.session_id).await;

    // Logout
    assert!(manager.invalidate_session(&session.session_id).await.unwrap());
    assert!(manager
        .validate_session(&session.session_id)
        .await
        .unwrap()
        .is_none());

    let stats = manager.get_session_stats().await.unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.active_sessions, 0);
}

#[tokio::test]
async fn sign_out_everywhere() {
    let (manager, _, _, _, _) = security_core();

    for _ in 0..3 {
        manager.create_session("member-9", None, None).await.unwrap();
    }
    manager.create_session("member-10", None, None).await.unwrap();

    let count = manager
        .invalidate_all_user_sessions("member-9")
        .await
        .unwrap();
    assert_eq!(count, 3);

    assert!(manager.get_user_sessions("member-9").await.unwrap().is_empty());
    assert_eq!(manager.get_user_sessions("member-10").await.unwrap().len(), 1);
}
