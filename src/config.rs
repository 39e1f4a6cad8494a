// Security core configuration

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::SecurityError;

/// Top-level configuration for the session security core
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub session: SessionConfig,
    pub lockout: LockoutConfig,
    pub activity: ActivityConfig,
}

/// Session lifetime and concurrency settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sliding expiration window in seconds
    pub timeout_secs: i64,
    /// Maximum concurrent active sessions per user
    pub max_concurrent_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1800,         // 30 minute sliding window
            max_concurrent_sessions: 3,
        }
    }
}

/// Brute-force lockout settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failed attempts within the forgiveness window before locking
    pub max_failed_attempts: u32,
    /// Gap after which a new failure starts a fresh burst, in seconds
    pub forgiveness_window_secs: i64,
    /// How long a tripped lock holds, in seconds
    pub lockout_duration_secs: i64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            forgiveness_window_secs: 900,  // 15 minutes
            lockout_duration_secs: 1800,   // 30 minutes
        }
    }
}

/// Activity risk-classification settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Requests slower than this (milliseconds) classify as Medium risk
    pub slow_request_threshold_ms: i64,
    /// Resource path prefixes that classify as High risk
    pub sensitive_prefixes: Vec<String>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold_ms: 30_000,
            sensitive_prefixes: vec![
                "/admin".to_string(),
                "/settings/security".to_string(),
                "/payments".to_string(),
                "/withdrawals".to_string(),
            ],
        }
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), SecurityError> {
        if self.session.timeout_secs <= 0 {
            return Err(SecurityError::Config(
                "session.timeout_secs must be positive".to_string(),
            ));
        }
        if self.session.max_concurrent_sessions == 0 {
            return Err(SecurityError::Config(
                "session.max_concurrent_sessions must be at least 1".to_string(),
            ));
        }
        if self.lockout.max_failed_attempts == 0 {
            return Err(SecurityError::Config(
                "lockout.max_failed_attempts must be at least 1".to_string(),
            ));
        }
        if self.lockout.forgiveness_window_secs <= 0 || self.lockout.lockout_duration_secs <= 0 {
            return Err(SecurityError::Config(
                "lockout windows must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SecurityConfig, SecurityError> {
    let path = path.as_ref();
    info!("Loading security configuration from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|e| {
        SecurityError::Config(format!(
            "failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config: SecurityConfig = serde_yaml::from_str(&contents)
        .map_err(|e| SecurityError::Config(format!("failed to parse YAML config: {}", e)))?;

    config.validate()?;

    Ok(config)
}

/// Load configuration with fallback options
///
/// Tries the SESSION_GUARD_CONFIG environment variable, then common
/// file locations, and finally falls back to the built-in defaults so
/// the core is usable without any config file.
pub fn load_config_with_fallback() -> SecurityConfig {
    if let Ok(config_path) = std::env::var("SESSION_GUARD_CONFIG") {
        match load_config(&config_path) {
            Ok(config) => return config,
            Err(e) => warn!(
                "Failed to load config from SESSION_GUARD_CONFIG ({}): {}",
                config_path, e
            ),
        }
    }

    let paths = ["session-guard.yaml", "session-guard.yml"];

    for path in paths {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    SecurityConfig::default()
}
