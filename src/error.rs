// Error types shared across the security core

/// Errors surfaced by the session security core.
///
/// Negative lookups (unknown session, unlocked account) are not errors;
/// they come back as `None`/`false` from the component APIs. Only
/// storage failures and configuration problems land here.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// The backing store was unreachable or a write failed. Session and
    /// lockout mutations propagate this to the caller; activity logging
    /// catches and logs it instead.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
