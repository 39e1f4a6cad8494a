// Lockout storage backends

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::LockoutState;
use crate::error::SecurityError;

/// Trait for lockout storage backends
///
/// In a durable deployment these are fields on the account record;
/// the trait reads them as a unit and writes them back as a unit so a
/// reset can never clear one field without the others.
#[async_trait]
pub trait LockoutStore: Send + Sync {
    /// Read the lockout fields for an account. Accounts with no stored
    /// row come back as the pristine default state.
    async fn get_state(&self, user_id: &str) -> Result<LockoutState, SecurityError>;

    /// Write the lockout fields for an account
    async fn put_state(&self, user_id: &str, state: LockoutState) -> Result<(), SecurityError>;
}

/// In-memory lockout store
pub struct MemoryLockoutStore {
    states: Arc<RwLock<HashMap<String, LockoutState>>>,
}

impl MemoryLockoutStore {
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryLockoutStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockoutStore for MemoryLockoutStore {
    async fn get_state(&self, user_id: &str) -> Result<LockoutState, SecurityError> {
        let states = self.states.read().await;
        Ok(states.get(user_id).cloned().unwrap_or_default())
    }

    async fn put_state(&self, user_id: &str, state: LockoutState) -> Result<(), SecurityError> {
        let mut states = self.states.write().await;
        states.insert(user_id.to_string(), state);
        Ok(())
    }
}
