// Activity record storage backends

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{ActivityQuery, ActivityRecord};
use crate::error::SecurityError;

/// Trait for activity storage backends
///
/// Deliberately append-and-read only: the audit trail offers no
/// update or delete surface.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Append an activity record
    async fn append(&self, record: ActivityRecord) -> Result<(), SecurityError>;

    /// Query records, most recent first
    async fn query(&self, query: ActivityQuery) -> Result<Vec<ActivityRecord>, SecurityError>;
}

/// In-memory activity store
pub struct MemoryActivityStore {
    records: Arc<RwLock<Vec<ActivityRecord>>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn append(&self, record: ActivityRecord) -> Result<(), SecurityError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: ActivityQuery) -> Result<Vec<ActivityRecord>, SecurityError> {
        let records = self.records.read().await;

        let mut results: Vec<ActivityRecord> = records
            .iter()
            .filter(|record| {
                if let Some(ref session_id) = query.session_id {
                    if &record.session_id != session_id {
                        return false;
                    }
                }

                if let Some(ref user_id) = query.user_id {
                    if &record.user_id != user_id {
                        return false;
                    }
                }

                if let Some(action) = query.action {
                    if record.action != action {
                        return false;
                    }
                }

                if let Some(risk_level) = query.risk_level {
                    if record.risk_level != risk_level {
                        return false;
                    }
                }

                if let Some(start_time) = query.start_time {
                    if record.created_at < start_time {
                        return false;
                    }
                }

                if let Some(end_time) = query.end_time {
                    if record.created_at > end_time {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        // Most recent first
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = query.offset.unwrap_or(0);
        let results = match query.limit {
            Some(limit) => results.into_iter().skip(offset).take(limit).collect(),
            None => results.into_iter().skip(offset).collect(),
        };

        Ok(results)
    }
}
