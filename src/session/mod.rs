// Session lifecycle: creation, sliding validation, invalidation

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::{SessionManager, SessionStats};
pub use storage::{MemorySessionStore, SessionStore};
pub use types::Session;
