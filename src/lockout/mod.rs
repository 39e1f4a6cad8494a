// Brute-force lockout: failed-attempt counting with a forgiveness
// window and lazily expiring locks

pub mod guard;
pub mod storage;
pub mod types;

pub use guard::LockoutGuard;
pub use storage::{LockoutStore, MemoryLockoutStore};
pub use types::{AccountLockoutStatus, FailedAttemptOutcome, LockoutState};
