// Session activity recording and risk classification

pub mod recorder;
pub mod storage;
pub mod types;

pub use recorder::ActivityRecorder;
pub use storage::{ActivityStore, MemoryActivityStore};
pub use types::{
    ActivityAction, ActivityEvent, ActivityQuery, ActivityRecord, ActivityStats, RiskLevel,
};
