/*!
 * Crew Sync Library
 * Portable synchronization primitives and the work crew built on them
 */

pub mod core;
pub mod crew;
pub mod monitoring;
pub mod task;

// Re-exports
pub use crate::core::errors::{status_of, SyncError, SyncResult};
pub use crate::core::sync::{
    AtomicCell, AtomicPointer, Barrier, CancelToken, Condition, Event, MemoryOrder, Mutex,
    MutexKind, Protected, SpinLock,
};
pub use crew::{Crew, CrewConfig, CrewStats, ShutdownReport, WorkItem, Workload};
pub use monitoring::init_tracing;
pub use task::WorkerTask;
