/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Synchronization errors with serialization support
///
/// Variants fall into four classes:
/// - contention/timeout (`WouldBlock`, `Timeout`, `Cancelled`): recoverable by retry
/// - programming errors (`NotOwner`, `WouldDeadlock`, `NotLocked`): caller bugs, never corrected
/// - batch dispatch (`NoWorkers`, `Busy`, `InvalidArgument`): reported by the work crew
/// - task lifecycle (`Spawn`, `Panicked`): thread creation and join failures
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Lock is held by another task")]
    #[diagnostic(
        code(sync::would_block),
        help("The lock is contended. Retry later or use a blocking lock.")
    )]
    WouldBlock,

    #[error("Wait timed out")]
    #[diagnostic(
        code(sync::timeout),
        help("No wakeup arrived before the deadline. Recheck the predicate and retry.")
    )]
    Timeout,

    #[error("Wait was cancelled")]
    #[diagnostic(
        code(sync::cancelled),
        help("The waiting task was asked to stop. Release held resources and exit.")
    )]
    Cancelled,

    #[error("Unlock attempted by a task that does not own the lock")]
    #[diagnostic(
        code(sync::not_owner),
        help("Only the task that locked a mutex may unlock it.")
    )]
    NotOwner,

    #[error("Normal mutex re-locked by its owner")]
    #[diagnostic(
        code(sync::would_deadlock),
        help("Use a recursive mutex if the owner needs to lock it again.")
    )]
    WouldDeadlock,

    #[error("Lock released while not held")]
    #[diagnostic(
        code(sync::not_locked),
        help("Every unlock must be paired with a prior lock.")
    )]
    NotLocked,

    #[error("No live workers can drain the batch")]
    #[diagnostic(
        code(crew::no_workers),
        help("All crew workers have finished or were cancelled. Create a new crew.")
    )]
    NoWorkers,

    #[error("Crew is busy: {0}")]
    #[diagnostic(
        code(crew::busy),
        help("A batch is still being drained or the crew is shutting down.")
    )]
    Busy(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(sync::invalid_argument))]
    InvalidArgument(String),

    #[error("Failed to start worker task: {0}")]
    #[diagnostic(
        code(task::spawn_failed),
        help("The system refused to create another thread. Try a smaller crew.")
    )]
    Spawn(String),

    #[error("Worker task panicked: {0}")]
    #[diagnostic(code(task::panicked))]
    Panicked(String),
}

impl SyncError {
    /// Stable errno-like status code for embedding code that checks numbers
    ///
    /// Success is always 0, so every error maps to a distinct non-zero value.
    pub const fn status(&self) -> i32 {
        match self {
            SyncError::NotOwner => 1,             // EPERM
            SyncError::Cancelled => 4,            // EINTR
            SyncError::NoWorkers => 10,           // ECHILD
            SyncError::Busy(_) => 11,             // EAGAIN
            SyncError::Spawn(_) => 12,            // ENOMEM
            SyncError::WouldBlock => 16,          // EBUSY
            SyncError::InvalidArgument(_) => 22,  // EINVAL
            SyncError::WouldDeadlock => 35,       // EDEADLK
            SyncError::NotLocked => 95,           // EOPNOTSUPP
            SyncError::Timeout => 110,            // ETIMEDOUT
            SyncError::Panicked(_) => 131,        // ENOTRECOVERABLE
        }
    }

    /// Contention and timeout errors are locally recoverable by retrying
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::WouldBlock | SyncError::Timeout | SyncError::Busy(_)
        )
    }
}

/// Convert an operation result into the numeric status convention (0 on success)
pub fn status_of<T>(result: &SyncResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.status(),
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;
