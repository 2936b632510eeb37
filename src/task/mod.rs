/*!
 * Worker Tasks
 *
 * Thin lifecycle wrapper over an OS thread: start, cooperative cancel,
 * join, liveness and identity for diagnostics. A task is never killed;
 * cancellation is a token the body checks at its suspension points.
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{AtomicCell, CancelToken, MemoryOrder};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Worker task identifier
pub type TaskId = usize;

/// Handle to a running (or finished) worker thread
pub struct WorkerTask {
    id: TaskId,
    name: String,
    cancel: CancelToken,
    running: Arc<AtomicCell<i32>>,
    handle: Option<JoinHandle<()>>,
}

/// Clears the running flag however the body exits
struct RunningGuard(Arc<AtomicCell<i32>>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.exchange(0, MemoryOrder::Release);
    }
}

impl WorkerTask {
    /// Spawn `body` on a new named thread; it receives the task's cancel token
    pub fn start<F>(
        id: TaskId,
        name: impl Into<String>,
        cancel: CancelToken,
        body: F,
    ) -> SyncResult<Self>
    where
        F: FnOnce(&CancelToken) + Send + 'static,
    {
        let name = name.into();
        let running = Arc::new(AtomicCell::new(1));
        let flag = RunningGuard(running.clone());
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _flag = flag;
                body(&token);
            })
            .map_err(|e| {
                // The closure (and its guard) was dropped, so `running` is already 0
                warn!(task_id = id, task = %name, error = %e, "Failed to spawn worker task");
                SyncError::Spawn(e.to_string())
            })?;

        debug!(task_id = id, task = %name, "Worker task started");
        Ok(Self {
            id,
            name,
            cancel,
            running,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the task to stop at its next suspension point
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            debug!(task_id = self.id, task = %self.name, "Worker task cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the body is still executing
    pub fn is_running(&self) -> bool {
        self.running.load(MemoryOrder::Acquire) != 0
    }

    /// Wait for the body to return; a panic is reported as `Panicked`
    pub fn join(mut self) -> SyncResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(task_id = self.id, task = %self.name, panic = %message, "Worker task panicked");
            SyncError::Panicked(message)
        })
    }

    /// Let the thread run on unobserved
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl fmt::Debug for WorkerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerTask")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
