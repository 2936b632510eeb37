/*!
 * Work Crew
 *
 * Fixed-size worker pool drained by a coordinating producer.
 *
 * # Protocol
 *
 * - All workers plus the creator rendezvous once at a startup barrier sized
 *   `size + 1`, so no worker sees a half-built crew
 * - `start` enqueues a batch under the crew mutex, adds it to the pending
 *   count and broadcasts `go`; it then waits on `done` until pending is zero
 * - Any wait error rolls the batch back (queued items are discarded and the
 *   pending count reduced) before the error is returned
 *
 * Shutdown is cooperative: workers are told to stop and given a grace
 * period; those that do not stop in time are reported, never killed.
 */

mod config;
mod work;
mod worker;
mod workload;

pub use config::{CrewConfig, DrainPolicy};
pub use work::{WorkItem, WorkList};
pub use worker::WorkerState;
pub use workload::{FixedWorkload, SyntheticWorkload, Workload};

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::SHUTDOWN_POLL_INTERVAL;
use crate::core::sync::{
    AtomicCell, Backend, Barrier, CancelToken, Condition, MemoryOrder, Native, Protected,
};
use crate::monitoring::BatchSpan;
use crate::task::WorkerTask;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything guarded by the crew mutex
#[derive(Debug, Default)]
pub(crate) struct CrewState {
    pub(crate) list: WorkList,
    pub(crate) pending: usize,
    pub(crate) total: f64,
    pub(crate) batch_total: f64,
    pub(crate) items_processed: u64,
    pub(crate) batches: u64,
    pub(crate) live_workers: usize,
    pub(crate) shutdown: bool,
}

impl CrewState {
    /// Discard queued items of an aborted batch
    fn rollback(&mut self) -> usize {
        let removed = self.list.clear();
        self.pending = self.pending.saturating_sub(removed);
        removed
    }
}

/// Coordination record shared by the creator and every worker
pub(crate) struct Shared<B: Backend> {
    pub(crate) state: Protected<CrewState>,
    pub(crate) go: Condition<B>,
    pub(crate) done: Condition<B>,
    pub(crate) startup: Barrier<B>,
    pub(crate) drain: DrainPolicy,
    pub(crate) workload: Box<dyn Workload>,
    worker_states: Vec<AtomicCell<i32, B>>,
}

impl<B: Backend> Shared<B> {
    pub(crate) fn set_state(&self, index: usize, state: WorkerState) {
        if let Some(cell) = self.worker_states.get(index) {
            cell.exchange(state as i32, MemoryOrder::Release);
        }
    }

    fn worker_state(&self, index: usize) -> Option<WorkerState> {
        self.worker_states
            .get(index)
            .map(|cell| WorkerState::from_raw(cell.load(MemoryOrder::Acquire)))
    }
}

/// Point-in-time view of a crew
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewStats {
    pub size: usize,
    pub live_workers: usize,
    pub pending: usize,
    pub queued: usize,
    pub head: Option<usize>,
    pub tail: Option<usize>,
    pub total: f64,
    pub items_processed: u64,
    pub batches: u64,
}

/// Outcome of [`Crew::shutdown`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// Workers that stopped and were joined
    pub joined: usize,
    /// Names of workers still running after the grace period
    pub stragglers: Vec<String>,
    pub items_processed: u64,
    pub total: f64,
}

/// Fixed-size worker pool
pub struct Crew<B: Backend = Native> {
    shared: Arc<Shared<B>>,
    tasks: Vec<WorkerTask>,
    config: CrewConfig,
    report: Option<ShutdownReport>,
}

impl Crew {
    /// Start `config.size` workers on the native backend
    pub fn create(config: CrewConfig, workload: impl Workload) -> SyncResult<Self> {
        Self::create_with_backend(config, workload)
    }
}

impl<B: Backend> Crew<B> {
    pub fn create_with_backend(config: CrewConfig, workload: impl Workload) -> SyncResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            state: Protected::new(CrewState::default()),
            go: Condition::with_backend(),
            done: Condition::with_backend(),
            startup: Barrier::with_backend(config.size + 1),
            drain: config.drain,
            workload: Box::new(workload),
            worker_states: (0..config.size)
                .map(|_| AtomicCell::with_backend(WorkerState::Created as i32))
                .collect(),
        });

        let mut crew = Self {
            shared,
            tasks: Vec::with_capacity(config.size),
            config,
            report: None,
        };

        for index in 0..crew.config.size {
            let shared = crew.shared.clone();
            let token = CancelToken::with_poll_interval(crew.config.sync.cancel_poll_interval);
            let name = format!("crew-worker-{index}");
            let spawned = WorkerTask::start(index, name, token, move |token| {
                worker::run(&shared, index, token)
            });

            match spawned {
                Ok(task) => crew.tasks.push(task),
                Err(err) => {
                    warn!(index, error = %err, "Crew creation failed, stopping started workers");
                    crew.shared.state.lock()?.live_workers = crew.tasks.len();
                    crew.finish(crew.config.shutdown_grace);
                    return Err(err);
                }
            }
        }

        crew.shared.state.lock()?.live_workers = crew.tasks.len();
        crew.shared.startup.wait()?;
        info!(size = crew.config.size, backend = B::NAME, "Work crew started");
        Ok(crew)
    }

    /// Run one batch to completion and return its aggregated result
    ///
    /// An empty batch returns 0.0 immediately. With a batch timeout the
    /// batch is rolled back and `Timeout` returned if it does not drain.
    pub fn start(&self, batch: Vec<WorkItem>) -> SyncResult<f64> {
        let shared = &self.shared;
        let mut state = shared.state.lock()?;
        if state.shutdown {
            return Err(SyncError::Busy("crew is shutting down".into()));
        }

        // Let a batch from another producer drain first
        while state.pending > 0 {
            if state.live_workers == 0 {
                return Err(SyncError::NoWorkers);
            }
            shared.done.wait_guard(&mut state)?;
        }

        if !batch.is_empty() && state.live_workers == 0 {
            warn!(items = batch.len(), "Batch rejected, no live workers");
            return Err(SyncError::NoWorkers);
        }

        state.batches += 1;
        state.batch_total = 0.0;
        let span = BatchSpan::new(state.batches, batch.len());
        let _entered = span.enter();

        if batch.is_empty() {
            shared.go.broadcast();
            span.record_result(0.0);
            return Ok(0.0);
        }

        let count = batch.len();
        for item in batch {
            state.list.push_back(item);
        }
        state.pending += count;
        debug!(items = count, pending = state.pending, "Batch enqueued");
        shared.go.broadcast();

        let deadline = self.config.batch_timeout.map(|timeout| Instant::now() + timeout);
        while state.pending > 0 {
            if state.live_workers == 0 {
                let removed = state.rollback();
                warn!(removed, "Workers exited before the batch drained");
                span.record_error("no live workers");
                return Err(SyncError::NoWorkers);
            }

            if let Err(err) = shared.done.wait_guard_until(&mut state, deadline) {
                if state.pending == 0 {
                    break;
                }
                let removed = state.rollback();
                warn!(error = %err, removed, in_flight = state.pending, "Batch aborted");
                span.record_error(&err.to_string());
                return Err(err);
            }
        }

        let total = state.batch_total;
        span.record_result(total);
        Ok(total)
    }

    /// Cooperative shutdown with a grace period
    pub fn shutdown(mut self, grace: Duration) -> ShutdownReport {
        self.finish(grace)
    }

    pub fn stats(&self) -> SyncResult<CrewStats> {
        let state = self.shared.state.lock()?;
        Ok(CrewStats {
            size: self.config.size,
            live_workers: state.live_workers,
            pending: state.pending,
            queued: state.list.len(),
            head: state.list.head_id(),
            tail: state.list.tail_id(),
            total: state.total,
            items_processed: state.items_processed,
            batches: state.batches,
        })
    }

    /// Sum of every processed item's contribution so far
    pub fn total(&self) -> SyncResult<f64> {
        Ok(self.shared.state.lock()?.total)
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        (0..self.config.size)
            .filter_map(|index| self.shared.worker_state(index))
            .collect()
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn config(&self) -> &CrewConfig {
        &self.config
    }

    fn finish(&mut self, grace: Duration) -> ShutdownReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        match self.shared.state.lock() {
            Ok(mut state) => {
                state.shutdown = true;
                self.shared.go.broadcast();
                self.shared.done.broadcast();
            }
            Err(err) => warn!(error = %err, "Could not flag crew shutdown"),
        }
        for task in &self.tasks {
            task.cancel();
        }

        let deadline = Instant::now() + grace;
        while self.tasks.iter().any(WorkerTask::is_running) && Instant::now() < deadline {
            // Workers that never reached the startup rendezvous are let through
            let _ = self.shared.startup.release();
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        let mut joined = 0;
        let mut stragglers = Vec::new();
        for task in self.tasks.drain(..) {
            if task.is_running() {
                warn!(task = %task.name(), "Worker did not stop within grace period");
                stragglers.push(task.name().to_string());
                task.detach();
            } else {
                // A panicked worker is logged by join and still counts as stopped
                let _ = task.join();
                joined += 1;
            }
        }

        let (items_processed, total) = match self.shared.state.lock() {
            Ok(state) => (state.items_processed, state.total),
            Err(_) => (0, 0.0),
        };

        let report = ShutdownReport {
            joined,
            stragglers,
            items_processed,
            total,
        };
        info!(
            joined = report.joined,
            stragglers = report.stragglers.len(),
            items = report.items_processed,
            "Work crew shut down"
        );
        self.report = Some(report.clone());
        report
    }
}

impl<B: Backend> Drop for Crew<B> {
    fn drop(&mut self) {
        self.finish(self.config.shutdown_grace);
    }
}

impl<B: Backend> fmt::Debug for Crew<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crew")
            .field("size", &self.config.size)
            .field("backend", &B::NAME)
            .field("workers", &self.tasks.len())
            .finish()
    }
}
