/*!
 * Crew Worker
 *
 * Worker lifecycle:
 * `Created -> AtStartupBarrier -> WaitingForWork -> (Processing <-> WaitingForWork) -> Finished`
 *
 * A worker holds the crew mutex except while running the workload: it waits
 * on `go` while the list is empty, detaches one item, runs it unlocked, then
 * folds the result into the total and decrements the pending count. The
 * worker that drains the count to zero broadcasts `done`.
 */

use super::config::DrainPolicy;
use super::Shared;
use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::{Backend, CancelToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Observable per-worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum WorkerState {
    Created = 0,
    AtStartupBarrier = 1,
    WaitingForWork = 2,
    Processing = 3,
    Finished = 4,
}

impl WorkerState {
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => WorkerState::AtStartupBarrier,
            2 => WorkerState::WaitingForWork,
            3 => WorkerState::Processing,
            4 => WorkerState::Finished,
            _ => WorkerState::Created,
        }
    }
}

/// Exit bookkeeping that also runs if the workload panics
struct ExitGuard<'a, B: Backend> {
    shared: &'a Shared<B>,
    index: usize,
    /// An item was dequeued but its result not yet recorded
    in_flight: bool,
}

impl<B: Backend> Drop for ExitGuard<'_, B> {
    fn drop(&mut self) {
        self.shared.set_state(self.index, WorkerState::Finished);
        match self.shared.state.lock() {
            Ok(mut state) => {
                if self.in_flight {
                    warn!(worker = self.index, "Work item lost with its worker");
                    state.pending = state.pending.saturating_sub(1);
                }
                state.live_workers = state.live_workers.saturating_sub(1);
                // Coordinator may be waiting for a drain this worker can no longer help with
                self.shared.done.broadcast();
            }
            Err(err) => warn!(worker = self.index, error = %err, "Could not record worker exit"),
        }
    }
}

/// Body of worker task `index`
pub(crate) fn run<B: Backend>(shared: &Shared<B>, index: usize, token: &CancelToken) {
    let mut exit = ExitGuard {
        shared,
        index,
        in_flight: false,
    };

    shared.set_state(index, WorkerState::AtStartupBarrier);
    if let Err(err) = shared.startup.wait() {
        warn!(worker = index, error = %err, "Startup barrier failed");
    }

    match work_loop(shared, index, token, &mut exit.in_flight) {
        Ok(()) => debug!(worker = index, "Worker leaving processing loop"),
        Err(SyncError::Cancelled) => debug!(worker = index, "Worker cancelled"),
        Err(err) => warn!(worker = index, error = %err, "Worker stopped on error"),
    }
}

fn work_loop<B: Backend>(
    shared: &Shared<B>,
    index: usize,
    token: &CancelToken,
    in_flight: &mut bool,
) -> SyncResult<()> {
    let mut state = shared.state.lock()?;
    loop {
        shared.set_state(index, WorkerState::WaitingForWork);
        while state.list.is_empty() {
            if state.shutdown {
                return Ok(());
            }
            shared.go.wait_guard_cancellable(&mut state, None, token)?;
        }

        if token.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let Some(item) = state.list.pop_front() else {
            continue;
        };
        debug!(
            worker = index,
            queued = state.list.len(),
            "Dequeued work item"
        );
        *in_flight = true;
        drop(state);

        shared.set_state(index, WorkerState::Processing);
        let value = shared.workload.process(&item);
        drop(item);

        state = shared.state.lock()?;
        *in_flight = false;
        state.total += value;
        state.batch_total += value;
        state.items_processed += 1;
        state.pending = state.pending.saturating_sub(1);
        debug!(
            worker = index,
            value,
            pending = state.pending,
            "Work item processed"
        );

        if state.pending == 0 {
            shared.done.broadcast();
            if shared.drain == DrainPolicy::ExitOnDrain {
                return Ok(());
            }
        }
    }
}
