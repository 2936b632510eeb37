/*!
 * Win32 Backend
 *
 * Kernel-style event objects and a condition variable emulated on top of a
 * manual-reset event, the way condition variables were built on Windows
 * before native ones existed.
 *
 * # Design: Generation-Counted Broadcast Event
 *
 * A single manual-reset event is shared by all waiters. A notify records how
 * many waiters may leave (`release_count`) and opens a new generation; only
 * waiters that arrived before that generation are eligible, so a thread that
 * starts waiting right after a broadcast cannot steal a wakeup meant for an
 * older waiter. The last released waiter closes the event again.
 */

use super::{expired, slice_deadline};
use crate::core::sync::cancel::CancelToken;
use crate::core::sync::traits::{RawCondvar, RawEvent, WaitLock, WaitOutcome, WakeResult};
use parking_lot::Mutex;
use parking_lot_core::{park, unpark_all, unpark_one, ParkResult, UnparkToken, DEFAULT_PARK_TOKEN};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Unpark token meaning "the signal was handed directly to you"
const HANDOFF: UnparkToken = UnparkToken(1);

/// Event object with an atomic signaled word and keyed park/unpark
pub struct KernelEvent {
    signaled: AtomicBool,
    manual_reset: bool,
}

impl KernelEvent {
    #[inline]
    fn key(&self) -> usize {
        &self.signaled as *const AtomicBool as usize
    }

    /// Observe (manual) or consume (auto) the signaled state
    #[inline]
    fn try_consume(&self) -> bool {
        if self.manual_reset {
            self.signaled.load(Ordering::Acquire)
        } else {
            self.signaled
                .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
        }
    }
}

impl RawEvent for KernelEvent {
    fn new(manual_reset: bool, initial_state: bool) -> Self {
        Self {
            signaled: AtomicBool::new(initial_state),
            manual_reset,
        }
    }

    fn signal(&self) {
        if self.manual_reset {
            self.signaled.store(true, Ordering::Release);
            // SAFETY: key is the address of `self.signaled`.
            unsafe {
                unpark_all(self.key(), HANDOFF);
            }
        } else {
            // Hand the signal to one parked waiter, or latch it if none.
            // The callback runs under the bucket lock, so a thread that is
            // about to park sees the latched flag in its validate step.
            // SAFETY: key is the address of `self.signaled`; the callback
            // only touches an atomic.
            unsafe {
                unpark_one(self.key(), |result| {
                    if result.unparked_threads == 0 {
                        self.signaled.store(true, Ordering::Release);
                    }
                    HANDOFF
                });
            }
        }
    }

    fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    fn pulse(&self) {
        // SAFETY: key is the address of `self.signaled`.
        unsafe {
            if self.manual_reset {
                unpark_all(self.key(), HANDOFF);
            } else {
                unpark_one(self.key(), |_| HANDOFF);
            }
        }
        self.signaled.store(false, Ordering::Release);
    }

    fn wait(&self, deadline: Option<Instant>) -> bool {
        loop {
            if self.try_consume() {
                return true;
            }

            // SAFETY: key is the address of `self.signaled`; callbacks are trivial.
            let result = unsafe {
                park(
                    self.key(),
                    || !self.signaled.load(Ordering::Acquire),
                    || {},
                    |_, _| {},
                    DEFAULT_PARK_TOKEN,
                    deadline,
                )
            };

            match result {
                ParkResult::Unparked(_) => return true,
                ParkResult::Invalid => continue,
                ParkResult::TimedOut => return self.try_consume(),
            }
        }
    }

    fn is_manual_reset(&self) -> bool {
        self.manual_reset
    }

    fn name(&self) -> &'static str {
        "kernel-event"
    }
}

#[derive(Debug, Default)]
struct CvState {
    waiters: usize,
    release_count: usize,
    generation: u64,
}

/// Condition variable emulated on a manual-reset event
pub struct EventCondvar {
    state: Mutex<CvState>,
    event: KernelEvent,
}

impl EventCondvar {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CvState::default()),
            event: KernelEvent::new(true, false),
        }
    }

    /// Leave the wait if a notify issued after we arrived is still unclaimed
    fn try_claim(&self, state: &mut CvState, generation: u64) -> bool {
        if state.release_count > 0 && state.generation != generation {
            state.waiters -= 1;
            state.release_count -= 1;
            if state.release_count == 0 {
                self.event.reset();
            }
            true
        } else {
            false
        }
    }
}

impl Default for EventCondvar {
    fn default() -> Self {
        Self::new()
    }
}

impl RawCondvar for EventCondvar {
    fn wait<L: WaitLock>(
        &self,
        lock: &L,
        deadline: Option<Instant>,
        cancel: Option<&CancelToken>,
    ) -> WaitOutcome {
        let generation = {
            let mut state = self.state.lock();
            state.waiters += 1;
            state.generation
        };
        lock.release();

        let outcome = loop {
            let cancelled = cancel.is_some_and(CancelToken::is_cancelled);
            let set = !cancelled && self.event.wait(slice_deadline(deadline, cancel));

            let mut state = self.state.lock();
            if self.try_claim(&mut state, generation) {
                break WaitOutcome::Signaled;
            }
            if cancelled {
                state.waiters -= 1;
                break WaitOutcome::Cancelled;
            }
            if expired(deadline) {
                state.waiters -= 1;
                break WaitOutcome::TimedOut;
            }
            drop(state);

            // Event is open for an older generation; let those waiters drain
            if set {
                thread::yield_now();
            }
        };

        lock.reacquire();
        outcome
    }

    fn notify_one(&self) -> WakeResult {
        let mut state = self.state.lock();
        if state.waiters > state.release_count {
            self.event.signal();
            state.release_count += 1;
            state.generation = state.generation.wrapping_add(1);
            WakeResult::Woken(1)
        } else {
            WakeResult::NoWaiters
        }
    }

    fn notify_all(&self) -> WakeResult {
        let mut state = self.state.lock();
        if state.waiters > 0 {
            self.event.signal();
            let released = state.waiters - state.release_count;
            state.release_count = state.waiters;
            state.generation = state.generation.wrapping_add(1);
            WakeResult::from_count(released)
        } else {
            WakeResult::NoWaiters
        }
    }

    fn name(&self) -> &'static str {
        "event-emulated"
    }
}
