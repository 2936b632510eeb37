/*!
 * POSIX Backend
 *
 * Condition variable and event built the way pthread implementations on a
 * futex kernel build them.
 *
 * # Design: Sequence Futex
 *
 * `FutexCondvar` keeps a sequence number. A waiter reads it while still
 * holding the user lock, then parks on the condvar's address only if the
 * sequence is unchanged. Every notify bumps the sequence before unparking, so
 * a notification that lands between "release lock" and "park" invalidates the
 * park instead of being lost.
 */

use super::{expired, slice_deadline};
use crate::core::sync::cancel::CancelToken;
use crate::core::sync::traits::{RawCondvar, RawEvent, WaitLock, WaitOutcome, WakeResult};
use parking_lot::{Condvar, Mutex};
use parking_lot_core::{
    park, unpark_all, unpark_one, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Instant;

/// Futex-style condition variable keyed on its own address
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct FutexCondvar {
    seq: AtomicU32,
    waiters: AtomicUsize,
}

impl FutexCondvar {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            waiters: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn key(&self) -> usize {
        &self.seq as *const AtomicU32 as usize
    }

    /// Park until the sequence moves past `observed` or `deadline` passes
    fn park_on(&self, observed: u32, deadline: Option<Instant>) -> ParkResult {
        // SAFETY: the key is the address of `self.seq`, which outlives the
        // park call; the callbacks do not panic or call into parking_lot.
        unsafe {
            park(
                self.key(),
                || self.seq.load(Ordering::SeqCst) == observed,
                || {},
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        }
    }
}

impl Default for FutexCondvar {
    fn default() -> Self {
        Self::new()
    }
}

impl RawCondvar for FutexCondvar {
    fn wait<L: WaitLock>(
        &self,
        lock: &L,
        deadline: Option<Instant>,
        cancel: Option<&CancelToken>,
    ) -> WaitOutcome {
        // Snapshot and registration happen under the user lock
        let observed = self.seq.load(Ordering::SeqCst);
        self.waiters.fetch_add(1, Ordering::SeqCst);
        lock.release();

        let outcome = loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                break WaitOutcome::Cancelled;
            }

            match self.park_on(observed, slice_deadline(deadline, cancel)) {
                ParkResult::Unparked(_) | ParkResult::Invalid => break WaitOutcome::Signaled,
                ParkResult::TimedOut if expired(deadline) => break WaitOutcome::TimedOut,
                // Cancellation poll slice elapsed
                ParkResult::TimedOut => continue,
            }
        };

        self.waiters.fetch_sub(1, Ordering::SeqCst);
        lock.reacquire();
        outcome
    }

    fn notify_one(&self) -> WakeResult {
        self.seq.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return WakeResult::NoWaiters;
        }

        // SAFETY: same key as `park_on`; the callback is trivial.
        let result = unsafe { unpark_one(self.key(), |_| DEFAULT_UNPARK_TOKEN) };
        WakeResult::from_count(result.unparked_threads)
    }

    fn notify_all(&self) -> WakeResult {
        self.seq.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return WakeResult::NoWaiters;
        }

        // SAFETY: same key as `park_on`.
        let unparked = unsafe { unpark_all(self.key(), DEFAULT_UNPARK_TOKEN) };
        WakeResult::from_count(unparked)
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}

#[derive(Debug, Default)]
struct EventState {
    signaled: bool,
    waiters: usize,
    /// Auto-reset wakeups handed to blocked waiters but not yet consumed
    tickets: usize,
    /// Manual-reset pulse generation
    pulses: u64,
}

/// Manual/auto-reset event over a mutex, a condvar and a waiter count
pub struct CondEvent {
    manual_reset: bool,
    state: Mutex<EventState>,
    cond: Condvar,
}

impl CondEvent {
    /// Take a wakeup if one is available to a waiter that entered at `pulse`
    fn try_take(&self, state: &mut EventState, pulse: u64) -> bool {
        if self.manual_reset {
            return state.signaled || state.pulses != pulse;
        }
        if state.tickets > 0 {
            state.tickets -= 1;
            return true;
        }
        if state.signaled {
            state.signaled = false;
            return true;
        }
        false
    }

    /// Auto-reset: release one blocked waiter if any is not already released
    fn hand_ticket(&self, state: &mut EventState) -> bool {
        if state.waiters > state.tickets {
            state.tickets += 1;
            self.cond.notify_one();
            true
        } else {
            false
        }
    }
}

impl RawEvent for CondEvent {
    fn new(manual_reset: bool, initial_state: bool) -> Self {
        Self {
            manual_reset,
            state: Mutex::new(EventState {
                signaled: initial_state,
                ..EventState::default()
            }),
            cond: Condvar::new(),
        }
    }

    fn signal(&self) {
        let mut state = self.state.lock();
        if self.manual_reset {
            state.signaled = true;
            self.cond.notify_all();
        } else if !self.hand_ticket(&mut state) {
            state.signaled = true;
        }
    }

    fn reset(&self) {
        self.state.lock().signaled = false;
    }

    fn pulse(&self) {
        let mut state = self.state.lock();
        if self.manual_reset {
            state.pulses = state.pulses.wrapping_add(1);
            self.cond.notify_all();
        } else {
            self.hand_ticket(&mut state);
        }
        state.signaled = false;
    }

    fn wait(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        let pulse = state.pulses;

        // Fast path: already signaled
        if self.try_take(&mut state, pulse) {
            return true;
        }

        state.waiters += 1;
        let woken = loop {
            match deadline {
                None => self.cond.wait(&mut state),
                Some(deadline) => {
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        // A wakeup may have raced the timeout
                        break self.try_take(&mut state, pulse);
                    }
                }
            }

            if self.try_take(&mut state, pulse) {
                break true;
            }
        };
        state.waiters -= 1;
        woken
    }

    fn is_manual_reset(&self) -> bool {
        self.manual_reset
    }

    fn name(&self) -> &'static str {
        "cond-event"
    }
}
