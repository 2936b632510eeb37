/*!
 * Condition Variable
 *
 * Wait/signal channel used with exactly one [`Mutex`] held by the waiter.
 * The condition never looks at the predicate; callers recheck it in a loop.
 *
 * Every wait returns with the mutex held again, including timeouts and
 * cancellation. Timed waits convert the relative timeout to an absolute
 * deadline once, at call time.
 */

use super::backend::{Backend, Native};
use super::cancel::CancelToken;
use super::mutex::{Mutex, ProtectedGuard};
use super::traits::{RawCondvar, WaitLock, WaitOutcome, WakeResult};
use crate::core::errors::{SyncError, SyncResult};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::thread;
use std::time::{Duration, Instant};

/// Condition variable on the chosen backend
pub struct Condition<B: Backend = Native> {
    raw: B::Condvar,
    _backend: PhantomData<fn() -> B>,
}

impl Condition {
    pub fn new() -> Self {
        Self::with_backend()
    }
}

impl<B: Backend> Condition<B> {
    pub fn with_backend() -> Self {
        Self {
            raw: B::Condvar::default(),
            _backend: PhantomData,
        }
    }

    /// Release `mutex`, block until signaled, re-acquire `mutex`
    pub fn wait(&self, mutex: &Mutex) -> SyncResult<()> {
        self.wait_inner(mutex, None, None)
    }

    /// As [`wait`](Self::wait), giving up with `Timeout` after `timeout`
    pub fn wait_timeout(&self, mutex: &Mutex, timeout: Duration) -> SyncResult<()> {
        self.wait_inner(mutex, Some(Instant::now() + timeout), None)
    }

    /// As [`wait`](Self::wait), giving up with `Timeout` at `deadline`
    pub fn wait_until(&self, mutex: &Mutex, deadline: Instant) -> SyncResult<()> {
        self.wait_inner(mutex, Some(deadline), None)
    }

    /// As [`wait`](Self::wait), giving up with `Cancelled` once `token` fires
    pub fn wait_cancellable(&self, mutex: &Mutex, token: &CancelToken) -> SyncResult<()> {
        self.wait_inner(mutex, None, Some(token))
    }

    /// Wait on the mutex behind a [`ProtectedGuard`]
    pub fn wait_guard<T>(&self, guard: &mut ProtectedGuard<'_, T>) -> SyncResult<()> {
        self.wait_inner(guard.mutex(), None, None)
    }

    pub fn wait_guard_until<T>(
        &self,
        guard: &mut ProtectedGuard<'_, T>,
        deadline: Option<Instant>,
    ) -> SyncResult<()> {
        self.wait_inner(guard.mutex(), deadline, None)
    }

    pub fn wait_guard_cancellable<T>(
        &self,
        guard: &mut ProtectedGuard<'_, T>,
        deadline: Option<Instant>,
        token: &CancelToken,
    ) -> SyncResult<()> {
        self.wait_inner(guard.mutex(), deadline, Some(token))
    }

    /// Wake at most one waiter
    pub fn signal(&self) -> WakeResult {
        self.raw.notify_one()
    }

    /// Wake every waiter
    pub fn broadcast(&self) -> WakeResult {
        self.raw.notify_all()
    }

    pub fn backend_name(&self) -> &'static str {
        self.raw.name()
    }

    fn wait_inner(
        &self,
        mutex: &Mutex,
        deadline: Option<Instant>,
        cancel: Option<&CancelToken>,
    ) -> SyncResult<()> {
        let depth = mutex.held_depth()?;
        let lock = MutexWaitLock {
            mutex,
            depth,
            held: Cell::new(true),
        };

        match self.raw.wait(&lock, deadline, cancel) {
            WaitOutcome::Signaled => Ok(()),
            WaitOutcome::TimedOut => Err(SyncError::Timeout),
            WaitOutcome::Cancelled => Err(SyncError::Cancelled),
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for Condition<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("backend", &B::NAME)
            .field("raw", &self.raw.name())
            .finish()
    }
}

/// Scoped release/re-acquire of a user mutex around a raw wait
///
/// Doubles as the unwind cleanup: if the waiting thread unwinds while it
/// holds the mutex, the mutex is released so peers are not blocked forever.
struct MutexWaitLock<'a> {
    mutex: &'a Mutex,
    depth: u32,
    held: Cell<bool>,
}

impl WaitLock for MutexWaitLock<'_> {
    fn release(&self) {
        self.mutex.release_all();
        self.held.set(false);
    }

    fn reacquire(&self) {
        self.mutex.reacquire(self.depth);
        self.held.set(true);
    }
}

impl Drop for MutexWaitLock<'_> {
    fn drop(&mut self) {
        if thread::panicking() && self.held.get() {
            self.mutex.release_all();
        }
    }
}
