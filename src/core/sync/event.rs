/*!
 * Event (Manual/Auto-Reset)
 *
 * Boolean synchronization object:
 * - manual-reset: stays signaled until `reset`, waking every waiter meanwhile
 * - auto-reset: each signal releases exactly one waiter, or latches for the
 *   next one if nobody is waiting
 */

use super::backend::{Backend, Native};
use super::traits::RawEvent;
use crate::core::errors::{SyncError, SyncResult};
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Manual or auto-reset event on the chosen backend
///
/// # Examples
///
/// ```
/// use crewsync::core::sync::Event;
/// use std::time::Duration;
///
/// let ready = Event::auto(false);
/// ready.signal(); // no waiters yet: latched for the next one
/// assert!(ready.wait_timeout(Duration::from_millis(10)).is_ok());
/// assert!(ready.wait_timeout(Duration::from_millis(10)).is_err());
/// ```
pub struct Event<B: Backend = Native> {
    raw: B::Event,
    _backend: PhantomData<fn() -> B>,
}

impl Event {
    pub fn new(manual_reset: bool, initial_state: bool) -> Self {
        Self::with_backend(manual_reset, initial_state)
    }

    pub fn manual(initial_state: bool) -> Self {
        Self::new(true, initial_state)
    }

    pub fn auto(initial_state: bool) -> Self {
        Self::new(false, initial_state)
    }
}

impl<B: Backend> Event<B> {
    pub fn with_backend(manual_reset: bool, initial_state: bool) -> Self {
        Self {
            raw: B::Event::new(manual_reset, initial_state),
            _backend: PhantomData,
        }
    }

    pub fn signal(&self) {
        self.raw.signal();
    }

    pub fn reset(&self) {
        self.raw.reset();
    }

    /// Wake current waiters without staying signaled for future ones
    pub fn pulse(&self) {
        self.raw.pulse();
    }

    /// Block until signaled
    pub fn wait(&self) {
        // Without a deadline the raw wait only returns once woken
        let woken = self.raw.wait(None);
        debug_assert!(woken);
    }

    /// Block until signaled or `timeout` elapses (`Timeout`)
    pub fn wait_timeout(&self, timeout: Duration) -> SyncResult<()> {
        self.wait_until(Instant::now() + timeout)
    }

    pub fn wait_until(&self, deadline: Instant) -> SyncResult<()> {
        if self.raw.wait(Some(deadline)) {
            Ok(())
        } else {
            Err(SyncError::Timeout)
        }
    }

    pub fn is_manual_reset(&self) -> bool {
        self.raw.is_manual_reset()
    }

    pub fn backend_name(&self) -> &'static str {
        self.raw.name()
    }
}

impl<B: Backend> fmt::Debug for Event<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("manual_reset", &self.is_manual_reset())
            .field("backend", &B::NAME)
            .finish()
    }
}
