/*!
 * Platform Backends
 *
 * Two implementations of the raw primitive contracts:
 * - `Posix`: fetch-op intrinsics, futex-style sequence condvar, mutex/condvar event
 * - `Win32`: interlocked CAS loops, kernel-style event, event-emulated condvar
 *
 * Both backends are compiled on every target so parity tests can run them
 * side by side. `Native` picks the one matching the host.
 */

mod posix;
mod win32;

pub use posix::{CondEvent, FutexCondvar};
pub use win32::{EventCondvar, KernelEvent};

use super::atomic::{InterlockedAtomics, IntrinsicAtomics};
use super::cancel::CancelToken;
use super::traits::{AtomicBackend, RawCondvar, RawEvent};
use std::time::Instant;

/// Bundle of raw implementations for one threading model
pub trait Backend: Send + Sync + 'static {
    const NAME: &'static str;

    type Atomics: AtomicBackend;
    type Condvar: RawCondvar;
    type Event: RawEvent;
}

/// POSIX-style kernel primitives
#[derive(Debug, Clone, Copy, Default)]
pub struct Posix;

impl Backend for Posix {
    const NAME: &'static str = "posix";

    type Atomics = IntrinsicAtomics;
    type Condvar = FutexCondvar;
    type Event = CondEvent;
}

/// Native Windows event and interlocked objects
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32;

impl Backend for Win32 {
    const NAME: &'static str = "win32";

    type Atomics = InterlockedAtomics;
    type Condvar = EventCondvar;
    type Event = KernelEvent;
}

#[cfg(windows)]
pub type Native = Win32;

#[cfg(not(windows))]
pub type Native = Posix;

/// Deadline for one blocking slice of a cancellable wait
///
/// Without a token the caller's deadline is used as is; with one the wait
/// wakes at least every poll interval to check it.
#[inline]
pub(crate) fn slice_deadline(
    deadline: Option<Instant>,
    cancel: Option<&CancelToken>,
) -> Option<Instant> {
    match cancel {
        None => deadline,
        Some(token) => {
            let poll = Instant::now() + token.poll_interval();
            Some(deadline.map_or(poll, |d| d.min(poll)))
        }
    }
}

#[inline]
pub(crate) fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
