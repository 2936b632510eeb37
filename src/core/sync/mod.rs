/*!
 * Synchronization Primitives
 *
 * One primitive set with identical semantics on two threading models:
 * - Atomics with four ordering variants (full, acquire, release, unsafe)
 * - Mutex (normal/recursive) and SpinLock
 * - Condition variable and manual/auto-reset Event
 * - Reusable rendezvous Barrier
 *
 * # Architecture
 *
 * Public types are generic over a [`Backend`] defaulting to [`Native`].
 * The raw per-platform pieces live behind the traits in `traits`, so the
 * backend in use never leaks into caller code.
 */

pub mod atomic;
pub mod backend;
mod barrier;
mod cancel;
mod condition;
mod config;
mod event;
mod mutex;
mod spinlock;
mod spinwait;
mod traits;

pub use atomic::{AtomicCell, AtomicPointer, AtomicWord, MemoryOrder};
pub use backend::{Backend, Native, Posix, Win32};
pub use barrier::{Barrier, BarrierWaitResult};
pub use cancel::CancelToken;
pub use condition::Condition;
pub use config::SyncConfig;
pub use event::Event;
pub use mutex::{Mutex, MutexGuard, MutexKind, Protected, ProtectedGuard};
pub use spinlock::{SpinLock, SpinLockGuard};
pub use spinwait::Backoff;
pub use traits::{AtomicBackend, RawCondvar, RawEvent, WaitLock, WaitOutcome, WakeResult};
