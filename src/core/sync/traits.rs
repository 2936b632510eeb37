/*!
 * Synchronization Traits
 *
 * Seams between the public primitives and their per-platform backends.
 *
 * # Design: One Contract, Two Backends
 *
 * Each primitive (`AtomicCell`, `Condition`, `Event`) is generic over a
 * `Backend` that supplies the raw implementation. Callers normally use the
 * defaulted `Native` backend and never name these traits; tests name both
 * backends to check they behave identically.
 */

use super::atomic::{AtomicWord, MemoryOrder};
use super::cancel::CancelToken;
use std::sync::atomic::AtomicPtr;
use std::time::Instant;

/// Result of a wake operation
///
/// Compact representation (single usize) for efficient returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }

    #[inline]
    pub(crate) fn from_count(n: usize) -> Self {
        if n == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(n)
        }
    }
}

/// How a blocking condition wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Woken by a notification (or spuriously; callers recheck their predicate)
    Signaled,
    /// The absolute deadline passed first
    TimedOut,
    /// The cancellation token fired while blocked
    Cancelled,
}

/// A lock that a condition wait releases while blocked and re-acquires before returning
pub trait WaitLock {
    fn release(&self);
    fn reacquire(&self);
}

/// Atomic read-modify-write primitives for one backend
///
/// `add`/`subtract`/`and`/`or`/`xor` return the value *before* the update.
/// `compare_exchange` returns the value observed at the comparison and only
/// writes when that value equals `compare`.
pub trait AtomicBackend: Send + Sync + 'static {
    const NAME: &'static str;

    fn exchange<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn compare_exchange<W: AtomicWord>(
        cell: &W::Atomic,
        value: W,
        compare: W,
        order: MemoryOrder,
    ) -> W;

    fn add<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn subtract<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn and<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn or<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn xor<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W;

    fn exchange_ptr<T>(cell: &AtomicPtr<T>, value: *mut T, order: MemoryOrder) -> *mut T;

    fn compare_exchange_ptr<T>(
        cell: &AtomicPtr<T>,
        value: *mut T,
        compare: *mut T,
        order: MemoryOrder,
    ) -> *mut T;
}

/// Raw condition variable
///
/// Implementations must be:
/// - **Atomic**: releasing the lock and starting to block is one step with
///   respect to `notify_*`; a notification sent after the caller released the
///   lock is never lost
/// - **Spurious-tolerant**: may return `Signaled` without a notification
pub trait RawCondvar: Default + Send + Sync + 'static {
    /// Release `lock`, block until notified, `deadline` or cancellation, then re-acquire `lock`
    fn wait<L: WaitLock>(
        &self,
        lock: &L,
        deadline: Option<Instant>,
        cancel: Option<&CancelToken>,
    ) -> WaitOutcome;

    /// Wake at most one blocked waiter
    fn notify_one(&self) -> WakeResult;

    /// Wake every blocked waiter
    fn notify_all(&self) -> WakeResult;

    /// Get backend name for debugging
    fn name(&self) -> &'static str;
}

/// Raw manual/auto-reset event
pub trait RawEvent: Send + Sync + 'static {
    fn new(manual_reset: bool, initial_state: bool) -> Self;

    /// Manual: set and wake everyone. Auto: wake one waiter, or stay set for the next one.
    fn signal(&self);

    /// Force the non-signaled state; blocked waiters are unaffected
    fn reset(&self);

    /// Wake current waiters (manual: all, auto: one) and leave the event non-signaled
    fn pulse(&self);

    /// Returns `true` if woken by a signal, `false` if `deadline` passed first
    fn wait(&self, deadline: Option<Instant>) -> bool;

    fn is_manual_reset(&self) -> bool;

    fn name(&self) -> &'static str;
}
