/*!
 * Atomic Cell
 *
 * A single shared machine word that is only ever touched through the
 * atomic operation set of its backend.
 */

use super::order::MemoryOrder;
use super::word::AtomicWord;
use crate::core::sync::backend::{Backend, Native};
use crate::core::sync::traits::AtomicBackend;
use std::fmt;
use std::marker::PhantomData;

/// Shared integer cell with ordering-aware atomic operations
///
/// # Examples
///
/// ```
/// use crewsync::core::sync::{AtomicCell, MemoryOrder};
///
/// let refs = AtomicCell::new(1i32);
/// refs.increment(MemoryOrder::Acquire);
/// assert_eq!(refs.decrement(MemoryOrder::Release), 1);
/// assert_eq!(refs.decrement(MemoryOrder::Release), 0); // last reference dropped
/// ```
pub struct AtomicCell<W: AtomicWord, B: Backend = Native> {
    inner: W::Atomic,
    _backend: PhantomData<fn() -> B>,
}

impl<W: AtomicWord> AtomicCell<W> {
    /// Create a cell on the native backend
    #[inline]
    pub fn new(value: W) -> Self {
        Self::with_backend(value)
    }
}

impl<W: AtomicWord, B: Backend> AtomicCell<W, B> {
    /// Create a cell on an explicitly chosen backend
    #[inline]
    pub fn with_backend(value: W) -> Self {
        Self {
            inner: W::new_atomic(value),
            _backend: PhantomData,
        }
    }

    /// Atomic load; `Release` is downgraded to unordered since loads cannot release
    #[inline(always)]
    pub fn load(&self, order: MemoryOrder) -> W {
        W::atomic_load(&self.inner, order.load())
    }

    /// Swap in `value`, returning the previous value
    #[inline(always)]
    pub fn exchange(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::exchange(&self.inner, value, order)
    }

    /// Write `value` iff the cell holds `expected`; returns the value observed at the comparison
    #[inline(always)]
    pub fn compare_exchange(&self, value: W, expected: W, order: MemoryOrder) -> W {
        B::Atomics::compare_exchange(&self.inner, value, expected, order)
    }

    /// Add one, returning the new value
    #[inline(always)]
    pub fn increment(&self, order: MemoryOrder) -> W {
        B::Atomics::add(&self.inner, W::ONE, order).wrapping_add(W::ONE)
    }

    /// Subtract one, returning the new value
    #[inline(always)]
    pub fn decrement(&self, order: MemoryOrder) -> W {
        B::Atomics::subtract(&self.inner, W::ONE, order).wrapping_sub(W::ONE)
    }

    /// Add `value`, returning the previous value
    #[inline(always)]
    pub fn add(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::add(&self.inner, value, order)
    }

    /// Subtract `value`, returning the previous value
    #[inline(always)]
    pub fn subtract(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::subtract(&self.inner, value, order)
    }

    /// Bitwise AND with `value`, returning the previous value
    #[inline(always)]
    pub fn and(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::and(&self.inner, value, order)
    }

    /// Bitwise OR with `value`, returning the previous value
    #[inline(always)]
    pub fn or(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::or(&self.inner, value, order)
    }

    /// Bitwise XOR with `value`, returning the previous value
    #[inline(always)]
    pub fn xor(&self, value: W, order: MemoryOrder) -> W {
        B::Atomics::xor(&self.inner, value, order)
    }

    /// Consume the cell; no other task can be observing it
    #[inline]
    pub fn into_inner(self) -> W {
        W::into_inner(self.inner)
    }

    /// Name of the atomic backend in use
    pub fn backend_name(&self) -> &'static str {
        <B::Atomics as AtomicBackend>::NAME
    }
}

impl<W: AtomicWord, B: Backend> Default for AtomicCell<W, B> {
    fn default() -> Self {
        Self::with_backend(W::ZERO)
    }
}

impl<W: AtomicWord, B: Backend> fmt::Debug for AtomicCell<W, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicCell")
            .field("value", &self.load(MemoryOrder::Unsafe))
            .field("backend", &self.backend_name())
            .finish()
    }
}
