/*!
 * Atomic Pointer
 *
 * Typed adapter over the pointer-width exchange and compare-exchange
 * primitives of a backend.
 */

use super::order::MemoryOrder;
use crate::core::sync::backend::{Backend, Native};
use crate::core::sync::traits::AtomicBackend;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::AtomicPtr;

/// Shared `*mut T` with ordering-aware exchange operations
///
/// The cell never dereferences the pointer; ownership of the pointee is the
/// caller's business.
pub struct AtomicPointer<T, B: Backend = Native> {
    inner: AtomicPtr<T>,
    _backend: PhantomData<fn() -> B>,
}

impl<T> AtomicPointer<T> {
    #[inline]
    pub fn new(value: *mut T) -> Self {
        Self::with_backend(value)
    }

    #[inline]
    pub fn null() -> Self {
        Self::new(ptr::null_mut())
    }
}

impl<T, B: Backend> AtomicPointer<T, B> {
    #[inline]
    pub fn with_backend(value: *mut T) -> Self {
        Self {
            inner: AtomicPtr::new(value),
            _backend: PhantomData,
        }
    }

    #[inline(always)]
    pub fn load(&self, order: MemoryOrder) -> *mut T {
        self.inner.load(order.load())
    }

    /// Swap in `value`, returning the previous pointer
    #[inline(always)]
    pub fn exchange(&self, value: *mut T, order: MemoryOrder) -> *mut T {
        B::Atomics::exchange_ptr(&self.inner, value, order)
    }

    /// Write `value` iff the cell holds `expected`; returns the pointer observed at the comparison
    #[inline(always)]
    pub fn compare_exchange(&self, value: *mut T, expected: *mut T, order: MemoryOrder) -> *mut T {
        B::Atomics::compare_exchange_ptr(&self.inner, value, expected, order)
    }

    #[inline]
    pub fn into_inner(self) -> *mut T {
        self.inner.into_inner()
    }

    pub fn backend_name(&self) -> &'static str {
        <B::Atomics as AtomicBackend>::NAME
    }
}

impl<T, B: Backend> Default for AtomicPointer<T, B> {
    fn default() -> Self {
        Self::with_backend(ptr::null_mut())
    }
}

impl<T, B: Backend> fmt::Debug for AtomicPointer<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicPointer")
            .field("value", &self.load(MemoryOrder::Unsafe))
            .field("backend", &self.backend_name())
            .finish()
    }
}
