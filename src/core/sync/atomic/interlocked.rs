/*!
 * Interlocked Atomics (Win32 backend)
 *
 * Only exchange-add and compare-exchange are used as primitives. Everything
 * else is derived from them:
 * - subtract adds the two's-complement negation
 * - exchange, and, or, xor retry a compare-exchange until no other writer
 *   intervened between the read and the write
 */

use super::order::MemoryOrder;
use super::word::AtomicWord;
use crate::core::sync::traits::AtomicBackend;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Compare-exchange based atomics
#[derive(Debug, Clone, Copy, Default)]
pub struct InterlockedAtomics;

impl InterlockedAtomics {
    /// Apply `update` atomically, returning the value it was applied to
    #[inline]
    fn update<W: AtomicWord>(cell: &W::Atomic, order: MemoryOrder, update: impl Fn(W) -> W) -> W {
        let mut observed = W::atomic_load(cell, Ordering::Relaxed);
        loop {
            match W::atomic_compare_exchange(
                cell,
                observed,
                update(observed),
                order.rmw(),
                Ordering::Relaxed,
            ) {
                Ok(previous) => return previous,
                Err(actual) => observed = actual,
            }
        }
    }
}

impl AtomicBackend for InterlockedAtomics {
    const NAME: &'static str = "interlocked";

    #[inline]
    fn exchange<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        Self::update(cell, order, |_| value)
    }

    #[inline(always)]
    fn compare_exchange<W: AtomicWord>(
        cell: &W::Atomic,
        value: W,
        compare: W,
        order: MemoryOrder,
    ) -> W {
        match W::atomic_compare_exchange(cell, compare, value, order.rmw(), order.failure()) {
            Ok(observed) | Err(observed) => observed,
        }
    }

    #[inline(always)]
    fn add<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_fetch_add(cell, value, order.rmw())
    }

    #[inline(always)]
    fn subtract<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_fetch_add(cell, value.wrapping_neg(), order.rmw())
    }

    #[inline]
    fn and<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        Self::update::<W>(cell, order, |current| current.bit_and(value))
    }

    #[inline]
    fn or<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        Self::update::<W>(cell, order, |current| current.bit_or(value))
    }

    #[inline]
    fn xor<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        Self::update::<W>(cell, order, |current| current.bit_xor(value))
    }

    #[inline]
    fn exchange_ptr<T>(cell: &AtomicPtr<T>, value: *mut T, order: MemoryOrder) -> *mut T {
        let mut observed = cell.load(Ordering::Relaxed);
        loop {
            match cell.compare_exchange(observed, value, order.rmw(), Ordering::Relaxed) {
                Ok(previous) => return previous,
                Err(actual) => observed = actual,
            }
        }
    }

    #[inline(always)]
    fn compare_exchange_ptr<T>(
        cell: &AtomicPtr<T>,
        value: *mut T,
        compare: *mut T,
        order: MemoryOrder,
    ) -> *mut T {
        match cell.compare_exchange(compare, value, order.rmw(), order.failure()) {
            Ok(observed) | Err(observed) => observed,
        }
    }
}
