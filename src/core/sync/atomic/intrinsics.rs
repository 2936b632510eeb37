/*!
 * Intrinsic Atomics (POSIX backend)
 *
 * Maps every operation straight onto the matching hardware read-modify-write
 * instruction with the requested ordering.
 */

use super::order::MemoryOrder;
use super::word::AtomicWord;
use crate::core::sync::traits::AtomicBackend;
use std::sync::atomic::AtomicPtr;

/// Direct fetch-op atomics
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicAtomics;

impl AtomicBackend for IntrinsicAtomics {
    const NAME: &'static str = "intrinsics";

    #[inline(always)]
    fn exchange<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_swap(cell, value, order.rmw())
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
        W::atomic_fetch_sub(cell, value, order.rmw())
    }

    #[inline(always)]
    fn and<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_fetch_and(cell, value, order.rmw())
    }

    #[inline(always)]
    fn or<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_fetch_or(cell, value, order.rmw())
    }

    #[inline(always)]
    fn xor<W: AtomicWord>(cell: &W::Atomic, value: W, order: MemoryOrder) -> W {
        W::atomic_fetch_xor(cell, value, order.rmw())
    }

    #[inline(always)]
    fn exchange_ptr<T>(cell: &AtomicPtr<T>, value: *mut T, order: MemoryOrder) -> *mut T {
        cell.swap(value, order.rmw())
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
