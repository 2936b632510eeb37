/*!
 * Atomic Word Types
 *
 * Integer widths the atomic operation set is defined over. The arithmetic
 * helpers wrap on overflow, matching the two's-complement behaviour of the
 * hardware instructions.
 */

use std::fmt::Debug;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicIsize, Ordering};

/// An integer that has a native atomic counterpart
pub trait AtomicWord: Copy + Eq + Debug + Send + Sync + 'static {
    type Atomic: Send + Sync;

    const ZERO: Self;
    const ONE: Self;

    fn new_atomic(value: Self) -> Self::Atomic;
    fn into_inner(atomic: Self::Atomic) -> Self;

    fn atomic_load(atomic: &Self::Atomic, order: Ordering) -> Self;
    fn atomic_swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    fn atomic_compare_exchange(
        atomic: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
    fn atomic_fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    fn atomic_fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    fn atomic_fetch_and(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    fn atomic_fetch_or(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    fn atomic_fetch_xor(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
    fn bit_and(self, rhs: Self) -> Self;
    fn bit_or(self, rhs: Self) -> Self;
    fn bit_xor(self, rhs: Self) -> Self;
}

macro_rules! impl_atomic_word {
    ($int:ty, $atomic:ty) => {
        impl AtomicWord for $int {
            type Atomic = $atomic;

            const ZERO: Self = 0;
            const ONE: Self = 1;

            #[inline(always)]
            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value)
            }

            #[inline(always)]
            fn into_inner(atomic: Self::Atomic) -> Self {
                atomic.into_inner()
            }

            #[inline(always)]
            fn atomic_load(atomic: &Self::Atomic, order: Ordering) -> Self {
                atomic.load(order)
            }

            #[inline(always)]
            fn atomic_swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.swap(value, order)
            }

            #[inline(always)]
            fn atomic_compare_exchange(
                atomic: &Self::Atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                atomic.compare_exchange(current, new, success, failure)
            }

            #[inline(always)]
            fn atomic_fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_add(value, order)
            }

            #[inline(always)]
            fn atomic_fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_sub(value, order)
            }

            #[inline(always)]
            fn atomic_fetch_and(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_and(value, order)
            }

            #[inline(always)]
            fn atomic_fetch_or(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_or(value, order)
            }

            #[inline(always)]
            fn atomic_fetch_xor(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_xor(value, order)
            }

            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$int>::wrapping_add(self, rhs)
            }

            #[inline(always)]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$int>::wrapping_sub(self, rhs)
            }

            #[inline(always)]
            fn wrapping_neg(self) -> Self {
                <$int>::wrapping_neg(self)
            }

            #[inline(always)]
            fn bit_and(self, rhs: Self) -> Self {
                self & rhs
            }

            #[inline(always)]
            fn bit_or(self, rhs: Self) -> Self {
                self | rhs
            }

            #[inline(always)]
            fn bit_xor(self, rhs: Self) -> Self {
                self ^ rhs
            }
        }
    };
}

impl_atomic_word!(i32, AtomicI32);
impl_atomic_word!(i64, AtomicI64);
impl_atomic_word!(isize, AtomicIsize);
