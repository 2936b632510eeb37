/*!
 * Memory Ordering Variants
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

/// Ordering variant requested for an atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOrder {
    /// Sequentially consistent: nothing moves across the operation in either direction
    #[default]
    Full,
    /// No later load/store moves before the operation
    Acquire,
    /// No earlier load/store moves after the operation
    Release,
    /// Atomicity only, no ordering constraint
    Unsafe,
}

impl MemoryOrder {
    pub const ALL: [MemoryOrder; 4] = [
        MemoryOrder::Full,
        MemoryOrder::Acquire,
        MemoryOrder::Release,
        MemoryOrder::Unsafe,
    ];

    /// Ordering for a read-modify-write (and for the success path of a compare-exchange)
    #[inline(always)]
    pub const fn rmw(self) -> Ordering {
        match self {
            MemoryOrder::Full => Ordering::SeqCst,
            MemoryOrder::Acquire => Ordering::Acquire,
            MemoryOrder::Release => Ordering::Release,
            MemoryOrder::Unsafe => Ordering::Relaxed,
        }
    }

    /// Ordering for the failure path of a compare-exchange
    ///
    /// A failed compare-exchange is a pure load, which cannot carry release semantics.
    #[inline(always)]
    pub const fn failure(self) -> Ordering {
        match self {
            MemoryOrder::Full => Ordering::SeqCst,
            MemoryOrder::Acquire => Ordering::Acquire,
            MemoryOrder::Release | MemoryOrder::Unsafe => Ordering::Relaxed,
        }
    }

    /// Ordering for a plain atomic load
    #[inline(always)]
    pub const fn load(self) -> Ordering {
        self.failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_is_relaxed() {
        assert_eq!(MemoryOrder::Unsafe.rmw(), Ordering::Relaxed);
        assert_eq!(MemoryOrder::Unsafe.failure(), Ordering::Relaxed);
    }

    #[test]
    fn test_release_never_used_for_loads() {
        for order in MemoryOrder::ALL {
            assert_ne!(order.failure(), Ordering::Release);
            assert_ne!(order.load(), Ordering::AcqRel);
        }
    }

    #[test]
    fn test_default_is_full_barrier() {
        assert_eq!(MemoryOrder::default().rmw(), Ordering::SeqCst);
    }
}
