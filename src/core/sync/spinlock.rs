/*!
 * SpinLock
 *
 * Zero/one atomic cell acquired by busy-retry with backoff. Never suspends
 * the caller; only suitable for critical sections of a few instructions.
 */

use super::atomic::{AtomicCell, MemoryOrder};
use super::backend::{Backend, Native};
use super::config::SyncConfig;
use super::spinwait::Backoff;
use crate::core::errors::{SyncError, SyncResult};
use std::fmt;

const UNLOCKED: i32 = 0;
const LOCKED: i32 = 1;

/// Busy-waiting lock over an [`AtomicCell`]
pub struct SpinLock<B: Backend = Native> {
    cell: AtomicCell<i32, B>,
    config: SyncConfig,
}

impl SpinLock {
    pub fn new() -> Self {
        Self::with_backend(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self::with_backend(config)
    }
}

impl<B: Backend> SpinLock<B> {
    pub fn with_backend(config: SyncConfig) -> Self {
        Self {
            cell: AtomicCell::with_backend(UNLOCKED),
            config,
        }
    }

    /// Spin until acquired
    pub fn lock(&self) {
        let mut backoff = Backoff::new(&self.config);
        loop {
            if self.try_acquire() {
                return;
            }
            // Wait for a release before retrying the write
            while self.is_locked() {
                backoff.snooze();
            }
        }
    }

    /// Single acquisition attempt; `WouldBlock` when held
    pub fn try_lock(&self) -> SyncResult<()> {
        if self.try_acquire() {
            Ok(())
        } else {
            Err(SyncError::WouldBlock)
        }
    }

    /// Release the lock
    ///
    /// Unlocking a free lock is a programming error: it asserts in debug
    /// builds and reports `NotLocked` otherwise.
    pub fn unlock(&self) -> SyncResult<()> {
        let previous = self.cell.exchange(UNLOCKED, MemoryOrder::Release);
        debug_assert_ne!(previous, UNLOCKED, "spinlock unlocked while not held");
        if previous == UNLOCKED {
            return Err(SyncError::NotLocked);
        }
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.cell.load(MemoryOrder::Acquire) != UNLOCKED
    }

    /// Lock and return a guard that unlocks on drop
    pub fn guard(&self) -> SpinLockGuard<'_, B> {
        self.lock();
        SpinLockGuard { lock: self }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.cell
            .compare_exchange(LOCKED, UNLOCKED, MemoryOrder::Acquire)
            == UNLOCKED
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for SpinLock<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .field("backend", &B::NAME)
            .finish()
    }
}

/// RAII hold on a [`SpinLock`]
#[must_use = "if unused the SpinLock will immediately unlock"]
pub struct SpinLockGuard<'a, B: Backend = Native> {
    lock: &'a SpinLock<B>,
}

impl<B: Backend> Drop for SpinLockGuard<'_, B> {
    fn drop(&mut self) {
        let _ = self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::backend::{Posix, Win32};
    use std::cell::UnsafeCell;
    use std::sync::Arc;
    use std::thread;

    struct Shared<B: Backend> {
        lock: SpinLock<B>,
        value: UnsafeCell<u64>,
    }

    // SAFETY: `value` is only touched under `lock`.
    unsafe impl<B: Backend> Sync for Shared<B> {}

    fn check_mutual_exclusion<B: Backend>() {
        let shared = Arc::new(Shared::<B> {
            lock: SpinLock::with_backend(SyncConfig::low_latency()),
            value: UnsafeCell::new(0),
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let _guard = shared.lock.guard();
                        unsafe { *shared.value.get() += 1 };
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(unsafe { *shared.value.get() }, 8000);
        assert!(!shared.lock.is_locked());
    }

    #[test]
    fn test_mutual_exclusion_posix() {
        check_mutual_exclusion::<Posix>();
    }

    #[test]
    fn test_mutual_exclusion_win32() {
        check_mutual_exclusion::<Win32>();
    }

    #[test]
    fn test_try_lock() {
        let lock = SpinLock::new();
        lock.try_lock().unwrap();
        assert!(lock.is_locked());
        assert_eq!(lock.try_lock(), Err(SyncError::WouldBlock));
        lock.unlock().unwrap();
        assert!(!lock.is_locked());
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_unlock_free_lock_reported() {
        let lock = SpinLock::new();
        assert_eq!(lock.unlock(), Err(SyncError::NotLocked));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "spinlock unlocked while not held")]
    fn test_unlock_free_lock_asserts() {
        let lock = SpinLock::new();
        let _ = lock.unlock();
    }
}
