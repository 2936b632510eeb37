/*!
 * Mutex
 *
 * Binary ownership token over `parking_lot::RawMutex` with owner and
 * hold-count tracking, so misuse is reported instead of corrupting state:
 * - normal mutex re-locked by its owner: `WouldDeadlock`
 * - unlock by a task that does not own it: `NotOwner`
 *
 * Recursive mutexes let the owner lock again and require one unlock per lock.
 */

use crate::core::errors::{SyncError, SyncResult};
use parking_lot::lock_api::{GetThreadId, RawMutex as RawMutexApi};
use parking_lot::{RawMutex, RawThreadId};
use serde::{Deserialize, Serialize};
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Locking discipline fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutexKind {
    #[default]
    Normal,
    Recursive,
}

/// Non-zero identifier of the calling thread
#[inline]
fn current_thread() -> usize {
    RawThreadId::INIT.nonzero_thread_id().get()
}

/// Mutual-exclusion lock returning `SyncResult` instead of panicking
///
/// Not `Clone`; share it by reference or `Arc`.
pub struct Mutex {
    raw: RawMutex,
    /// Thread id of the holder, 0 when unlocked
    owner: AtomicUsize,
    /// Hold count; only touched by the owner
    depth: AtomicU32,
    kind: MutexKind,
}

impl Mutex {
    pub const fn new(kind: MutexKind) -> Self {
        Self {
            raw: <RawMutex as RawMutexApi>::INIT,
            owner: AtomicUsize::new(0),
            depth: AtomicU32::new(0),
            kind,
        }
    }

    pub const fn normal() -> Self {
        Self::new(MutexKind::Normal)
    }

    pub const fn recursive() -> Self {
        Self::new(MutexKind::Recursive)
    }

    pub fn kind(&self) -> MutexKind {
        self.kind
    }

    /// Whether any task holds the lock right now (racy; diagnostics only)
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Whether the calling task holds the lock
    #[inline]
    pub fn is_owned_by_current(&self) -> bool {
        // Only the owner itself can store its own id, so a relaxed read is exact here
        self.owner.load(Ordering::Relaxed) == current_thread()
    }

    /// Block until the lock is acquired
    pub fn lock(&self) -> SyncResult<()> {
        if self.is_owned_by_current() {
            return match self.kind {
                MutexKind::Recursive => {
                    self.depth.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                MutexKind::Normal => Err(SyncError::WouldDeadlock),
            };
        }

        self.raw.lock();
        self.set_owner(1);
        Ok(())
    }

    /// Acquire without blocking; `WouldBlock` when contended
    pub fn try_lock(&self) -> SyncResult<()> {
        if self.is_owned_by_current() {
            return match self.kind {
                MutexKind::Recursive => {
                    self.depth.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                MutexKind::Normal => Err(SyncError::WouldBlock),
            };
        }

        if self.raw.try_lock() {
            self.set_owner(1);
            Ok(())
        } else {
            Err(SyncError::WouldBlock)
        }
    }

    /// Release one hold; the lock is freed when the hold count reaches zero
    pub fn unlock(&self) -> SyncResult<()> {
        if !self.is_owned_by_current() {
            return Err(SyncError::NotOwner);
        }

        if self.depth.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.release_raw();
        }
        Ok(())
    }

    /// Lock and return a guard that unlocks on drop
    pub fn guard(&self) -> SyncResult<MutexGuard<'_>> {
        self.lock()?;
        Ok(MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }

    /// Hold count of the calling owner, or `NotOwner`
    pub(crate) fn held_depth(&self) -> SyncResult<u32> {
        if self.is_owned_by_current() {
            Ok(self.depth.load(Ordering::Relaxed))
        } else {
            Err(SyncError::NotOwner)
        }
    }

    /// Drop every hold at once; caller must be the owner
    pub(crate) fn release_all(&self) {
        self.depth.store(0, Ordering::Relaxed);
        self.release_raw();
    }

    /// Re-take the lock with a previously saved hold count
    pub(crate) fn reacquire(&self, depth: u32) {
        self.raw.lock();
        self.set_owner(depth);
    }

    #[inline]
    fn set_owner(&self, depth: u32) {
        self.depth.store(depth, Ordering::Relaxed);
        self.owner.store(current_thread(), Ordering::Relaxed);
    }

    #[inline]
    fn release_raw(&self) {
        self.owner.store(0, Ordering::Relaxed);
        // SAFETY: only reached by the owner, which holds `raw`.
        unsafe { self.raw.unlock() };
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::normal()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("kind", &self.kind)
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        debug_assert!(!self.raw.is_locked(), "mutex destroyed while held");
    }
}

/// RAII hold on a [`Mutex`]
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
    _not_send: PhantomData<*const ()>,
}

impl MutexGuard<'_> {
    pub fn mutex(&self) -> &Mutex {
        self.mutex
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        // NotOwner here means a condition wait unwound and already released it
        let _ = self.mutex.unlock();
    }
}

/// Data that may only be touched while its normal mutex is held
pub struct Protected<T> {
    mutex: Mutex,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is serialized by `mutex`.
unsafe impl<T: Send> Send for Protected<T> {}
unsafe impl<T: Send> Sync for Protected<T> {}

impl<T> Protected<T> {
    pub const fn new(data: T) -> Self {
        Self {
            mutex: Mutex::normal(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> SyncResult<ProtectedGuard<'_, T>> {
        self.mutex.lock()?;
        Ok(self.make_guard())
    }

    pub fn try_lock(&self) -> SyncResult<ProtectedGuard<'_, T>> {
        self.mutex.try_lock()?;
        Ok(self.make_guard())
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn make_guard(&self) -> ProtectedGuard<'_, T> {
        ProtectedGuard {
            owner: self,
            _not_send: PhantomData,
        }
    }
}

impl<T: Default> Default for Protected<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII access to the contents of a [`Protected`]
#[must_use = "if unused the Protected will immediately unlock"]
pub struct ProtectedGuard<'a, T> {
    owner: &'a Protected<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> ProtectedGuard<'_, T> {
    pub(crate) fn mutex(&self) -> &Mutex {
        &self.owner.mutex
    }
}

impl<T> Deref for ProtectedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves the mutex is held.
        unsafe { &*self.owner.data.get() }
    }
}

impl<T> DerefMut for ProtectedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves the mutex is held, and `&mut self` is unique.
        unsafe { &mut *self.owner.data.get() }
    }
}

impl<T> Drop for ProtectedGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.owner.mutex.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_normal_relock_would_deadlock() {
        let mutex = Mutex::normal();
        mutex.lock().unwrap();
        assert_eq!(mutex.lock(), Err(SyncError::WouldDeadlock));
        assert_eq!(mutex.try_lock(), Err(SyncError::WouldBlock));
        mutex.unlock().unwrap();
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_recursive_hold_count() {
        let mutex = Mutex::recursive();
        mutex.lock().unwrap();
        mutex.lock().unwrap();
        mutex.try_lock().unwrap();
        assert_eq!(mutex.held_depth(), Ok(3));

        mutex.unlock().unwrap();
        mutex.unlock().unwrap();
        assert!(mutex.is_locked());
        mutex.unlock().unwrap();
        assert!(!mutex.is_locked());
        assert_eq!(mutex.unlock(), Err(SyncError::NotOwner));
    }

    #[test]
    fn test_unlock_by_non_owner() {
        let mutex = Arc::new(Mutex::recursive());
        mutex.lock().unwrap();

        let other = mutex.clone();
        let result = thread::spawn(move || other.unlock()).join().unwrap();
        assert_eq!(result, Err(SyncError::NotOwner));

        mutex.unlock().unwrap();
    }

    #[test]
    fn test_try_lock_contended() {
        let mutex = Arc::new(Mutex::normal());
        mutex.lock().unwrap();

        let other = mutex.clone();
        let result = thread::spawn(move || other.try_lock()).join().unwrap();
        assert_eq!(result, Err(SyncError::WouldBlock));

        mutex.unlock().unwrap();
        let other = mutex.clone();
        let result = thread::spawn(move || {
            let r = other.try_lock();
            other.unlock().unwrap();
            r
        })
        .join()
        .unwrap();
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_guard_unlocks() {
        let mutex = Mutex::normal();
        {
            let guard = mutex.guard().unwrap();
            assert!(guard.mutex().is_locked());
        }
        assert!(!mutex.is_locked());
    }

    #[test]
    fn test_protected_counter() {
        let counter = Arc::new(Protected::new(0u64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *counter.lock().unwrap() += 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 4000);
    }
}
