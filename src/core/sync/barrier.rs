/*!
 * Rendezvous Barrier
 *
 * Counted wait with a generation number: a caller blocks until the phase's
 * participant count has arrived, and waits for the generation to change
 * rather than for the count to drop, so a fast caller re-entering the next
 * phase cannot release stragglers of the previous one.
 */

use super::backend::{Backend, Native};
use super::condition::Condition;
use super::mutex::Protected;
use crate::core::errors::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
struct BarrierState {
    parties: usize,
    /// Participant count of the phase in progress
    target: usize,
    arrived: usize,
    /// Released callers that have not yet observed the generation change
    leaving: usize,
    generation: u64,
}

/// Outcome of a barrier wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierWaitResult {
    is_leader: bool,
    generation: u64,
}

impl BarrierWaitResult {
    /// Exactly one caller per completed phase (the last to arrive) is the leader
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// Generation number of the phase this caller took part in
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Reusable rendezvous point
pub struct Barrier<B: Backend = Native> {
    state: Protected<BarrierState>,
    cond: Condition<B>,
}

impl Barrier {
    pub fn new(parties: usize) -> Self {
        Self::with_backend(parties)
    }
}

impl<B: Backend> Barrier<B> {
    pub fn with_backend(parties: usize) -> Self {
        Self {
            state: Protected::new(BarrierState {
                parties,
                target: parties,
                arrived: 0,
                leaving: 0,
                generation: 0,
            }),
            cond: Condition::with_backend(),
        }
    }

    /// Block until `n` callers (0: the constructed count) have arrived
    ///
    /// The first arrival fixes the phase's count; later callers of the same
    /// phase passing a different non-zero `n` get `InvalidArgument`.
    pub fn block(&self, n: usize) -> SyncResult<BarrierWaitResult> {
        let mut state = self.state.lock()?;
        let want = if n == 0 { state.parties } else { n };
        if want == 0 {
            return Err(SyncError::InvalidArgument(
                "barrier needs at least one participant".into(),
            ));
        }

        if state.arrived == 0 {
            state.target = want;
        } else if want != state.target {
            return Err(SyncError::InvalidArgument(format!(
                "barrier phase expects {} participants, caller asked for {}",
                state.target, want
            )));
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived >= state.target {
            let leaving = state.arrived - 1;
            self.advance(&mut state, leaving);
            return Ok(BarrierWaitResult {
                is_leader: true,
                generation,
            });
        }

        while state.generation == generation {
            self.cond.wait_guard(&mut state)?;
        }
        state.leaving -= 1;

        Ok(BarrierWaitResult {
            is_leader: false,
            generation,
        })
    }

    /// Block until the constructed participant count has arrived
    pub fn wait(&self) -> SyncResult<BarrierWaitResult> {
        self.block(0)
    }

    /// Complete the current phase early, releasing whoever is blocked
    ///
    /// Returns how many callers were released.
    pub fn release(&self) -> SyncResult<usize> {
        let mut state = self.state.lock()?;
        let released = state.arrived;
        if released > 0 {
            self.advance(&mut state, released);
        }
        Ok(released)
    }

    /// Restart generation numbering
    ///
    /// `Busy` while callers are blocked, or while callers released by the
    /// last phase have not yet left `block`.
    pub fn reset(&self) -> SyncResult<()> {
        let mut state = self.state.lock()?;
        if state.arrived > 0 || state.leaving > 0 {
            return Err(SyncError::Busy(format!(
                "{} callers blocked and {} leaving barrier",
                state.arrived, state.leaving
            )));
        }
        state.generation = 0;
        state.target = state.parties;
        Ok(())
    }

    /// Close the phase; `leaving` released callers still have to wake and exit
    fn advance(&self, state: &mut BarrierState, leaving: usize) {
        state.leaving += leaving;
        state.arrived = 0;
        state.generation = state.generation.wrapping_add(1);
        self.cond.broadcast();
    }

    /// Callers currently blocked in the phase in progress
    pub fn blocked_count(&self) -> SyncResult<usize> {
        Ok(self.state.lock()?.arrived)
    }

    pub fn generation(&self) -> SyncResult<u64> {
        Ok(self.state.lock()?.generation)
    }

    pub fn parties(&self) -> SyncResult<usize> {
        Ok(self.state.lock()?.parties)
    }
}

impl<B: Backend> fmt::Debug for Barrier<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Barrier");
        if let Ok(state) = self.state.try_lock() {
            s.field("parties", &state.parties)
                .field("arrived", &state.arrived)
                .field("leaving", &state.leaving)
                .field("generation", &state.generation);
        }
        s.field("backend", &B::NAME).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_single_party_never_blocks() {
        let barrier = Barrier::new(1);
        let result = barrier.wait().unwrap();
        assert!(result.is_leader());
        assert_eq!(result.generation(), 0);
        assert_eq!(barrier.generation().unwrap(), 1);
    }

    #[test]
    fn test_zero_parties_rejected() {
        let barrier = Barrier::new(0);
        assert!(matches!(barrier.wait(), Err(SyncError::InvalidArgument(_))));
    }

    #[test]
    fn test_one_leader_per_phase() {
        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || barrier.wait().unwrap().is_leader())
            })
            .collect();

        let leaders = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&leader| leader)
            .count();
        assert_eq!(leaders, 1);
    }

    #[test]
    fn test_release_frees_blocked_callers() {
        let barrier = Arc::new(Barrier::new(3));
        let b = barrier.clone();
        let handle = thread::spawn(move || b.wait());

        while barrier.blocked_count().unwrap() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(matches!(barrier.reset(), Err(SyncError::Busy(_))));
        assert_eq!(barrier.release().unwrap(), 1);

        let result = handle.join().unwrap().unwrap();
        assert!(!result.is_leader());
        barrier.reset().unwrap();
        assert_eq!(barrier.generation().unwrap(), 0);
    }

    #[test]
    fn test_reset_after_phase_does_not_strand_released_waiter() {
        for _ in 0..20 {
            let barrier = Arc::new(Barrier::new(2));
            let (tx, rx) = mpsc::channel();
            let b = barrier.clone();
            thread::spawn(move || {
                let _ = tx.send(b.wait());
            });

            while barrier.blocked_count().unwrap() == 0 {
                thread::yield_now();
            }
            assert!(barrier.wait().unwrap().is_leader());

            // Refused until the released waiter has left
            while let Err(err) = barrier.reset() {
                assert!(matches!(err, SyncError::Busy(_)));
                thread::yield_now();
            }

            let result = rx.recv_timeout(Duration::from_millis(500)).unwrap().unwrap();
            assert!(!result.is_leader());
            assert_eq!(result.generation(), 0);
            assert_eq!(barrier.generation().unwrap(), 0);
        }
    }
}
