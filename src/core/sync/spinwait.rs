/*!
 * Adaptive Spin Backoff
 *
 * Optimized for critical sections that are typically very short.
 * Three phases per retry:
 * - tight spin with CPU relax hints
 * - yield the time slice to the scheduler
 * - short capped sleep so a preempted holder can run
 */

use super::config::SyncConfig;
use std::hint;
use std::thread;
use std::time::Duration;

/// Backoff state for one contended acquisition
///
/// # Performance
///
/// - Ultra-low latency while the holder is running on another core
/// - Bounded CPU burn once contention persists
#[derive(Debug)]
pub struct Backoff {
    step: u32,
    tight_spins: u32,
    yield_spins: u32,
    max_sleep: Duration,
}

impl Backoff {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            step: 0,
            tight_spins: config.tight_spins,
            yield_spins: config.yield_spins,
            max_sleep: config.max_backoff,
        }
    }

    /// Wait a little before the next attempt
    pub fn snooze(&mut self) {
        if self.step < self.tight_spins {
            // Exponential spin within the tight phase, capped at 64 relax hints
            for _ in 0..(1u32 << self.step.min(6)) {
                hint::spin_loop();
            }
        } else if self.step < self.tight_spins + self.yield_spins {
            thread::yield_now();
        } else {
            let over = self.step - self.tight_spins - self.yield_spins;
            let sleep = Duration::from_micros(1u64 << over.min(16)).min(self.max_sleep);
            thread::sleep(sleep);
        }
        self.step = self.step.saturating_add(1);
    }

    /// Whether the tight-spin phase is over
    pub fn is_yielding(&self) -> bool {
        self.step >= self.tight_spins
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_phases_advance() {
        let config = SyncConfig {
            tight_spins: 2,
            yield_spins: 2,
            ..SyncConfig::default()
        };
        let mut backoff = Backoff::new(&config);
        assert!(!backoff.is_yielding());

        backoff.snooze();
        backoff.snooze();
        assert!(backoff.is_yielding());

        backoff.reset();
        assert!(!backoff.is_yielding());
    }

    #[test]
    fn test_sleep_is_capped() {
        let config = SyncConfig {
            tight_spins: 0,
            yield_spins: 0,
            max_backoff: Duration::from_micros(50),
            ..SyncConfig::default()
        };
        let mut backoff = Backoff::new(&config);
        for _ in 0..20 {
            backoff.snooze();
        }

        // Every sleep from here on is at most max_backoff
        let start = Instant::now();
        backoff.snooze();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
