/*!
 * Synchronization Configuration
 *
 * Runtime tuning for spinning and cancellable waits
 */

use crate::core::limits::{
    CANCEL_POLL_INTERVAL, SPIN_MAX_BACKOFF, SPIN_TIGHT_ITERATIONS, SPIN_YIELD_ITERATIONS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Tight-spin rounds before yielding
    pub tight_spins: u32,
    /// Yield rounds before sleeping
    pub yield_spins: u32,
    /// Upper bound for a single backoff sleep
    pub max_backoff: Duration,
    /// How often cancellable waits check their token
    pub cancel_poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tight_spins: SPIN_TIGHT_ITERATIONS,
            yield_spins: SPIN_YIELD_ITERATIONS,
            max_backoff: SPIN_MAX_BACKOFF,
            cancel_poll_interval: CANCEL_POLL_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for low-latency (< 1ms wait expected)
    pub const fn low_latency() -> Self {
        Self {
            tight_spins: 20,
            yield_spins: 200,
            max_backoff: Duration::from_micros(20),
            cancel_poll_interval: Duration::from_millis(1),
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            tight_spins: 2,
            yield_spins: 10,
            max_backoff: Duration::from_millis(1),
            cancel_poll_interval: Duration::from_millis(50),
        }
    }
}
