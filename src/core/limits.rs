/*!
 * System Limits and Constants
 *
 * Centralized location for all tunables, thresholds, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 *
 * ## Conventions
 * - Values are grouped by domain (spinning, waiting, crew)
 * - Performance-critical constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// SPINNING
// =============================================================================

/// Tight-spin iterations before yielding the processor
/// [PERF] Covers critical sections of a few hundred nanoseconds
pub const SPIN_TIGHT_ITERATIONS: u32 = 10;

/// Iterations spent yielding before backoff sleeps kick in
pub const SPIN_YIELD_ITERATIONS: u32 = 50;

/// Upper bound for a single backoff sleep
pub const SPIN_MAX_BACKOFF: Duration = Duration::from_micros(100);

// =============================================================================
// WAITING
// =============================================================================

/// How often a cancellable wait wakes up to check its cancellation token
/// [PERF] Cancellation latency vs idle wakeups
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

// =============================================================================
// WORK CREW
// =============================================================================

/// Items enqueued per batch by the worked example
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// Value carried by each work item of the worked example
pub const DEFAULT_ITEM_VALUE: f64 = 10.0;

/// Random add/subtract rounds per data point in the synthetic workload
pub const DEFAULT_WORKLOAD_ITERATIONS: u64 = 1_000_000;

/// Grace period for workers to observe shutdown before being reported as stragglers
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);

/// Interval between liveness checks while waiting out the shutdown grace period
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Largest crew the command-line entry point will create
pub const MAX_CREW_SIZE: usize = 1024;

/// Batches taking longer than this are logged as slow
pub const SLOW_BATCH_THRESHOLD: Duration = Duration::from_secs(1);
