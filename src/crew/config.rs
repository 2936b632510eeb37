/*!
 * Crew Configuration
 *
 * Environment variables:
 * - CREW_WORKLOAD_ITERATIONS: synthetic workload rounds per data point
 * - CREW_SHUTDOWN_GRACE_MS: how long shutdown waits before reporting stragglers
 * - CREW_BATCH_TIMEOUT_MS: per-batch drain timeout (unset: wait forever)
 * - CREW_PERSISTENT_WORKERS: keep workers alive between batches (1|true)
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::{DEFAULT_SHUTDOWN_GRACE, DEFAULT_WORKLOAD_ITERATIONS, MAX_CREW_SIZE};
use crate::core::sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// What a worker does once the pending count drains to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Leave the processing loop; the crew serves a single batch
    #[default]
    ExitOnDrain,
    /// Go back to waiting for the next batch until shutdown
    Persistent,
}

/// Work crew configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewConfig {
    /// Number of worker tasks
    pub size: usize,
    /// Synthetic workload rounds per data point
    pub workload_iterations: u64,
    pub drain: DrainPolicy,
    /// Give up on a batch that does not drain within this time
    pub batch_timeout: Option<Duration>,
    /// Time shutdown waits for workers before reporting stragglers
    pub shutdown_grace: Duration,
    pub sync: SyncConfig,
}

impl CrewConfig {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Defaults overridden by `CREW_*` environment variables
    pub fn from_env(size: usize) -> Self {
        let mut config = Self::new(size);

        if let Some(iterations) = env_parse::<u64>("CREW_WORKLOAD_ITERATIONS") {
            config.workload_iterations = iterations;
        }
        if let Some(ms) = env_parse::<u64>("CREW_SHUTDOWN_GRACE_MS") {
            config.shutdown_grace = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("CREW_BATCH_TIMEOUT_MS") {
            config.batch_timeout = Some(Duration::from_millis(ms));
        }
        if let Ok(value) = env::var("CREW_PERSISTENT_WORKERS") {
            if value == "1" || value == "true" {
                config.drain = DrainPolicy::Persistent;
            }
        }

        config
    }

    pub fn with_drain(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.size == 0 || self.size > MAX_CREW_SIZE {
            return Err(SyncError::InvalidArgument(format!(
                "crew size must be between 1 and {}, got {}",
                MAX_CREW_SIZE, self.size
            )));
        }
        Ok(())
    }
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            size: 1,
            workload_iterations: DEFAULT_WORKLOAD_ITERATIONS,
            drain: DrainPolicy::default(),
            batch_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            sync: SyncConfig::default(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_validate_bounds() {
        assert!(CrewConfig::new(4).validate().is_ok());
        assert!(matches!(
            CrewConfig::new(0).validate(),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!(CrewConfig::new(MAX_CREW_SIZE + 1).validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("CREW_WORKLOAD_ITERATIONS", "42");
        env::set_var("CREW_BATCH_TIMEOUT_MS", "250");
        env::set_var("CREW_PERSISTENT_WORKERS", "true");
        env::set_var("CREW_SHUTDOWN_GRACE_MS", "not-a-number");

        let config = CrewConfig::from_env(3);

        env::remove_var("CREW_WORKLOAD_ITERATIONS");
        env::remove_var("CREW_BATCH_TIMEOUT_MS");
        env::remove_var("CREW_PERSISTENT_WORKERS");
        env::remove_var("CREW_SHUTDOWN_GRACE_MS");

        assert_eq!(config.size, 3);
        assert_eq!(config.workload_iterations, 42);
        assert_eq!(config.batch_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.drain, DrainPolicy::Persistent);
        assert_eq!(config.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        let config = CrewConfig::from_env(2);
        assert_eq!(config.drain, DrainPolicy::ExitOnDrain);
        assert_eq!(config.batch_timeout, None);
    }
}
