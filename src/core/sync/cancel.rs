/*!
 * Cooperative Cancellation
 *
 * A shared flag checked at suspension points. Blocking waits that accept a
 * token wake at least once per poll interval to observe it, then return
 * `Cancelled` with their lock re-acquired.
 */

use super::atomic::{AtomicCell, MemoryOrder};
use crate::core::limits::CANCEL_POLL_INTERVAL;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Cloneable cancellation flag; all clones observe the same state
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicCell<i32>>,
    poll_interval: Duration,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::with_poll_interval(CANCEL_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicCell::new(0)),
            poll_interval,
        }
    }

    /// Request cancellation; returns `true` if this call set the flag
    pub fn cancel(&self) -> bool {
        self.flag.exchange(1, MemoryOrder::Release) == 0
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(MemoryOrder::Acquire) != 0
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        assert!(token.cancel());
        assert!(clone.is_cancelled());

        // Second cancel is a no-op
        assert!(!clone.cancel());
    }

    #[test]
    fn test_poll_interval() {
        let token = CancelToken::with_poll_interval(Duration::from_millis(3));
        assert_eq!(token.poll_interval(), Duration::from_millis(3));
        assert_eq!(CancelToken::default().poll_interval(), CANCEL_POLL_INTERVAL);
    }
}
