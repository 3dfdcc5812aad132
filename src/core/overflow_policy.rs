//! Backpressure policies for the async sink queue
//!
//! When an [`AsyncSink`](crate::sinks::AsyncSink) queue is full, the policy
//! decides which message is lost, or whether the producer waits.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy applied when a write finds the async queue full
///
/// # Example
///
/// ```
/// use rust_sink_logger::DropPolicy;
/// use std::time::Duration;
///
/// let policy = DropPolicy::default();
/// assert_eq!(policy, DropPolicy::DropNewest);
///
/// let policy = DropPolicy::Block(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    /// Discard the incoming message; the queue is left untouched
    #[default]
    DropNewest,

    /// Evict the oldest queued message to make room for the incoming one
    DropOldest,

    /// Wait up to the timeout for space, then discard the incoming message
    ///
    /// Trades bounded caller latency for fewer losses.
    Block(Duration),
}

impl DropPolicy {
    /// Whether this policy can suspend the producer
    pub fn is_blocking(&self) -> bool {
        matches!(self, DropPolicy::Block(_))
    }
}

impl fmt::Display for DropPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropPolicy::DropNewest => write!(f, "DropNewest"),
            DropPolicy::DropOldest => write!(f, "DropOldest"),
            DropPolicy::Block(d) => write!(f, "Block({:?})", d),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when messages are dropped due to queue overflow.
/// The parameter is the total count of dropped messages so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_policy_default() {
        assert_eq!(DropPolicy::default(), DropPolicy::DropNewest);
    }

    #[test]
    fn test_drop_policy_display() {
        assert_eq!(DropPolicy::DropNewest.to_string(), "DropNewest");
        assert_eq!(DropPolicy::DropOldest.to_string(), "DropOldest");
        assert_eq!(
            DropPolicy::Block(Duration::from_millis(100)).to_string(),
            "Block(100ms)"
        );
    }

    #[test]
    fn test_only_block_is_blocking() {
        assert!(!DropPolicy::DropNewest.is_blocking());
        assert!(!DropPolicy::DropOldest.is_blocking());
        assert!(DropPolicy::Block(Duration::ZERO).is_blocking());
    }
}
