//! Requeue policy for failed deliveries
//!
//! Delivery is at-least-once: transport failures are always retried and a small
//! set of HTTP statuses signalling temporary overload are retried, while every
//! other rejection is permanent. Retries go back through the content queue
//! after a fixed delay rather than looping inside the request task.
//!
//! # Example
//!
//! ```
//! use sumo_shipper::retry::{RetryDecision, RetryPolicy};
//! use sumo_shipper::types::DeliveryOutcome;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(Some(Duration::from_secs(30)));
//! assert_eq!(
//!     policy.decide(&DeliveryOutcome::Rejected { status: 503 }),
//!     RetryDecision::Requeue
//! );
//! assert_eq!(
//!     policy.decide(&DeliveryOutcome::Rejected { status: 400 }),
//!     RetryDecision::Drop
//! );
//! ```

use crate::config::Config;
use crate::types::DeliveryOutcome;
use std::time::Duration;

/// HTTP statuses that signal a temporary condition worth retrying
pub const RETRIABLE_STATUSES: [u16; 3] = [429, 503, 504];

/// Returns true if a rejection with this status should be requeued
pub fn is_retriable_status(status: u16) -> bool {
    RETRIABLE_STATUSES.contains(&status)
}

/// What to do with content after a delivery attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Delivered; nothing more to do
    Done,
    /// Put the content back on the queue
    Requeue,
    /// Discard the content
    Drop,
}

/// Requeue policy derived from configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Option<Duration>,
}

impl RetryPolicy {
    /// Create a policy; `None` disables retry entirely
    pub fn new(delay: Option<Duration>) -> Self {
        Self { delay }
    }

    /// Create a policy from `sleep_before_requeue`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.requeue_delay())
    }

    /// Delay before a requeue, or `None` when retry is disabled
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Classify an outcome
    ///
    /// Returns `Requeue` for transport failures and retriable statuses even when
    /// retry is disabled; callers check [`delay`](Self::delay) for `None` to
    /// turn that into a drop so the reason can be reported distinctly.
    pub fn decide(&self, outcome: &DeliveryOutcome) -> RetryDecision {
        match outcome {
            DeliveryOutcome::Accepted { .. } => RetryDecision::Done,
            DeliveryOutcome::Rejected { status } if is_retriable_status(*status) => {
                RetryDecision::Requeue
            }
            DeliveryOutcome::Rejected { .. } => RetryDecision::Drop,
            DeliveryOutcome::TransportFailure { .. } => RetryDecision::Requeue,
        }
    }
}
