//! Core types and events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content, selecting the header set used for delivery
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Regular log or metric content (default)
    #[default]
    Log,
    /// Engine statistics, delivered on the stats channel
    Stats,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Log => write!(f, "log"),
            ContentKind::Stats => write!(f, "stats"),
        }
    }
}

/// One serialized batch of log or metric data awaiting delivery
///
/// Content is opaque to the engine. It may be delivered more than once when a
/// request is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Content {
    /// Uncompressed payload bytes
    pub payload: Vec<u8>,
    /// Kind tag
    pub kind: ContentKind,
}

impl Content {
    /// Create regular log content
    pub fn log(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            kind: ContentKind::Log,
        }
    }

    /// Create stats content
    pub fn stats(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            kind: ContentKind::Stats,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Result of one delivery attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Endpoint answered with a 2xx status
    Accepted {
        /// HTTP status code
        status: u16,
    },
    /// Endpoint answered with a non-2xx status
    Rejected {
        /// HTTP status code
        status: u16,
    },
    /// No response received (connection, timeout or other transport error)
    TransportFailure {
        /// Error classification (see [`Error::class`](crate::Error::class))
        class: String,
        /// Error message
        error: String,
    },
}

impl DeliveryOutcome {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            DeliveryOutcome::Accepted { status }
        } else {
            DeliveryOutcome::Rejected { status }
        }
    }
}

/// Lifecycle state of the delivery engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SenderState {
    /// Constructed, dispatch loop not started
    Idle = 0,
    /// Dispatch loop running
    Running = 1,
    /// `stop()` in progress: flushing queued and in-flight content
    Draining = 2,
    /// Fully stopped; terminal
    Stopped = 3,
}

impl SenderState {
    /// Convert from the stored integer representation
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => SenderState::Idle,
            1 => SenderState::Running,
            2 => SenderState::Draining,
            _ => SenderState::Stopped,
        }
    }
}

impl fmt::Display for SenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderState::Idle => write!(f, "idle"),
            SenderState::Running => write!(f, "running"),
            SenderState::Draining => write!(f, "draining"),
            SenderState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Event emitted during delivery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Content accepted by the endpoint
    Delivered {
        /// Content kind
        kind: ContentKind,
        /// HTTP status code (2xx)
        status: u16,
        /// Uncompressed payload size
        bytes: usize,
    },

    /// Endpoint answered with a non-2xx status
    Rejected {
        /// Content kind
        kind: ContentKind,
        /// HTTP status code
        status: u16,
    },

    /// Request failed without a response
    TransportFailed {
        /// Content kind
        kind: ContentKind,
        /// Error message
        error: String,
    },

    /// Content put back on the queue for another attempt
    Requeued {
        /// Content kind
        kind: ContentKind,
        /// Uncompressed payload size
        bytes: usize,
    },

    /// Content discarded without delivery
    Dropped {
        /// Content kind
        kind: ContentKind,
        /// Uncompressed payload size
        bytes: usize,
        /// Why the content was discarded
        reason: DropReason,
    },

    /// Engine finished draining and stopped
    Stopped,
}

/// Why content was discarded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Endpoint rejected the content with a non-retriable status
    PermanentRejection,
    /// Retry disabled by a negative `sleep_before_requeue`
    RetryDisabled,
    /// Final attempt made during shutdown drain failed
    FailedDuringDrain,
    /// Stats content while the stats channel is disabled
    StatsDisabled,
    /// Payload could not be compressed
    CompressionFailed,
}
