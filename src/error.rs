//! Error types for sumo-shipper
//!
//! This module provides the error type shared by the delivery engine and its helpers:
//! - Configuration errors, fatal at construction
//! - Transport errors from the HTTP layer (retryable)
//! - Lifecycle errors (invalid state transitions, sends during shutdown)
//!
//! Delivery rejections and transport failures inside the engine are never returned to
//! producers; they are logged, counted and emitted as events instead.

use thiserror::Error;

/// Result type alias for sumo-shipper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sumo-shipper
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "sender_max")
        key: Option<String>,
    },

    /// Network error raised by the reqwest transport
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport error raised by a non-reqwest transport implementation
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload compression failed
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// Lifecycle operation not permitted in the current state
    #[error("cannot {operation} sender in state {state}")]
    InvalidState {
        /// The operation that was attempted (e.g., "start")
        operation: String,
        /// The state that prevents the operation (e.g., "stopped")
        state: String,
    },

    /// Shutdown in progress - not accepting new content
    #[error("shutdown in progress: not accepting new content")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a configuration error for the given key.
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Short, stable classification of the error for log fields.
    ///
    /// Never includes payload content, so it is safe to log next to a preview.
    pub fn class(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config",
            Error::Network(e) if e.is_timeout() => "timeout",
            Error::Network(e) if e.is_connect() => "connect",
            Error::Network(e) if e.is_request() => "request",
            Error::Network(_) => "network",
            Error::Transport(_) => "transport",
            Error::Compression(_) => "compression",
            Error::InvalidState { .. } => "invalid_state",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "other",
        }
    }
}
