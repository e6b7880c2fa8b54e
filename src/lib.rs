//! # sumo-shipper
//!
//! Reliable delivery engine for batched log and metric payloads sent to an HTTP
//! collection endpoint.
//!
//! ## Design Philosophy
//!
//! sumo-shipper is designed to be:
//! - **At-least-once** - Transient failures are requeued, never silently dropped
//! - **Bounded** - At most `sender_max` requests are in flight at any time
//! - **Library-first** - No CLI, no logging subscriber, purely a crate for embedding
//! - **Event-driven** - Consumers subscribe to delivery events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use sumo_shipper::{Config, Sender};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::parse("https://collectors.example.com/receiver/v1/http/TOKEN")?;
//!     config.sender_max = 4;
//!     config.compress = true;
//!     config.source_category = Some("prod/web".to_string());
//!
//!     let sender = Sender::new(config)?;
//!     if !sender.connect().await {
//!         eprintln!("collection endpoint is not reachable yet");
//!     }
//!
//!     sender.start().await?;
//!     sender.send_log("2024-01-01T00:00:00Z GET /index.html 200\n").await?;
//!
//!     // Flushes everything still queued before returning
//!     sender.stop().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Request body compression
pub mod compress;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// HTTP header construction
pub mod headers;
/// Content queue between producers and the dispatch loop
pub mod queue;
/// Requeue policy for failed deliveries
pub mod retry;
/// Delivery engine (decomposed into focused submodules)
pub mod sender;
/// Delivery statistics counters
pub mod stats;
/// HTTP transport abstraction
pub mod transport;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use compress::Compressor;
pub use config::{CompressEncoding, Config, MetricsFormat};
pub use error::{Error, Result};
pub use headers::{HeaderSet, Headers, build_headers};
pub use queue::ContentQueue;
pub use retry::{RetryDecision, RetryPolicy};
pub use sender::Sender;
pub use stats::{Statistics, StatsSnapshot};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{Content, ContentKind, DeliveryOutcome, DropReason, Event, SenderState};
