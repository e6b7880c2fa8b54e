//! Delivery statistics counters
//!
//! Lock-free atomic counters recorded by request tasks. Up to `sender_max`
//! completions may record concurrently, so every counter is an independent
//! `AtomicU64` updated with `fetch_add`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe delivery counters
///
/// Counters only ever increase; nothing in the engine resets them.
#[derive(Debug, Default)]
pub struct Statistics {
    total_requests: AtomicU64,
    total_request_bytes: AtomicU64,
    total_compressed_bytes: AtomicU64,
    total_responses: AtomicU64,
    accepted_responses: AtomicU64,
    rejected_responses: AtomicU64,
    total_failures: AtomicU64,
}

/// Point-in-time copy of [`Statistics`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Requests issued
    pub total_requests: u64,
    /// Uncompressed bytes across all requests
    pub total_request_bytes: u64,
    /// Bytes actually sent across all requests
    pub total_compressed_bytes: u64,
    /// Responses received (any status)
    pub total_responses: u64,
    /// Responses with a 2xx status
    pub accepted_responses: u64,
    /// Responses with a non-2xx status
    pub rejected_responses: u64,
    /// Requests that failed without a response
    pub total_failures: u64,
}

impl Statistics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issued request and its raw and on-the-wire sizes
    pub fn record_request(&self, raw_bytes: usize, compressed_bytes: usize) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_bytes
            .fetch_add(raw_bytes as u64, Ordering::Relaxed);
        self.total_compressed_bytes
            .fetch_add(compressed_bytes as u64, Ordering::Relaxed);
    }

    /// Record a received response
    pub fn record_success(&self, status: u16) {
        self.total_responses.fetch_add(1, Ordering::Relaxed);
        if (200..300).contains(&status) {
            self.accepted_responses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected_responses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a request that failed without a response
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_request_bytes: self.total_request_bytes.load(Ordering::Relaxed),
            total_compressed_bytes: self.total_compressed_bytes.load(Ordering::Relaxed),
            total_responses: self.total_responses.load(Ordering::Relaxed),
            accepted_responses: self.accepted_responses.load(Ordering::Relaxed),
            rejected_responses: self.rejected_responses.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
        }
    }
}
