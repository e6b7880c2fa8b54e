//! Dispatch loop and per-item delivery.

use crate::retry::RetryDecision;
use crate::types::{Content, ContentKind, DeliveryOutcome, DropReason, Event};
use crate::utils::payload_preview;
use tokio::sync::OwnedSemaphorePermit;

use super::Sender;

/// Lifecycle phase a request was dispatched in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Dispatched by the dispatch loop while running
    Running,
    /// Dispatched by `stop()` while flushing the queue
    Draining,
}

impl Sender {
    /// Receive content until the stop signal fires
    ///
    /// Runs as a single spawned task. An item already dequeued when the stop
    /// signal fires is still dispatched before the loop exits.
    pub(crate) async fn run_dispatch_loop(self) {
        tracing::info!(url = %self.config.url, "Dispatch loop started");

        loop {
            let content = tokio::select! {
                biased;
                () = self.control.stop_token.cancelled() => break,
                content = self.queue.dequeue() => content,
            };
            self.dispatch(content, Phase::Running).await;
        }

        tracing::info!("Dispatch loop stopped");
    }

    /// Acquire a permit and spawn the delivery of one item
    ///
    /// Waits while all `sender_max` permits are in use; this is the
    /// backpressure point of the engine.
    pub(crate) async fn dispatch(&self, content: Content, phase: Phase) {
        if content.kind == ContentKind::Stats && !self.config.stats_enabled {
            tracing::debug!(
                bytes = content.len(),
                "Stats channel disabled, dropping stats content"
            );
            self.emit_event(Event::Dropped {
                kind: content.kind,
                bytes: content.len(),
                reason: DropReason::StatsDisabled,
            });
            return;
        }

        let permit = match self.control.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                // The pool is never closed, so this only happens on a broken invariant
                tracing::error!(
                    error = %e,
                    preview = %payload_preview(&content.payload),
                    "Permit pool closed, requeueing content"
                );
                self.queue.requeue(content).await;
                return;
            }
        };

        let sender = self.clone();
        self.control.tracker.spawn(async move {
            sender.deliver(content, phase, permit).await;
        });
    }

    /// Compress, POST and handle the outcome of one item
    async fn deliver(&self, content: Content, phase: Phase, permit: OwnedSemaphorePermit) {
        let headers = match content.kind {
            ContentKind::Log => &self.headers.regular,
            ContentKind::Stats => &self.headers.stats,
        };

        let body = match self.compressor.compress(&content.payload) {
            Ok(body) => body,
            Err(e) => {
                drop(permit);
                tracing::error!(
                    url = %self.config.url,
                    error_class = e.class(),
                    error = %e,
                    preview = %payload_preview(&content.payload),
                    "Failed to compress content, dropping"
                );
                self.emit_event(Event::Dropped {
                    kind: content.kind,
                    bytes: content.len(),
                    reason: DropReason::CompressionFailed,
                });
                return;
            }
        };

        self.stats.record_request(content.len(), body.len());
        tracing::debug!(
            url = %self.config.url,
            kind = %content.kind,
            bytes = content.len(),
            compressed_bytes = body.len(),
            ?phase,
            "Sending content"
        );

        let outcome = match self.transport.post(&self.config.url, headers, body).await {
            Ok(status) => {
                self.stats.record_success(status);
                DeliveryOutcome::from_status(status)
            }
            Err(e) => {
                self.stats.record_failure();
                DeliveryOutcome::TransportFailure {
                    class: e.class().to_string(),
                    error: e.to_string(),
                }
            }
        };

        // Released before any retry delay so a sleeping retry never holds a slot
        drop(permit);

        self.handle_outcome(content, outcome, phase).await;
    }

    async fn handle_outcome(&self, content: Content, outcome: DeliveryOutcome, phase: Phase) {
        match &outcome {
            DeliveryOutcome::Accepted { status } => {
                tracing::debug!(
                    url = %self.config.url,
                    kind = %content.kind,
                    status,
                    "Content delivered"
                );
                self.emit_event(Event::Delivered {
                    kind: content.kind,
                    status: *status,
                    bytes: content.len(),
                });
            }
            DeliveryOutcome::Rejected { status } => {
                tracing::warn!(
                    url = %self.config.url,
                    kind = %content.kind,
                    status,
                    preview = %payload_preview(&content.payload),
                    "Endpoint rejected content"
                );
                self.emit_event(Event::Rejected {
                    kind: content.kind,
                    status: *status,
                });
            }
            DeliveryOutcome::TransportFailure { class, error } => {
                tracing::warn!(
                    url = %self.config.url,
                    kind = %content.kind,
                    error_class = %class,
                    error = %error,
                    preview = %payload_preview(&content.payload),
                    "Request failed without a response"
                );
                self.emit_event(Event::TransportFailed {
                    kind: content.kind,
                    error: error.clone(),
                });
            }
        }

        match self.policy.decide(&outcome) {
            RetryDecision::Done => {}
            RetryDecision::Drop => {
                tracing::error!(
                    url = %self.config.url,
                    kind = %content.kind,
                    bytes = content.len(),
                    preview = %payload_preview(&content.payload),
                    "Dropping permanently rejected content"
                );
                self.emit_event(Event::Dropped {
                    kind: content.kind,
                    bytes: content.len(),
                    reason: DropReason::PermanentRejection,
                });
            }
            RetryDecision::Requeue => self.requeue_after_failure(content, phase).await,
        }
    }

    /// Put failed content back on the queue
    ///
    /// Content that failed in the drain phase, or any content when retry is
    /// disabled, is dropped instead. The delay is skipped once stop has begun so
    /// the drain loop can pick the item up immediately.
    async fn requeue_after_failure(&self, content: Content, phase: Phase) {
        let Some(delay) = self.policy.delay() else {
            tracing::warn!(
                url = %self.config.url,
                kind = %content.kind,
                bytes = content.len(),
                preview = %payload_preview(&content.payload),
                "Retry disabled, dropping failed content"
            );
            self.emit_event(Event::Dropped {
                kind: content.kind,
                bytes: content.len(),
                reason: DropReason::RetryDisabled,
            });
            return;
        };

        if phase == Phase::Draining {
            tracing::error!(
                url = %self.config.url,
                kind = %content.kind,
                bytes = content.len(),
                preview = %payload_preview(&content.payload),
                "Final attempt during shutdown failed, dropping content"
            );
            self.emit_event(Event::Dropped {
                kind: content.kind,
                bytes: content.len(),
                reason: DropReason::FailedDuringDrain,
            });
            return;
        }

        if !self.control.stop_token.is_cancelled() {
            tracing::debug!(delay_secs = delay.as_secs(), "Waiting before requeue");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.control.stop_token.cancelled() => {
                    tracing::debug!("Requeue delay interrupted by stop");
                }
            }
        }

        let (kind, bytes) = (content.kind, content.len());
        self.queue.requeue(content).await;
        tracing::info!(kind = %kind, bytes, "Content requeued");
        self.emit_event(Event::Requeued { kind, bytes });
    }
}
