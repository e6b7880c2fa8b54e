//! Startup and drain-and-stop coordination.

use crate::error::{Error, Result};
use crate::types::{Event, SenderState};
use std::sync::atomic::Ordering;

use super::Sender;
use super::dispatch::Phase;

impl Sender {
    /// Start the dispatch loop
    ///
    /// Moves the sender from `Idle` to `Running` and spawns a single dispatch
    /// task. Content sent while idle is delivered from this point on.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the sender is not idle; a sender cannot
    /// be started twice or restarted after stop.
    pub async fn start(&self) -> Result<()> {
        let mut handle = self.control.dispatch_handle.lock().await;

        if let Err(current) = self.control.state.compare_exchange(
            SenderState::Idle as u8,
            SenderState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            return Err(Error::InvalidState {
                operation: "start".to_string(),
                state: SenderState::from_u8(current).to_string(),
            });
        }

        *handle = Some(tokio::spawn(self.clone().run_dispatch_loop()));

        tracing::info!(
            url = %self.config.url,
            sender_max = self.config.sender_max,
            "Sender started"
        );
        Ok(())
    }

    /// Gracefully stop the sender
    ///
    /// This method blocks until shutdown is complete:
    /// 1. Refuses new content (`send` returns `Error::ShuttingDown`)
    /// 2. Signals the dispatch loop to stop and interrupts pending retry delays
    /// 3. Waits for the dispatch loop to exit
    /// 4. Dispatches everything left in the queue and waits for all in-flight
    ///    requests, repeating until the queue stays empty
    ///
    /// Every item queued before `stop()` gets at least one delivery attempt.
    /// Calling `stop()` on an idle sender flushes its buffer the same way;
    /// calling it on a stopped sender is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for transports that need
    /// fallible teardown.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.control.stop_lock.lock().await;

        if self.state() == SenderState::Stopped {
            tracing::debug!("Sender already stopped");
            return Ok(());
        }

        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new content
        self.set_state(SenderState::Draining);

        // 2. Wake the dispatch loop and any sleeping retries
        self.control.stop_token.cancel();
        self.control.tracker.close();

        // 3. Wait for the dispatch loop to hand over
        let handle = self.control.dispatch_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Dispatch loop task failed");
            }
        }

        // 4. Flush the queue until nothing is left and nothing is in flight
        self.drain().await;

        self.set_state(SenderState::Stopped);
        self.emit_event(Event::Stopped);

        let stats = self.stats.snapshot();
        tracing::info!(
            total_requests = stats.total_requests,
            accepted = stats.accepted_responses,
            rejected = stats.rejected_responses,
            failures = stats.total_failures,
            "Shutdown complete"
        );
        Ok(())
    }

    async fn drain(&self) {
        loop {
            let pending = self.queue.drain().await;
            if !pending.is_empty() {
                tracing::info!(items = pending.len(), "Flushing queued content");
            }
            for content in pending {
                self.dispatch(content, Phase::Draining).await;
            }

            // In-flight requests may requeue immediately once stop has begun
            self.control.tracker.wait().await;

            let sends_idle = self.control.sends_idle.notified();
            if !self.queue.is_empty().await {
                continue;
            }
            if self.control.pending_sends.load(Ordering::SeqCst) == 0 {
                break;
            }
            // A producer that passed the state check before shutdown is still enqueueing
            sends_idle.await;
        }
    }
}
