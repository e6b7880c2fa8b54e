//! Delivery engine split into focused submodules.
//!
//! The `Sender` struct and its methods are organized by concern:
//! - [`dispatch`] - Dispatch loop, per-item delivery and requeue handling
//! - [`lifecycle`] - Startup and drain-and-stop coordination
//! - [`health`] - Endpoint health probe

mod dispatch;
mod health;
mod lifecycle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::compress::Compressor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::headers::{Headers, build_headers};
use crate::queue::ContentQueue;
use crate::retry::RetryPolicy;
use crate::stats::{Statistics, StatsSnapshot};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{Content, Event, SenderState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify, Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Concurrency and lifecycle coordination state
#[derive(Clone)]
pub(crate) struct ControlState {
    /// Permit pool bounding in-flight requests (capacity = `sender_max`)
    pub(crate) permits: Arc<Semaphore>,
    /// Current [`SenderState`] stored as its `u8` representation
    pub(crate) state: Arc<AtomicU8>,
    /// Cancelled by `stop()`; wakes the dispatch loop and interrupts retry delays
    pub(crate) stop_token: CancellationToken,
    /// Tracks every spawned request task so `stop()` can join them
    pub(crate) tracker: TaskTracker,
    /// Dispatch loop task handle (present while running)
    pub(crate) dispatch_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Serializes concurrent `stop()` callers
    pub(crate) stop_lock: Arc<Mutex<()>>,
    /// Producers currently between the state check and the enqueue
    pub(crate) pending_sends: Arc<AtomicUsize>,
    /// Notified when `pending_sends` drops to zero
    pub(crate) sends_idle: Arc<Notify>,
}

/// Main delivery engine instance (cloneable - all fields are Arc-wrapped)
///
/// Content handed to [`send`](Self::send) is buffered in a FIFO queue and POSTed
/// to the configured endpoint by at most `sender_max` concurrent requests.
/// Transient failures are requeued after `sleep_before_requeue` seconds;
/// [`stop`](Self::stop) flushes everything still buffered before returning.
#[derive(Clone)]
pub struct Sender {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Regular and stats header sets, built once at construction
    pub(crate) headers: Arc<Headers>,
    /// Payload compressor
    pub(crate) compressor: Compressor,
    /// Requeue policy
    pub(crate) policy: RetryPolicy,
    /// Delivery counters
    pub(crate) stats: Arc<Statistics>,
    /// Content waiting for dispatch
    pub(crate) queue: Arc<ContentQueue>,
    /// HTTP capability (trait object for pluggable implementations)
    pub(crate) transport: Arc<dyn HttpTransport>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Concurrency and lifecycle state
    pub(crate) control: ControlState,
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("url", &self.config.url.as_str())
            .field("sender_max", &self.config.sender_max)
            .field("transport", &self.transport.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Sender {
    /// Create a sender that delivers through a [`ReqwestTransport`]
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::from_config(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a sender that delivers through the given transport
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;

        let headers = build_headers(&config);
        let compressor = Compressor::from_config(&config);
        let policy = RetryPolicy::from_config(&config);
        let queue = ContentQueue::new(config.queue_max);

        // Buffer of 1000 events; slow subscribers receive RecvError::Lagged
        let (event_tx, _rx) = broadcast::channel(1000);

        let control = ControlState {
            permits: Arc::new(Semaphore::new(config.sender_max)),
            state: Arc::new(AtomicU8::new(SenderState::Idle as u8)),
            stop_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            dispatch_handle: Arc::new(Mutex::new(None)),
            stop_lock: Arc::new(Mutex::new(())),
            pending_sends: Arc::new(AtomicUsize::new(0)),
            sends_idle: Arc::new(Notify::new()),
        };

        tracing::debug!(
            url = %config.url,
            sender_max = config.sender_max,
            transport = transport.name(),
            compress = ?compressor.encoding(),
            retry_delay = ?policy.delay(),
            "Sender created"
        );

        Ok(Self {
            config: Arc::new(config),
            headers: Arc::new(headers),
            compressor,
            policy,
            stats: Arc::new(Statistics::new()),
            queue: Arc::new(queue),
            transport,
            event_tx,
            control,
        })
    }

    /// Queue content for delivery
    ///
    /// Allowed while idle (content buffers until [`start`](Self::start)) and
    /// while running. Waits for space when `queue_max` is set and the queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShuttingDown` once `stop()` has begun.
    pub async fn send(&self, content: Content) -> Result<()> {
        let _pending = PendingSend::enter(&self.control);

        if !self.accepting_new() {
            tracing::debug!(
                kind = %content.kind,
                bytes = content.len(),
                "Rejecting content, sender is shutting down"
            );
            return Err(Error::ShuttingDown);
        }

        self.queue.enqueue(content).await;
        Ok(())
    }

    /// Queue regular log content for delivery
    ///
    /// # Errors
    ///
    /// Returns `Error::ShuttingDown` once `stop()` has begun.
    pub async fn send_log(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.send(Content::log(payload)).await
    }

    /// Queue stats content for delivery on the stats channel
    ///
    /// # Errors
    ///
    /// Returns `Error::ShuttingDown` once `stop()` has begun.
    pub async fn send_stats(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.send(Content::stats(payload)).await
    }

    /// Current lifecycle state
    pub fn state(&self) -> SenderState {
        SenderState::from_u8(self.control.state.load(Ordering::SeqCst))
    }

    /// Snapshot of the delivery counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of items waiting in the queue
    pub async fn queue_len(&self) -> usize {
        self.queue.len().await
    }

    /// Get the configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Subscribe to delivery events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sumo_shipper::{Config, Sender};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let sender = Sender::new(Config::parse("https://collectors.example.com/receiver/v1/http/TOKEN")?)?;
    ///
    ///     let mut events = sender.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "delivery event");
    ///         }
    ///     });
    ///
    ///     sender.start().await?;
    ///     sender.send_log("hello").await?;
    ///     sender.stop().await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    fn accepting_new(&self) -> bool {
        matches!(self.state(), SenderState::Idle | SenderState::Running)
    }

    pub(crate) fn set_state(&self, state: SenderState) {
        self.control.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Marks a producer as between its state check and its enqueue
///
/// `stop()` only declares the queue empty once no producer is in that window,
/// so content accepted by `send` can never be stranded after shutdown.
struct PendingSend<'a> {
    control: &'a ControlState,
}

impl<'a> PendingSend<'a> {
    fn enter(control: &'a ControlState) -> Self {
        control.pending_sends.fetch_add(1, Ordering::SeqCst);
        Self { control }
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if self.control.pending_sends.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.control.sends_idle.notify_waiters();
        }
    }
}
