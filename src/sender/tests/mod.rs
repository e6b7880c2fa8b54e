//! Sender tests split by concern, sharing a scripted in-memory transport.

use super::*;
use crate::headers::{CATEGORY_HEADER, HeaderSet};
use crate::types::{ContentKind, DropReason};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

mod delivery;

/// Scripted response for one transport call
#[derive(Clone, Copy, Debug)]
pub(crate) enum Step {
    /// Respond with this HTTP status
    Status(u16),
    /// Fail without a response
    Fail,
}

/// One recorded POST
#[derive(Clone, Debug)]
pub(crate) struct Call {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: HeaderSet,
}

impl Call {
    pub(crate) fn category(&self) -> &str {
        self.headers.get(CATEGORY_HEADER).unwrap()
    }
}

/// In-memory transport that replays a script of responses
///
/// POSTs consume `script` front to back and fall back to `fallback` once it is
/// exhausted. Every POST sleeps for `latency` while counted as in flight.
pub(crate) struct MockTransport {
    script: std::sync::Mutex<VecDeque<Step>>,
    fallback: Step,
    health: Step,
    latency: Duration,
    calls: std::sync::Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(fallback: Step) -> Self {
        Self {
            script: std::sync::Mutex::new(VecDeque::new()),
            fallback,
            health: Step::Status(200),
            latency: Duration::ZERO,
            calls: std::sync::Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn accepting() -> Self {
        Self::new(Step::Status(200))
    }

    pub(crate) fn with_script(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script = std::sync::Mutex::new(steps.into_iter().collect());
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn with_health(mut self, health: Step) -> Self {
        self.health = health;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn respond(step: Step) -> Result<u16> {
        match step {
            Step::Status(status) => Ok(status),
            Step::Fail => Err(Error::Transport("connection reset by peer".into())),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(&self, _url: &Url, headers: &HeaderSet, body: Vec<u8>) -> Result<u16> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(Call {
            body,
            headers: headers.clone(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Self::respond(step)
    }

    async fn get(&self, _url: &Url) -> Result<u16> {
        Self::respond(self.health)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub(crate) fn test_config() -> Config {
    let mut config = Config::parse("http://collector.test/receiver/v1/http/TOKEN").unwrap();
    config.sleep_before_requeue = 0;
    config
}

pub(crate) fn create_test_sender(config: Config, transport: &Arc<MockTransport>) -> Sender {
    let transport: Arc<dyn HttpTransport> = transport.clone();
    Sender::with_transport(config, transport).unwrap()
}

/// Receive events until one matches, failing after five seconds
pub(crate) async fn wait_for_event(
    events: &mut broadcast::Receiver<Event>,
    matches: impl Fn(&Event) -> bool,
) -> Event {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Drain every event already buffered in the receiver
pub(crate) fn collect_events(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}
