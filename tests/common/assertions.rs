//! Custom test assertions for integration tests

use std::time::Duration;
use sumo_shipper::{Config, Event, Sender};
use tokio::sync::broadcast;
use wiremock::MockServer;

/// Result of waiting for an event
#[derive(Debug)]
pub enum WaitResult {
    /// Matching event received
    Matched(Event),
    /// Timeout waiting for the event
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait until an event matching `predicate` arrives
///
/// # Arguments
/// * `events` - Receiver obtained from `Sender::subscribe`
/// * `timeout` - Maximum time to wait
/// * `predicate` - Returns true for the awaited event
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    predicate: impl Fn(&Event) -> bool,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return WaitResult::Matched(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Configuration pointing at the mock server's receiver path with retries immediate
pub fn mock_config(server: &MockServer) -> Config {
    let mut config = Config::parse(&format!("{}/receiver/v1/http/TOKEN", server.uri()))
        .expect("mock server uri is a valid url");
    config.sleep_before_requeue = 0;
    config.source_host = Some("test-host".to_string());
    config
}

/// Build a sender for the mock server
pub fn mock_sender(config: Config) -> Sender {
    Sender::new(config).expect("valid configuration")
}

/// Header value of a request received by the mock server
pub fn header_value<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
