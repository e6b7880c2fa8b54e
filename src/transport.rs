//! HTTP transport abstraction
//!
//! The delivery engine only needs two operations from its HTTP client: POST a
//! body with headers and GET the endpoint for a health probe. Both return the
//! response status; any failure to obtain a response is an error.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::headers::HeaderSet;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Async HTTP capability used by [`Sender`](crate::Sender)
///
/// Implementations must be safe to call from up to `sender_max` tasks at once.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` to `url` with `headers`, returning the response status
    ///
    /// # Errors
    ///
    /// Returns an error when no response was received.
    async fn post(&self, url: &Url, headers: &HeaderSet, body: Vec<u8>) -> Result<u16>;

    /// GET `url`, returning the response status
    ///
    /// # Errors
    ///
    /// Returns an error when no response was received.
    async fn get(&self, url: &Url) -> Result<u16>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Production transport backed by a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sumo-shipper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config("request_timeout", format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create a transport from `request_timeout`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.request_timeout)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &Url, headers: &HeaderSet, body: Vec<u8>) -> Result<u16> {
        let mut request = self.client.post(url.clone()).body(body);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        Ok(response.status().as_u16())
    }

    async fn get(&self, url: &Url) -> Result<u16> {
        let response = self.client.get(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
