//! Configuration types for sumo-shipper

use crate::error::{Error, Result};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};
use url::Url;

/// Main configuration for [`Sender`](crate::Sender)
///
/// All fields except `url` have sensible defaults, so a configuration can be
/// deserialized from a document that only names the endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// HTTP collection endpoint content is POSTed to (required)
    pub url: Url,

    /// Maximum concurrent in-flight requests (default: 1, must be at least 1)
    #[serde(default = "default_sender_max")]
    pub sender_max: usize,

    /// Seconds to wait before requeueing failed content (default: 30)
    ///
    /// A negative value disables retry entirely: failed content is dropped.
    #[serde(default = "default_sleep_before_requeue")]
    pub sleep_before_requeue: i64,

    /// Deliver stats content through the stats header set (default: false)
    #[serde(default)]
    pub stats_enabled: bool,

    /// Category for stats content (default: `<source category>.stats`)
    #[serde(default)]
    pub stats_category: Option<String>,

    /// Overrides the `X-Sumo-Category` header
    #[serde(default)]
    pub source_category: Option<String>,

    /// Overrides the `X-Sumo-Name` header
    #[serde(default)]
    pub source_name: Option<String>,

    /// Overrides the `X-Sumo-Host` header (default: local hostname)
    #[serde(default)]
    pub source_host: Option<String>,

    /// Additional headers; never override the fixed `X-Sumo-*`/content headers
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// Content is metrics rather than plain-text log lines (default: false)
    #[serde(default)]
    pub fields_as_metrics: bool,

    /// Metrics wire format when `fields_as_metrics` is set
    #[serde(default)]
    pub metrics_format: MetricsFormat,

    /// Compress request bodies (default: false)
    #[serde(default)]
    pub compress: bool,

    /// Compression algorithm when `compress` is set
    #[serde(default)]
    pub compress_encoding: CompressEncoding,

    /// Maximum number of queued items before producers block (None = unbounded)
    #[serde(default)]
    pub queue_max: Option<usize>,

    /// Timeout applied to every HTTP request (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Config {
    /// Create a configuration for the given endpoint with every other option defaulted
    pub fn new(url: Url) -> Self {
        Self {
            url,
            sender_max: default_sender_max(),
            sleep_before_requeue: default_sleep_before_requeue(),
            stats_enabled: false,
            stats_category: None,
            source_category: None,
            source_name: None,
            source_host: None,
            extra_headers: BTreeMap::new(),
            fields_as_metrics: false,
            metrics_format: MetricsFormat::default(),
            compress: false,
            compress_encoding: CompressEncoding::default(),
            queue_max: None,
            request_timeout: default_request_timeout(),
        }
    }

    /// Parse the endpoint and build a default configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `url` is not a valid URL.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::config("url", format!("invalid url: {e}")))?;
        Ok(Self::new(url))
    }

    /// Check the configuration for values the engine cannot run with
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(Error::config(
                "url",
                format!("unsupported scheme '{}', expected http or https", self.url.scheme()),
            ));
        }
        if self.sender_max == 0 {
            return Err(Error::config("sender_max", "must be at least 1"));
        }
        if self.queue_max == Some(0) {
            return Err(Error::config("queue_max", "must be at least 1 when set"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("request_timeout", "must be greater than zero"));
        }
        for (key, value) in [
            ("source_category", &self.source_category),
            ("source_name", &self.source_name),
            ("source_host", &self.source_host),
            ("stats_category", &self.stats_category),
        ] {
            if let Some(value) = value.as_deref() {
                if value.trim().is_empty() {
                    return Err(Error::config(key, "must not be empty when set"));
                }
                check_header_value(key, value)?;
            }
        }
        for (name, value) in &self.extra_headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::config("extra_headers", format!("invalid header name '{name}': {e}"))
            })?;
            check_header_value("extra_headers", value)?;
        }
        Ok(())
    }

    /// Delay before requeueing failed content, or `None` when retry is disabled
    pub fn requeue_delay(&self) -> Option<Duration> {
        u64::try_from(self.sleep_before_requeue)
            .ok()
            .map(Duration::from_secs)
    }
}

/// Metrics wire format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsFormat {
    /// Carbon 2.0 metrics (default)
    #[default]
    Carbon2,
    /// Graphite plaintext metrics
    Graphite,
}

/// Request body compression algorithm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressEncoding {
    /// zlib-wrapped deflate (default)
    #[default]
    Deflate,
    /// gzip
    Gzip,
}

impl CompressEncoding {
    /// Value sent in the `Content-Encoding` header
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressEncoding::Deflate => "deflate",
            CompressEncoding::Gzip => "gzip",
        }
    }
}

// Values are sent verbatim as HTTP headers, so they must be valid on the wire
fn check_header_value(key: &str, value: &str) -> Result<()> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|e| Error::config(key, format!("invalid header value: {e}")))
}

fn default_sender_max() -> usize {
    1
}

fn default_sleep_before_requeue() -> i64 {
    30
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
