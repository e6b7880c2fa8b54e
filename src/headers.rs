//! Request header construction
//!
//! Headers are built once from the [`Config`] into two immutable sets: one for
//! regular content and one for the stats channel. The fixed `X-Sumo-*` and
//! content headers always win over caller-supplied extra headers.

use crate::config::{Config, MetricsFormat};
use std::collections::BTreeMap;

/// Client identity header name
pub const CLIENT_HEADER: &str = "X-Sumo-Client";
/// Source name header name
pub const NAME_HEADER: &str = "X-Sumo-Name";
/// Source host header name
pub const HOST_HEADER: &str = "X-Sumo-Host";
/// Source category header name
pub const CATEGORY_HEADER: &str = "X-Sumo-Category";
/// Content type header name
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
/// Content encoding header name
pub const CONTENT_ENCODING_HEADER: &str = "Content-Encoding";

/// Product identity sent as the client header and the default source name
pub const CLIENT_NAME: &str = "sumo-shipper";
/// Default source category
pub const DEFAULT_CATEGORY: &str = "Shipper";
/// Suffix appended to the source category for the default stats category
pub const STATS_CATEGORY_SUFFIX: &str = ".stats";

/// Plain-text log lines
pub const CONTENT_TYPE_LOG: &str = "text/plain";
/// Carbon 2.0 metrics
pub const CONTENT_TYPE_CARBON2: &str = "application/vnd.sumologic.carbon2";
/// Graphite metrics
pub const CONTENT_TYPE_GRAPHITE: &str = "application/vnd.sumologic.graphite";

const FIXED_HEADERS: [&str; 6] = [
    CLIENT_HEADER,
    NAME_HEADER,
    HOST_HEADER,
    CATEGORY_HEADER,
    CONTENT_TYPE_HEADER,
    CONTENT_ENCODING_HEADER,
];

/// Immutable mapping of header name to value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Look up a header value, ignoring ASCII case in the name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether a header is present, ignoring ASCII case in the name
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_string(), value.into());
    }
}

/// The two header sets used by the delivery engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Headers {
    /// Headers for regular log/metric content
    pub regular: HeaderSet,
    /// Headers for stats-channel content
    pub stats: HeaderSet,
}

/// Build both header sets from the configuration
///
/// Deterministic apart from the default host, which is the local hostname.
pub fn build_headers(config: &Config) -> Headers {
    let category = config
        .source_category
        .clone()
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let stats_category = config
        .stats_category
        .clone()
        .unwrap_or_else(|| format!("{category}{STATS_CATEGORY_SUFFIX}"));

    let regular = build_set(config, &category, content_type(config));
    let stats = build_set(config, &stats_category, CONTENT_TYPE_CARBON2);

    Headers { regular, stats }
}

fn build_set(config: &Config, category: &str, content_type: &str) -> HeaderSet {
    let mut set = HeaderSet::default();

    for (name, value) in &config.extra_headers {
        if is_fixed_header(name) {
            tracing::debug!(header = %name, "ignoring extra header that collides with a fixed header");
            continue;
        }
        if set.contains(name) {
            tracing::debug!(header = %name, "ignoring extra header that duplicates another extra header");
            continue;
        }
        set.insert(name, value.clone());
    }

    set.insert(CLIENT_HEADER, CLIENT_NAME);
    set.insert(
        NAME_HEADER,
        config
            .source_name
            .clone()
            .unwrap_or_else(|| CLIENT_NAME.to_string()),
    );
    set.insert(
        HOST_HEADER,
        config.source_host.clone().unwrap_or_else(local_hostname),
    );
    set.insert(CATEGORY_HEADER, category);
    set.insert(CONTENT_TYPE_HEADER, content_type);

    if config.compress {
        set.insert(CONTENT_ENCODING_HEADER, config.compress_encoding.as_str());
    }

    set
}

fn content_type(config: &Config) -> &'static str {
    if !config.fields_as_metrics {
        return CONTENT_TYPE_LOG;
    }
    match config.metrics_format {
        MetricsFormat::Carbon2 => CONTENT_TYPE_CARBON2,
        MetricsFormat::Graphite => CONTENT_TYPE_GRAPHITE,
    }
}

fn is_fixed_header(name: &str) -> bool {
    FIXED_HEADERS.iter().any(|fixed| fixed.eq_ignore_ascii_case(name))
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
