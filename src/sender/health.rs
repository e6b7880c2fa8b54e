//! Endpoint health probe.

use super::Sender;

impl Sender {
    /// Probe the collection endpoint
    ///
    /// Issues a GET to the configured URL. Returns `true` only for HTTP 200;
    /// any other status or transport error is logged and yields `false`.
    /// Never returns an error.
    pub async fn connect(&self) -> bool {
        match self.transport.get(&self.config.url).await {
            Ok(200) => {
                tracing::info!(url = %self.config.url, "Endpoint health check passed");
                true
            }
            Ok(status) => {
                tracing::warn!(
                    url = %self.config.url,
                    status,
                    "Endpoint health check returned non-200 status"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    url = %self.config.url,
                    error_class = e.class(),
                    error = %e,
                    "Endpoint health check failed"
                );
                false
            }
        }
    }
}
