//! Outbound submission to the gateway endpoint

use crate::core::error::{GatewayError, GatewayResult};
use crate::wire::FORM_CONTENT_TYPE;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Default endpoint of the direct-post API
pub const DEFAULT_API_URL: &str = "https://secure.nmi.com/api/transact.php";

/// Default bound on a single gateway round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one encoded form to the gateway and returns the raw answer text
///
/// Implementations perform exactly one attempt. Connection, timeout and read
/// failures map to `network_error`.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn post(&self, body: String) -> GatewayResult<String>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// Transport posting to `url`, with `timeout` bounding each request
    pub fn new(url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| GatewayError::system(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn post(&self, body: String) -> GatewayResult<String> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::network("network error: gateway request timed out")
                } else {
                    GatewayError::network(format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // The body is still handed to the parser, which classifies it
            tracing::warn!(status = %status, "gateway answered with non-success HTTP status");
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("failed to read response: {}", e)))
    }
}
