//! reqwest-backed transport.
//!
//! One shared client per transport: rustls, transparent gzip/brotli/deflate,
//! at most five redirects and a whole-request timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};
use url::Url;

use super::{Transport, TransportError, TransportResponse};

/// Client settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    /// Covers connect, redirects and body read.
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { user_agent: "feedstash/0.1".to_string(), timeout: Duration::from_millis(20_000), max_redirects: 5 }
    }
}

impl From<&feedstash_core::AppConfig> for TransportConfig {
    fn from(config: &feedstash_core::AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// HTTP transport over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| TransportError::Client(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "transport exchange completed"
        );

        Ok(TransportResponse { status, body })
    }
}
