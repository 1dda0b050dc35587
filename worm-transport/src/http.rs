//! HTTP transports.
//!
//! Both transports POST the payload as a plain-text body to `http://<endpoint>`
//! and hand back the whole response body. The anonymized one does the same
//! through a SOCKS5 proxy, letting the proxy resolve host names so overlay
//! addresses never touch local DNS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use worm_core::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_SOCKS_PROXY, PAYLOAD_CONTENT_TYPE,
    TRANSPORT_ANONYMIZED, TRANSPORT_DIRECT,
};
use worm_core::error::{Result, WormError};
use worm_core::traits::Transport;
use worm_core::types::Endpoint;

/// Transport configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Overall timeout of one call, in seconds
    pub request_timeout_seconds: u64,
    /// Timeout of connection setup alone, in seconds
    pub connect_timeout_seconds: u64,
    /// SOCKS5 proxy of the anonymizing overlay (`host:port` or a `socks5h://` URL)
    pub socks_proxy: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            connect_timeout_seconds: 10,
            socks_proxy: DEFAULT_SOCKS_PROXY.into(),
        }
    }
}

impl TransportConfig {
    /// Sets the overlay proxy address.
    pub fn with_socks_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.socks_proxy = proxy.into();
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    /// Proxy URL handed to the HTTP client.
    ///
    /// Bare `host:port` becomes `socks5h://host:port` so names are resolved
    /// on the proxy side.
    pub fn socks_proxy_url(&self) -> String {
        let proxy = self.socks_proxy.trim();
        if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("socks5h://{}", proxy)
        }
    }
}

/// HTTP POST transport, direct or routed through a SOCKS proxy.
#[derive(Debug)]
pub struct HttpTransport {
    kind: &'static str,
    proxy: Option<String>,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Transport that connects straight to the endpoint.
    ///
    /// Ignores proxy environment variables, so "direct" always means direct.
    pub fn direct(config: &TransportConfig) -> Result<Self> {
        let builder = Self::client_builder(config).no_proxy();
        Self::build(TRANSPORT_DIRECT, None, config, builder)
    }

    /// Transport that routes every call through the overlay's SOCKS proxy.
    pub fn anonymized(config: &TransportConfig) -> Result<Self> {
        let proxy_url = config.socks_proxy_url();
        let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| {
            WormError::ConfigError(format!("invalid SOCKS proxy '{}': {}", proxy_url, e))
        })?;
        let builder = Self::client_builder(config).proxy(proxy);
        Self::build(TRANSPORT_ANONYMIZED, Some(proxy_url), config, builder)
    }

    fn client_builder(config: &TransportConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
    }

    fn build(
        kind: &'static str,
        proxy: Option<String>,
        config: &TransportConfig,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self> {
        let http_client = builder
            .build()
            .map_err(|e| WormError::ConfigError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            kind,
            proxy,
            timeout_seconds: config.request_timeout_seconds,
            http_client,
        })
    }

    /// Proxy this transport routes through, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Builds the request URL for an endpoint.
    ///
    /// Bare `host:port` endpoints are sent to `http://host:port/`; endpoints
    /// that already carry an `http` or `https` scheme are used as they are.
    pub fn target_url(endpoint: &Endpoint) -> Result<Url> {
        let raw = endpoint.as_str().trim();
        if raw.is_empty() {
            return Err(WormError::InvalidEndpoint {
                endpoint: raw.to_string(),
                reason: "endpoint is empty".into(),
            });
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let url = Url::parse(&candidate).map_err(|e| WormError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(WormError::InvalidEndpoint {
                endpoint: raw.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    fn map_error(&self, endpoint: &Endpoint, err: reqwest::Error) -> WormError {
        if err.is_timeout() {
            WormError::TransportTimeout {
                transport: self.kind.to_string(),
                endpoint: endpoint.to_string(),
                seconds: self.timeout_seconds,
            }
        } else {
            WormError::transport(self.kind, endpoint.as_str(), &err)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> &str {
        self.kind
    }

    #[instrument(skip(self, payload), fields(transport = self.kind))]
    async fn send(&self, endpoint: &Endpoint, payload: &str) -> Result<String> {
        let url = Self::target_url(endpoint)?;

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, PAYLOAD_CONTENT_TYPE)
            .body(payload.to_owned())
            .send()
            .await
            .map_err(|e| self.map_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, %status, "Endpoint answered with non-success status");
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(endpoint, e))?;

        debug!(%endpoint, %status, bytes = body.len(), "Received response");
        Ok(body)
    }
}
