//! Transport layer for the release protocol
//!
//! A transport performs a single GET and hands back the raw body. Failures of
//! any kind (unreachable host, non-2xx status, TLS, timeout) fold into an
//! empty body; callers decide what an empty answer means.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

mod http;
mod memory;
mod retry;
mod stream;

pub use http::HttpTransport;
pub use memory::MemoryTransport;
pub use retry::RetryConfig;
pub use stream::StreamTransport;

/// Performs release protocol requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the response body, or an empty body on failure
    async fn fetch(&self, url: &str) -> Vec<u8>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn fetch(&self, url: &str) -> Vec<u8> {
        (**self).fetch(url).await
    }
}

/// Which transport implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportBackend {
    /// Full HTTP client, falling back to the stream reader if it is unavailable
    #[default]
    Auto,
    /// Full HTTP client only
    Http,
    /// Plain HTTP/1.0 stream reader only
    Stream,
}

/// Caller identity and request policy shared by all transports
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Name identifying the installing site, sent as `server_name`
    pub server_name: String,
    /// Upper bound for one request, including reading the body
    pub timeout: Duration,
    /// Verify TLS certificates of mirrors
    pub verify_tls: bool,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            timeout: Duration::from_secs(30),
            // The existing fleet is reached with certificate checks off.
            verify_tls: false,
            retry: RetryConfig::default(),
            user_agent: format!("sprout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport picked at startup according to [`TransportBackend`]
#[derive(Debug, Clone)]
pub enum AutoTransport {
    /// reqwest based client
    Http(HttpTransport),
    /// HTTP/1.0 stream reader
    Stream(StreamTransport),
}

impl AutoTransport {
    /// Build the transport for a backend choice
    pub fn connect(backend: TransportBackend, config: TransportConfig) -> crate::RegistryResult<Self> {
        match backend {
            TransportBackend::Http => Ok(Self::Http(HttpTransport::new(config)?)),
            TransportBackend::Stream => Ok(Self::Stream(StreamTransport::new(config))),
            TransportBackend::Auto => match HttpTransport::new(config.clone()) {
                Ok(transport) => Ok(Self::Http(transport)),
                Err(e) => {
                    warn!("HTTP client unavailable ({}), using stream transport", e);
                    Ok(Self::Stream(StreamTransport::new(config)))
                },
            },
        }
    }

    /// Name of the active implementation
    pub fn kind(&self) -> &'static str {
        match self {
            AutoTransport::Http(_) => "http",
            AutoTransport::Stream(_) => "stream",
        }
    }
}

#[async_trait]
impl Transport for AutoTransport {
    async fn fetch(&self, url: &str) -> Vec<u8> {
        match self {
            AutoTransport::Http(transport) => transport.fetch(url).await,
            AutoTransport::Stream(transport) => transport.fetch(url).await,
        }
    }
}

#[cfg(test)]
mod tests;
