//! Minimal HTTP/1.0 stream reader
//!
//! Used when the full HTTP client cannot be constructed. It speaks plain
//! `http://` only: one request per connection, body read until the server
//! closes the socket.

use async_trait::async_trait;
use sprout_core::error::SproutError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use super::{retry::timed_out, Transport, TransportConfig};
use crate::api::with_transport_params;
use crate::RegistryResult;

/// Stream based fallback transport
#[derive(Debug, Clone)]
pub struct StreamTransport {
    config: TransportConfig,
}

impl StreamTransport {
    /// Create a stream transport
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn get_once(&self, url: &str, target: &RequestTarget) -> RegistryResult<Vec<u8>> {
        let exchange = async {
            let mut socket = TcpStream::connect((target.host.as_str(), target.port))
                .await
                .map_err(|e| SproutError::network(format!("Failed to connect to {}", target.host_header), e))?;

            let request = format!(
                "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: {}\r\nConnection: close\r\n\r\n",
                target.path, target.host_header, self.config.user_agent
            );
            socket.write_all(request.as_bytes()).await.map_err(|e| {
                SproutError::network(format!("Failed to send request to {}", target.host_header), e)
            })?;

            let mut raw = Vec::new();
            socket.read_to_end(&mut raw).await.map_err(|e| {
                SproutError::network(format!("Failed to read response from {}", target.host_header), e)
            })?;
            Ok::<_, SproutError>(raw)
        };

        let raw = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| timed_out(url, self.config.timeout))??;

        parse_response(url, &raw)
    }

    /// GET `url` with transport parameters appended, surfacing the failure
    pub async fn try_fetch(&self, url: &str) -> RegistryResult<Vec<u8>> {
        let signed = with_transport_params(url, &self.config.server_name);
        debug!("GET {} (stream)", signed);
        let target = RequestTarget::parse(&signed)?;
        let signed = signed.as_str();
        let target = &target;

        self.config.retry.run(move || self.get_once(signed, target)).await
    }
}

/// Where a plain HTTP request goes
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTarget {
    host: String,
    port: u16,
    host_header: String,
    path: String,
}

impl RequestTarget {
    fn parse(url: &str) -> RegistryResult<Self> {
        let unreachable = |message: String| SproutError::Network {
            message,
            source: None,
        };

        let parsed = Url::parse(url).map_err(|e| unreachable(format!("Invalid URL {}: {}", url, e)))?;
        if parsed.scheme() != "http" {
            return Err(unreachable(format!(
                "Stream transport cannot reach {} (plain http only)",
                url
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| unreachable(format!("URL without host: {}", url)))?
            .to_string();
        let host_header = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        Ok(Self {
            port: parsed.port_or_known_default().unwrap_or(80),
            host,
            host_header,
            path,
        })
    }
}

/// Split a raw HTTP/1.x response into status and body
fn parse_response(url: &str, raw: &[u8]) -> RegistryResult<Vec<u8>> {
    let malformed = || SproutError::Network {
        message: format!("Malformed HTTP response from {}", url),
        source: None,
    };

    let header_end = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or_else(malformed)?;

    let head = String::from_utf8_lossy(&raw[..header_end]);
    let status: u16 = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .ok_or_else(malformed)?;

    if !(200..300).contains(&status) {
        return Err(SproutError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    Ok(raw[header_end + 4..].to_vec())
}

#[async_trait]
impl Transport for StreamTransport {
    async fn fetch(&self, url: &str) -> Vec<u8> {
        self.try_fetch(url).await.unwrap_or_else(|e| {
            debug!("Fetch failed: {}", e);
            Vec::new()
        })
    }
}
