//! reqwest based transport with connection pooling and retry logic

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use sprout_core::error::SproutError;
use tracing::debug;

use super::{retry::timed_out, Transport, TransportConfig};
use crate::api::with_transport_params;
use crate::RegistryResult;

/// Full-featured HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Identity and request policy
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport with its own pooled client
    pub fn new(config: TransportConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SproutError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, config })
    }

    /// Transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// GET a fully signed URL once
    async fn get_once(&self, url: &str) -> RegistryResult<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                timed_out(url, self.config.timeout)
            } else {
                SproutError::network(format!("Failed to reach {}", url), e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SproutError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SproutError::network(format!("Failed to read body of {}", url), e))?;

        Ok(bytes.to_vec())
    }

    /// GET `url` with transport parameters appended, surfacing the failure
    pub async fn try_fetch(&self, url: &str) -> RegistryResult<Vec<u8>> {
        let signed = with_transport_params(url, &self.config.server_name);
        debug!("GET {}", signed);
        let signed = signed.as_str();

        self.config.retry.run(move || self.get_once(signed)).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Vec<u8> {
        self.try_fetch(url).await.unwrap_or_else(|e| {
            debug!("Fetch failed: {}", e);
            Vec::new()
        })
    }
}
