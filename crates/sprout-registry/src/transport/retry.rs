//! Exponential backoff for transient request failures

use std::future::Future;
use std::time::Duration;

use sprout_core::error::SproutError;
use tracing::debug;

use crate::RegistryResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Policy that tries exactly once
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Run `operation`, retrying recoverable errors with backoff
    pub(crate) async fn run<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.max_retries || !error.is_recoverable() {
                        return Err(error);
                    }
                    attempt += 1;
                    debug!("Attempt {} failed ({}), retrying in {:?}", attempt, error, delay);

                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis((delay.as_millis() as f64 * self.multiplier) as u64),
                        self.max_delay,
                    );
                },
            }
        }
    }
}

/// Error for a request that ran past the configured timeout
pub(crate) fn timed_out(url: &str, timeout: Duration) -> SproutError {
    SproutError::Network {
        message: format!("Request to {} timed out after {:?}", url, timeout),
        source: None,
    }
}
