//! HTTP GET transport backed by `reqwest`.
//!
//! Features:
//! - Per-request timeout
//! - Retry with exponential backoff for transient errors (connection
//!   failures, timeouts, 429 and 5xx)

use async_trait::async_trait;
use std::time::Duration;

use chainanchor_core::config::ResolverConfig;
use chainanchor_core::error::TransportError;
use chainanchor_core::transport::HttpTransport;

use crate::retry::{RetryConfig, RetryPolicy};

/// Configuration for [`HttpTransportClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("chainanchor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&ResolverConfig> for HttpClientConfig {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            retry: RetryConfig::with_max_retries(config.max_retries),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            ..Self::default()
        }
    }
}

/// GETs explorer URLs, retrying transient failures.
pub struct HttpTransportClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl HttpTransportClient {
    /// # Errors
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    pub fn from_resolver_config(config: &ResolverConfig) -> Result<Self, TransportError> {
        Self::new(HttpClientConfig::from(config))
    }

    async fn get_once(&self, url: &str) -> Result<String, TransportError> {
        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    ms: self.request_timeout.as_millis() as u64,
                }
            } else {
                TransportError::Http(e.to_string())
            }
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl HttpTransport for HttpTransportClient {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let mut attempt = 0u32;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match self.retry.delay_for(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                url,
                                "retrying request"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::error!(attempt, error = %e, url, "max retries exceeded");
                            return Err(e);
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_resolver_settings() {
        let resolver = ResolverConfig {
            max_retries: 0,
            request_timeout_ms: 1_500,
            ..ResolverConfig::default()
        };
        let config = HttpClientConfig::from(&resolver);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.request_timeout, Duration::from_millis(1_500));
        assert!(config.user_agent.starts_with("chainanchor/"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = HttpTransportClient::new(HttpClientConfig {
            retry: RetryConfig::with_max_retries(0),
            request_timeout: Duration::from_millis(500),
            ..HttpClientConfig::default()
        })
        .unwrap();
        // Port 9 (discard) on localhost is closed in CI containers.
        let err = client.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Http(_) | TransportError::Timeout { .. }
        ));
    }
}
