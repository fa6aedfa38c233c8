//! The `HttpTransport` trait — the boundary to the network.

use async_trait::async_trait;

use crate::error::TransportError;

/// Fetches a URL and returns the raw response body.
///
/// Retries, timeouts and rate limiting are the implementation's business;
/// the resolution layer calls `get` at most once per URL it needs.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn HttpTransport>`.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}
