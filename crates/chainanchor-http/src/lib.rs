//! chainanchor-http — the production [`HttpTransport`](chainanchor_core::HttpTransport).

pub mod client;
pub mod retry;

pub use client::{HttpClientConfig, HttpTransportClient};
pub use retry::{RetryConfig, RetryPolicy};
