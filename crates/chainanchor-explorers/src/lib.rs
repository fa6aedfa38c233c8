//! chainanchor-explorers — explorer backends and the default registry.
//!
//! Each module knows one service's URL layout, the chains it serves, its
//! priority, and how to reduce its response to a
//! [`TransactionData`](chainanchor_core::TransactionData).
//!
//! # Quick start
//! ```rust,no_run
//! use chainanchor_core::{ResolverConfig, SupportedChain};
//! use chainanchor_http::HttpTransportClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::from_env()?;
//! let transport = Arc::new(HttpTransportClient::from_resolver_config(&config)?);
//! let registry = chainanchor_explorers::default_registry(transport, &config);
//! let record = registry.resolve(SupportedChain::Ethsepolia, "0x…").await?;
//! println!("{}", record.remote_hash);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chainanchor_core::config::ResolverConfig;
use chainanchor_core::registry::ExplorerRegistry;
use chainanchor_core::transport::HttpTransport;

pub mod abi;
pub mod blockcypher;
pub mod blockscout;
pub mod blockstream;
pub mod etherscan;

/// Registry with every built-in backend registered for the chains it serves.
///
/// `mocknet` and `regtest` get no backends.
pub fn default_registry(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> ExplorerRegistry {
    ExplorerRegistry::new(transport.clone())
        .with(&etherscan::CHAINS, etherscan::backend(transport.clone(), config))
        .with(&blockscout::CHAINS, blockscout::backend(transport.clone(), config))
        .with(&blockstream::CHAINS, blockstream::backend(transport, config))
        .with(&blockcypher::CHAINS, blockcypher::backend(config))
}
