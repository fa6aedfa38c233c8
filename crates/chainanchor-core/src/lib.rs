//! chainanchor-core — explorer contract, normalizers and fallback registry.
//!
//! # Overview
//!
//! ChainAnchor looks up the transaction that anchors a certificate on a
//! blockchain and reduces whatever the explorer returned to one canonical
//! [`TransactionData`] record. The core crate defines:
//!
//! - [`HttpTransport`] — the network boundary (one async `get`)
//! - [`ExplorerApi`] / [`ExplorerBackend`] — what every explorer provides
//! - [`ExplorerRegistry`] — per-chain ordered fallback across explorers
//! - [`normalize`] — anchor hash, timestamp and quantity normalizers
//! - [`confirmations`] — the minimum-confirmation gate
//! - [`ResolverConfig`] — settings shared by all explorers

pub mod chain;
pub mod config;
pub mod confirmations;
pub mod error;
pub mod explorer;
pub mod normalize;
pub mod record;
pub mod registry;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use chain::{ChainFamily, SupportedChain, UnknownChain};
pub use config::{ConfigError, ResolverConfig};
pub use error::{AttemptFailure, ExplorerError, ResolveError, TransportError};
pub use explorer::{
    ExplorerApi, ExplorerBackend, ParseContext, TransactionApi, TRANSACTION_ID_PLACEHOLDER,
};
pub use record::TransactionData;
pub use registry::ExplorerRegistry;
pub use transport::HttpTransport;
