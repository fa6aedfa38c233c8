//! Chain → explorer registry with ordered fallback.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::chain::SupportedChain;
use crate::error::{AttemptFailure, ExplorerError, ResolveError};
use crate::explorer::{ExplorerBackend, ParseContext};
use crate::record::TransactionData;
use crate::transport::HttpTransport;

/// Maps each chain to its explorers, most preferred first.
///
/// Explorers are tried one at a time. The first one that produces a record
/// wins; every failure (transport, malformed response, too few
/// confirmations) moves on to the next. Callers only ever see
/// [`ResolveError::UnableToGetRemoteHash`] once the list is exhausted.
///
/// The registry holds no mutable state after construction, so one
/// `Arc<ExplorerRegistry>` can serve concurrent resolutions.
pub struct ExplorerRegistry {
    transport: Arc<dyn HttpTransport>,
    backends: HashMap<SupportedChain, Vec<ExplorerBackend>>,
}

impl ExplorerRegistry {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            backends: HashMap::new(),
        }
    }

    /// Register `backend` for each of `chains`.
    ///
    /// Order is descending priority; equal priorities keep registration order.
    pub fn register(&mut self, chains: &[SupportedChain], backend: ExplorerBackend) {
        for chain in chains {
            let list = self.backends.entry(*chain).or_default();
            list.push(backend.clone());
            // stable sort: ties stay in registration order
            list.sort_by_key(|b| Reverse(b.priority));
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, chains: &[SupportedChain], backend: ExplorerBackend) -> Self {
        self.register(chains, backend);
        self
    }

    /// Explorers for `chain` in the order they will be tried.
    pub fn backends_for(&self, chain: SupportedChain) -> &[ExplorerBackend] {
        self.backends.get(&chain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Chains with at least one explorer, sorted.
    pub fn chains(&self) -> Vec<SupportedChain> {
        let mut chains: Vec<_> = self.backends.keys().copied().collect();
        chains.sort();
        chains
    }

    /// Look up `transaction_id` on `chain` through each explorer in turn.
    pub async fn resolve(
        &self,
        chain: SupportedChain,
        transaction_id: &str,
    ) -> Result<TransactionData, ResolveError> {
        let backends = self.backends_for(chain);
        if backends.is_empty() {
            tracing::error!(%chain, "no explorer registered");
            return Err(ResolveError::NoExplorers(chain));
        }

        let mut failures = Vec::with_capacity(backends.len());
        for backend in backends {
            match self.attempt(backend, chain, transaction_id).await {
                Ok(record) => {
                    tracing::debug!(
                        %chain,
                        service = %backend.service_name,
                        tx = transaction_id,
                        remote_hash = %record.remote_hash,
                        "transaction resolved"
                    );
                    return Ok(record);
                }
                Err(error) => {
                    tracing::warn!(
                        %chain,
                        service = %backend.service_name,
                        tx = transaction_id,
                        kind = error.kind(),
                        error = %error,
                        "explorer could not resolve transaction"
                    );
                    failures.push(AttemptFailure {
                        service: backend.service_name,
                        error,
                    });
                }
            }
        }

        tracing::error!(
            %chain,
            tx = transaction_id,
            attempts = failures.len(),
            "all explorers failed"
        );
        Err(ResolveError::UnableToGetRemoteHash { chain, failures })
    }

    async fn attempt(
        &self,
        backend: &ExplorerBackend,
        chain: SupportedChain,
        transaction_id: &str,
    ) -> Result<TransactionData, ExplorerError> {
        let url = backend.transaction_url(chain, transaction_id)?;
        let body = self.transport.get(&url).await?;
        let response: Value = serde_json::from_str(&body)?;
        backend
            .api
            .parse(ParseContext {
                response: &response,
                chain,
            })
            .await
    }
}
