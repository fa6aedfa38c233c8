//! Blockscout `gettxinfo` backend, serving bloxberg.
//!
//! Transactions sent to an anchoring contract carry ABI-encoded calldata,
//! so when `to` is set the contract ABI is fetched and the anchored root
//! pulled out of the decoded arguments. The raw input is used otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use chainanchor_core::chain::{ChainFamily, SupportedChain};
use chainanchor_core::config::ResolverConfig;
use chainanchor_core::confirmations::check_confirmations_field;
use chainanchor_core::error::ExplorerError;
use chainanchor_core::explorer::{
    field, required_str, result_object, str_field, ExplorerApi, ExplorerBackend, ParseContext,
    TransactionApi, TRANSACTION_ID_PLACEHOLDER,
};
use chainanchor_core::normalize::{strip_hash_prefix, to_time};
use chainanchor_core::record::TransactionData;
use chainanchor_core::transport::HttpTransport;

use crate::abi::AbiDecoder;

pub const BLOXBERG_API_URL: &str = "https://blockexplorer.bloxberg.org/api";

/// Last resort.
pub const PRIORITY: i32 = -1;

pub const CHAINS: [SupportedChain; 1] = [SupportedChain::Bloxberg];

pub struct BlockscoutApi {
    api_url: String,
    decoder: AbiDecoder,
    minimum_confirmations: u64,
}

impl BlockscoutApi {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> Self {
        Self::with_api_url(transport, config, BLOXBERG_API_URL)
    }

    pub fn with_api_url(
        transport: Arc<dyn HttpTransport>,
        config: &ResolverConfig,
        api_url: impl Into<String>,
    ) -> Self {
        let api_url = api_url.into();
        Self {
            decoder: AbiDecoder::new(transport, api_url.clone()),
            api_url,
            minimum_confirmations: config.minimum_confirmations,
        }
    }
}

#[async_trait]
impl ExplorerApi for BlockscoutApi {
    fn service_url(&self, chain: SupportedChain) -> Result<String, ExplorerError> {
        if !CHAINS.contains(&chain) {
            return Err(ExplorerError::UnsupportedChain {
                service: TransactionApi::Blockscout,
                chain,
            });
        }
        Ok(format!(
            "{}?module=transaction&action=gettxinfo&txhash={TRANSACTION_ID_PLACEHOLDER}",
            self.api_url
        ))
    }

    async fn parse(&self, ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError> {
        let tx = result_object(ctx.response)?;
        let issuing_address = required_str(tx, &["from"])?;
        let input = required_str(tx, &["input", "data"])?;

        let decoded = match str_field(tx, &["to"]) {
            Some(contract) => self.decoder.decode(contract, input).await,
            None => None,
        };
        let payload = decoded.as_deref().unwrap_or(input);

        let remote_hash = strip_hash_prefix(payload, ChainFamily::Ethereum.prefixes())?;
        let time = to_time(field(tx, &["timeStamp", "timestamp"]));
        check_confirmations_field(tx.get("confirmations"), self.minimum_confirmations)?;

        Ok(TransactionData {
            remote_hash,
            issuing_address: issuing_address.to_string(),
            time,
            revoked_addresses: vec![],
        })
    }
}

pub fn backend(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> ExplorerBackend {
    ExplorerBackend::new(
        TransactionApi::Blockscout,
        PRIORITY,
        Arc::new(BlockscoutApi::new(transport, config)),
    )
}
