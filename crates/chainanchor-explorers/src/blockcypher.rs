//! BlockCypher backend for Bitcoin mainnet and testnet.
//!
//! Outputs that have since been spent are reported as revoked: an issuer
//! revokes a batch by spending the output that pays its revocation address.

use std::sync::Arc;

use async_trait::async_trait;
use chainanchor_core::chain::SupportedChain;
use chainanchor_core::config::ResolverConfig;
use chainanchor_core::confirmations::check_confirmations_field;
use chainanchor_core::error::ExplorerError;
use chainanchor_core::explorer::{
    field, str_field, ExplorerApi, ExplorerBackend, ParseContext, TransactionApi,
    TRANSACTION_ID_PLACEHOLDER,
};
use chainanchor_core::normalize::strip_hash_prefix;
use chainanchor_core::record::TransactionData;
use chainanchor_core::transport::HttpTransport;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const API_URL: &str = "https://api.blockcypher.com/v1/btc";

/// Last resort.
pub const PRIORITY: i32 = -1;

pub const CHAINS: [SupportedChain; 2] = [SupportedChain::Bitcoin, SupportedChain::Testnet];

pub struct BlockcypherApi {
    minimum_confirmations: u64,
}

impl BlockcypherApi {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            minimum_confirmations: config.minimum_confirmations,
        }
    }
}

fn network(chain: SupportedChain) -> Result<&'static str, ExplorerError> {
    match chain {
        SupportedChain::Bitcoin => Ok("main"),
        SupportedChain::Testnet => Ok("test3"),
        other => Err(ExplorerError::UnsupportedChain {
            service: TransactionApi::Blockcypher,
            chain: other,
        }),
    }
}

fn first_address(entry: &Value) -> Option<&str> {
    entry.pointer("/addresses/0").and_then(Value::as_str)
}

/// `confirmed` once mined, `received` before that.
fn block_time(tx: &Value) -> Result<DateTime<Utc>, ExplorerError> {
    let raw = str_field(tx, &["confirmed", "received"])
        .ok_or_else(|| ExplorerError::malformed("missing confirmed/received"))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ExplorerError::malformed(format!("bad timestamp {raw}: {e}")))
}

#[async_trait]
impl ExplorerApi for BlockcypherApi {
    fn service_url(&self, chain: SupportedChain) -> Result<String, ExplorerError> {
        Ok(format!(
            "{API_URL}/{}/txs/{TRANSACTION_ID_PLACEHOLDER}?limit=500",
            network(chain)?
        ))
    }

    async fn parse(&self, ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError> {
        let tx = ctx.response;
        check_confirmations_field(field(tx, &["confirmations"]), self.minimum_confirmations)?;

        let issuing_address = tx
            .pointer("/inputs/0")
            .and_then(first_address)
            .ok_or_else(|| ExplorerError::malformed("missing inputs[0] address"))?;

        let outputs = tx
            .get("outputs")
            .and_then(Value::as_array)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| ExplorerError::malformed("missing outputs"))?;
        let script = outputs
            .last()
            .and_then(|out| str_field(out, &["script"]))
            .ok_or_else(|| ExplorerError::malformed("missing output script"))?;
        let remote_hash = strip_hash_prefix(script, ctx.chain.prefixes())?;

        let revoked_addresses = outputs
            .iter()
            .filter(|out| field(out, &["spent_by"]).is_some())
            .filter_map(first_address)
            .map(str::to_string)
            .collect();

        Ok(TransactionData {
            remote_hash,
            issuing_address: issuing_address.to_string(),
            time: block_time(tx)?,
            revoked_addresses,
        })
    }
}

pub fn backend(config: &ResolverConfig) -> ExplorerBackend {
    ExplorerBackend::new(
        TransactionApi::Blockcypher,
        PRIORITY,
        Arc::new(BlockcypherApi::new(config)),
    )
}
