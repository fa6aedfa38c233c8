//! Blockstream Esplora backend for Bitcoin mainnet and testnet.
//!
//! The transaction body carries no confirmation count, so the chain tip is
//! fetched from `/blocks/tip/height` after the primary lookup.

use std::sync::Arc;

use async_trait::async_trait;
use chainanchor_core::chain::SupportedChain;
use chainanchor_core::config::ResolverConfig;
use chainanchor_core::confirmations::check_confirmations;
use chainanchor_core::error::ExplorerError;
use chainanchor_core::explorer::{
    field, str_field, ExplorerApi, ExplorerBackend, ParseContext, TransactionApi,
    TRANSACTION_ID_PLACEHOLDER,
};
use chainanchor_core::normalize::{parse_quantity, parse_quantity_str, strip_hash_prefix, to_time};
use chainanchor_core::record::TransactionData;
use chainanchor_core::transport::HttpTransport;
use serde_json::Value;

pub const MAINNET_API_URL: &str = "https://blockstream.info/api";
pub const TESTNET_API_URL: &str = "https://blockstream.info/testnet/api";

pub const PRIORITY: i32 = 0;

pub const CHAINS: [SupportedChain; 2] = [SupportedChain::Bitcoin, SupportedChain::Testnet];

pub struct BlockstreamApi {
    transport: Arc<dyn HttpTransport>,
    minimum_confirmations: u64,
}

impl BlockstreamApi {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> Self {
        Self {
            transport,
            minimum_confirmations: config.minimum_confirmations,
        }
    }

    fn api_url(chain: SupportedChain) -> Result<&'static str, ExplorerError> {
        match chain {
            SupportedChain::Bitcoin => Ok(MAINNET_API_URL),
            SupportedChain::Testnet => Ok(TESTNET_API_URL),
            other => Err(ExplorerError::UnsupportedChain {
                service: TransactionApi::Blockstream,
                chain: other,
            }),
        }
    }

    async fn tip_height(&self, chain: SupportedChain) -> Result<u64, ExplorerError> {
        let url = format!("{}/blocks/tip/height", Self::api_url(chain)?);
        let body = self.transport.get(&url).await?;
        parse_quantity_str(body.trim())
            .ok_or_else(|| ExplorerError::malformed(format!("unreadable tip height: {body}")))
    }
}

/// `scriptpubkey` of the first `OP_RETURN` output.
fn op_return_script(tx: &Value) -> Option<&str> {
    tx.get("vout")?
        .as_array()?
        .iter()
        .find(|out| out.get("scriptpubkey_type").and_then(Value::as_str) == Some("op_return"))
        .and_then(|out| str_field(out, &["scriptpubkey"]))
}

#[async_trait]
impl ExplorerApi for BlockstreamApi {
    fn service_url(&self, chain: SupportedChain) -> Result<String, ExplorerError> {
        Ok(format!("{}/tx/{TRANSACTION_ID_PLACEHOLDER}", Self::api_url(chain)?))
    }

    async fn parse(&self, ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError> {
        let tx = ctx.response;
        let status = field(tx, &["status"])
            .ok_or_else(|| ExplorerError::malformed("missing status"))?;

        let issuing_address = tx
            .pointer("/vin/0/prevout/scriptpubkey_address")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExplorerError::malformed("missing vin[0] address"))?;
        let script =
            op_return_script(tx).ok_or_else(|| ExplorerError::malformed("no OP_RETURN output"))?;
        let remote_hash = strip_hash_prefix(script, ctx.chain.prefixes())?;

        let confirmed = status.get("confirmed").and_then(Value::as_bool).unwrap_or(false);
        let confirmations = match status.get("block_height").and_then(parse_quantity) {
            Some(height) if confirmed => {
                let tip = self.tip_height(ctx.chain).await?;
                (tip + 1).saturating_sub(height)
            }
            _ => 0,
        };
        check_confirmations(confirmations, self.minimum_confirmations)?;

        Ok(TransactionData {
            remote_hash,
            issuing_address: issuing_address.to_string(),
            time: to_time(field(status, &["block_time"])),
            revoked_addresses: vec![],
        })
    }
}

pub fn backend(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> ExplorerBackend {
    ExplorerBackend::new(
        TransactionApi::Blockstream,
        PRIORITY,
        Arc::new(BlockstreamApi::new(transport, config)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainanchor_core::testing::MockTransport;
    use serde_json::json;

    const ROOT: &str = "68f3ede17fdb67ffd4a5164b5687a71f9fbb68da803b803935720f2aa38f7728";

    fn esplora_tx(confirmed: bool) -> Value {
        let status = if confirmed {
            json!({ "confirmed": true, "block_height": 1_087_234, "block_time": 1_488_404_010 })
        } else {
            json!({ "confirmed": false })
        };
        json!({
            "txid": "2378076e8e140012814e98a2b2cb1af07ec760b239c1d6d93ba54d658a010ecd",
            "vin": [{
                "prevout": {
                    "scriptpubkey_address": "msBCHdwaQ7N2ypBYupkp6uNxtr9Pg76imj",
                    "value": 1_000_000
                }
            }],
            "vout": [
                {
                    "scriptpubkey": "76a914",
                    "scriptpubkey_type": "p2pkh",
                    "scriptpubkey_address": "msBCHdwaQ7N2ypBYupkp6uNxtr9Pg76imj",
                    "value": 990_000
                },
                {
                    "scriptpubkey": format!("6a20{ROOT}"),
                    "scriptpubkey_type": "op_return",
                    "value": 0
                }
            ],
            "status": status
        })
    }

    fn api(transport: MockTransport) -> (Arc<MockTransport>, BlockstreamApi) {
        let transport = Arc::new(transport);
        (
            transport.clone(),
            BlockstreamApi::new(transport, &ResolverConfig::default()),
        )
    }

    #[tokio::test]
    async fn parses_confirmed_testnet_transaction() {
        let (transport, api) = api(MockTransport::new().respond("/blocks/tip/height", "1087240"));
        let response = esplora_tx(true);
        let record = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Testnet,
            })
            .await
            .unwrap();

        assert_eq!(record.remote_hash, ROOT);
        assert_eq!(record.issuing_address, "msBCHdwaQ7N2ypBYupkp6uNxtr9Pg76imj");
        assert_eq!(record.time.timestamp(), 1_488_404_010);
        assert!(record.revoked_addresses.is_empty());
        assert_eq!(
            transport.calls(),
            vec!["https://blockstream.info/testnet/api/blocks/tip/height"]
        );
    }

    #[tokio::test]
    async fn unconfirmed_transaction_fails_the_gate() {
        let (transport, api) = api(MockTransport::new());
        let response = esplora_tx(false);
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Bitcoin,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::InsufficientConfirmations { confirmations: 0, minimum: 1 }
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn deep_requirement_counts_from_the_tip() {
        let transport = Arc::new(MockTransport::new().respond("/blocks/tip/height", "1087236\n"));
        let api = BlockstreamApi::new(
            transport,
            &ResolverConfig::default().with_minimum_confirmations(6),
        );
        let response = esplora_tx(true);
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Bitcoin,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::InsufficientConfirmations { confirmations: 3, minimum: 6 }
        ));
    }

    #[tokio::test]
    async fn missing_op_return_is_malformed() {
        let (_, api) = api(MockTransport::new());
        let mut response = esplora_tx(true);
        response["vout"].as_array_mut().unwrap().pop();
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Bitcoin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResponse(_)));
    }

    #[test]
    fn urls_per_network() {
        let (_, api) = api(MockTransport::new());
        assert_eq!(
            api.service_url(SupportedChain::Bitcoin).unwrap(),
            "https://blockstream.info/api/tx/{transaction_id}"
        );
        assert_eq!(
            api.service_url(SupportedChain::Testnet).unwrap(),
            "https://blockstream.info/testnet/api/tx/{transaction_id}"
        );
        assert!(api.service_url(SupportedChain::Regtest).is_err());
    }
}
