//! Etherscan V2: one multi-chain gateway for every EVM chain it indexes.
//!
//! Uses the `proxy` module (raw JSON-RPC passthrough):
//! - `eth_getTransactionByHash` for sender, calldata and block number
//! - `eth_getBlockByNumber` for the block timestamp
//! - `eth_blockNumber` for the chain head, to count confirmations
//!
//! <https://docs.etherscan.io/etherscan-v2>

use std::sync::Arc;

use async_trait::async_trait;
use chainanchor_core::chain::{ChainFamily, SupportedChain};
use chainanchor_core::config::ResolverConfig;
use chainanchor_core::confirmations::check_confirmations;
use chainanchor_core::error::ExplorerError;
use chainanchor_core::explorer::{
    field, required_str, result_object, ExplorerApi, ExplorerBackend, ParseContext,
    TransactionApi, TRANSACTION_ID_PLACEHOLDER,
};
use chainanchor_core::normalize::{parse_quantity, parse_quantity_str, strip_hash_prefix, to_time};
use chainanchor_core::record::TransactionData;
use chainanchor_core::transport::HttpTransport;
use serde_json::Value;

pub const API_URL: &str = "https://api.etherscan.io/v2/api";

/// Primary explorer for the chains it serves.
pub const PRIORITY: i32 = 0;

/// Chains reachable through the gateway.
pub const CHAINS: [SupportedChain; 7] = [
    SupportedChain::Ethmain,
    SupportedChain::Ethropst,
    SupportedChain::Ethrinkeby,
    SupportedChain::Ethgoerli,
    SupportedChain::Ethsepolia,
    SupportedChain::ArbitrumOne,
    SupportedChain::ArbitrumSepolia,
];

/// Numeric `chainid` the gateway expects for `chain`.
pub fn chain_id(chain: SupportedChain) -> Option<u64> {
    match chain {
        SupportedChain::Ethmain => Some(1),
        SupportedChain::Ethropst => Some(3),
        SupportedChain::Ethrinkeby => Some(4),
        SupportedChain::Ethgoerli => Some(5),
        SupportedChain::Ethsepolia => Some(11_155_111),
        SupportedChain::ArbitrumOne => Some(42_161),
        SupportedChain::ArbitrumSepolia => Some(421_614),
        _ => None,
    }
}

pub struct EtherscanApi {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    api_key: Option<String>,
    minimum_confirmations: u64,
}

impl EtherscanApi {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ResolverConfig) -> Self {
        Self {
            transport,
            api_url: API_URL.to_string(),
            api_key: config.etherscan_api_key.clone(),
            minimum_confirmations: config.minimum_confirmations,
        }
    }

    /// Point at a self-hosted or mock gateway.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn proxy_url(&self, chain: SupportedChain, action: &str) -> Result<String, ExplorerError> {
        let chain_id = chain_id(chain).ok_or(ExplorerError::UnsupportedChain {
            service: TransactionApi::Etherscan,
            chain,
        })?;
        let mut url = format!("{}?chainid={chain_id}&module=proxy&{action}", self.api_url);
        if let Some(key) = &self.api_key {
            url.push_str("&apikey=");
            url.push_str(key);
        }
        Ok(url)
    }

    async fn get_json(&self, url: &str) -> Result<Value, ExplorerError> {
        let body = self.transport.get(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn block_timestamp(
        &self,
        chain: SupportedChain,
        block_number: &str,
    ) -> Result<Option<Value>, ExplorerError> {
        let url = self.proxy_url(
            chain,
            &format!("action=eth_getBlockByNumber&tag={block_number}&boolean=true"),
        )?;
        let response = self.get_json(&url).await?;
        let block = result_object(&response)?;
        Ok(field(block, &["timestamp"]).cloned())
    }

    async fn head_block(&self, chain: SupportedChain) -> Result<u64, ExplorerError> {
        let url = self.proxy_url(chain, "action=eth_blockNumber")?;
        let response = self.get_json(&url).await?;
        response
            .get("result")
            .and_then(parse_quantity)
            .ok_or_else(|| ExplorerError::malformed("unreadable eth_blockNumber result"))
    }
}

#[async_trait]
impl ExplorerApi for EtherscanApi {
    fn service_url(&self, chain: SupportedChain) -> Result<String, ExplorerError> {
        self.proxy_url(
            chain,
            &format!("action=eth_getTransactionByHash&txhash={TRANSACTION_ID_PLACEHOLDER}"),
        )
    }

    async fn parse(&self, ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError> {
        let tx = result_object(ctx.response)?;
        let issuing_address = required_str(tx, &["from"])?;
        let input = required_str(tx, &["input"])?;
        // null while the transaction is still pending
        let block_number = required_str(tx, &["blockNumber"])?;
        let mined_at = parse_quantity_str(block_number)
            .ok_or_else(|| ExplorerError::malformed(format!("bad blockNumber {block_number}")))?;

        let remote_hash = strip_hash_prefix(input, ChainFamily::Ethereum.prefixes())?;

        let timestamp = self.block_timestamp(ctx.chain, block_number).await?;
        let time = to_time(timestamp.as_ref());

        let head = self.head_block(ctx.chain).await?;
        check_confirmations(head.saturating_sub(mined_at), self.minimum_confirmations)?;

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
        TransactionApi::Etherscan,
        PRIORITY,
        Arc::new(EtherscanApi::new(transport, config)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainanchor_core::testing::MockTransport;
    use serde_json::json;

    const ROOT: &str = "ec049a808a09f3e8e257401e0898aa3d32a733706fd7d16aacf0ba95f7b42c0c";

    fn tx_response() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "blockHash": "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
                "blockNumber": "0x123456",
                "from": "0x3d995ef85a8d1bcbed78182ab225b9f88dc8937c",
                "hash": "0x2f9f1d5ba2e6d8b4a4b4a10b1f3d0bd6d0b1e1b16a5e5e0d4f5a1d6a4f4e2a3c",
                "input": format!("0x{ROOT}"),
                "to": "0xdeaddeaddeaddeaddeaddeaddeaddeaddeaddead"
            }
        })
    }

    fn block_response() -> Value {
        json!({ "jsonrpc": "2.0", "id": 1, "result": { "timestamp": "0x5cf38b02", "number": "0x123456" } })
    }

    fn api(transport: MockTransport) -> (Arc<MockTransport>, EtherscanApi) {
        let transport = Arc::new(transport);
        let config = ResolverConfig::default().with_etherscan_api_key("KEY");
        (transport.clone(), EtherscanApi::new(transport, &config))
    }

    #[test]
    fn service_url_embeds_chain_id_for_every_chain() {
        let (_, api) = api(MockTransport::new());
        for chain in CHAINS {
            let url = api.service_url(chain).unwrap();
            let id = chain_id(chain).unwrap();
            assert!(url.starts_with(API_URL), "{url}");
            assert!(url.contains(&format!("chainid={id}&")), "{url}");
            assert!(url.contains("action=eth_getTransactionByHash"));
            assert!(url.contains(TRANSACTION_ID_PLACEHOLDER));
            assert!(url.ends_with("&apikey=KEY"));
        }
        assert_eq!(chain_id(SupportedChain::ArbitrumSepolia), Some(421_614));
        assert_eq!(chain_id(SupportedChain::Ethsepolia), Some(11_155_111));
    }

    #[test]
    fn chains_outside_the_gateway_are_rejected() {
        let (_, api) = api(MockTransport::new());
        assert!(matches!(
            api.service_url(SupportedChain::Bloxberg),
            Err(ExplorerError::UnsupportedChain { .. })
        ));
    }

    #[test]
    fn api_key_is_optional() {
        let api = EtherscanApi::new(Arc::new(MockTransport::new()), &ResolverConfig::default());
        assert!(!api.service_url(SupportedChain::Ethmain).unwrap().contains("apikey"));
    }

    #[tokio::test]
    async fn parses_arbitrum_sepolia_transaction() {
        let (transport, api) = api(
            MockTransport::new()
                .respond_json("action=eth_getBlockByNumber", &block_response())
                .respond_json(
                    "action=eth_blockNumber",
                    &json!({ "jsonrpc": "2.0", "id": 1, "result": "0x123466" }),
                ),
        );
        let response = tx_response();
        let record = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::ArbitrumSepolia,
            })
            .await
            .unwrap();

        assert_eq!(record.remote_hash, ROOT);
        assert_eq!(record.issuing_address, "0x3d995ef85a8d1bcbed78182ab225b9f88dc8937c");
        assert_eq!(record.time.to_rfc3339(), "2019-06-02T08:38:26+00:00");
        assert!(record.revoked_addresses.is_empty());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("chainid=421614"));
        assert!(calls[0].contains("tag=0x123456&boolean=true"));
        assert!(calls[1].contains("action=eth_blockNumber"));
    }

    #[tokio::test]
    async fn same_block_head_is_not_enough_confirmations() {
        let (_, api) = api(
            MockTransport::new()
                .respond_json("action=eth_getBlockByNumber", &block_response())
                .respond_json(
                    "action=eth_blockNumber",
                    &json!({ "jsonrpc": "2.0", "id": 1, "result": 0x123456 }),
                ),
        );
        let response = tx_response();
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::ArbitrumSepolia,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::InsufficientConfirmations { confirmations: 0, .. }));
    }

    #[tokio::test]
    async fn block_lookup_failure_fails_the_attempt() {
        let (_, api) = api(MockTransport::new().fail(
            "action=eth_getBlockByNumber",
            chainanchor_core::TransportError::Http("Network error".into()),
        ));
        let response = tx_response();
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Ethmain,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::Transport(_)));
    }

    #[tokio::test]
    async fn pending_transaction_is_malformed() {
        let (transport, api) = api(MockTransport::new());
        let mut response = tx_response();
        response["result"]["blockNumber"] = Value::Null;
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Ethmain,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResponse(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn error_envelope_is_malformed() {
        let (_, api) = api(MockTransport::new());
        let response = json!({ "status": "0", "message": "NOTOK", "result": "Invalid API Key" });
        let err = api
            .parse(ParseContext {
                response: &response,
                chain: SupportedChain::Ethmain,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResponse(_)));
    }
}
