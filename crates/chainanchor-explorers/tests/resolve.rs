//! End-to-end resolution through the default registry, with scripted HTTP.

use std::sync::Arc;

use chainanchor_core::testing::MockTransport;
use chainanchor_core::{
    ExplorerError, ResolveError, ResolverConfig, SupportedChain, TransactionApi, TransportError,
};
use chainanchor_explorers::default_registry;
use serde_json::json;

const ROOT: &str = "ec049a808a09f3e8e257401e0898aa3d32a733706fd7d16aacf0ba95f7b42c0c";
const TX: &str = "0x2f9f1d5ba2e6d8b4a4b4a10b1f3d0bd6d0b1e1b16a5e5e0d4f5a1d6a4f4e2a3c";

fn registry(transport: MockTransport) -> (Arc<MockTransport>, chainanchor_core::ExplorerRegistry) {
    let transport = Arc::new(transport);
    let registry = default_registry(transport.clone(), &ResolverConfig::default());
    (transport, registry)
}

#[test]
fn bitcoin_prefers_blockstream() {
    let (_, registry) = registry(MockTransport::new());
    let order: Vec<_> = registry
        .backends_for(SupportedChain::Bitcoin)
        .iter()
        .map(|b| b.service_name)
        .collect();
    assert_eq!(order, vec![TransactionApi::Blockstream, TransactionApi::Blockcypher]);
    assert!(registry.backends_for(SupportedChain::Mocknet).is_empty());
    assert!(!registry.chains().contains(&SupportedChain::Regtest));
}

#[tokio::test]
async fn arbitrum_sepolia_through_gateway() {
    let (transport, registry) = registry(
        MockTransport::new()
            .respond_json(
                "action=eth_getTransactionByHash",
                &json!({
                    "jsonrpc": "2.0", "id": 1,
                    "result": {
                        "from": "0x3d995ef85a8d1bcbed78182ab225b9f88dc8937c",
                        "input": format!("0x{ROOT}"),
                        "blockNumber": "0x123456"
                    }
                }),
            )
            .respond_json(
                "action=eth_getBlockByNumber",
                &json!({ "result": { "timestamp": "0x5cf38b02" } }),
            )
            .respond_json("action=eth_blockNumber", &json!({ "result": "0x123466" })),
    );

    let record = registry
        .resolve(SupportedChain::ArbitrumSepolia, TX)
        .await
        .unwrap();
    assert_eq!(record.remote_hash, ROOT);
    assert_eq!(record.time.to_rfc3339(), "2019-06-02T08:38:26+00:00");

    let first = &transport.calls()[0];
    assert!(first.starts_with("https://api.etherscan.io/v2/api?chainid=421614&"));
    assert!(first.contains(&format!("txhash={TX}")));
}

#[tokio::test]
async fn bitcoin_falls_back_to_blockcypher() {
    let (transport, registry) = registry(
        MockTransport::new()
            .fail(
                "blockstream.info",
                TransportError::Status { status: 503, body: "busy".into() },
            )
            .respond_json(
                "api.blockcypher.com",
                &json!({
                    "confirmed": "2017-03-01T21:33:30Z",
                    "confirmations": 40,
                    "inputs": [{ "addresses": ["msBCHdwaQ7N2ypBYupkp6uNxtr9Pg76imj"] }],
                    "outputs": [
                        { "script": "76a914", "addresses": ["mgdWjvq4RYAAP5goUNagTRMx7Xw534S5am"], "spent_by": "ab" },
                        { "script": format!("6a20{ROOT}"), "addresses": null }
                    ]
                }),
            ),
    );

    let record = registry.resolve(SupportedChain::Bitcoin, "2378").await.unwrap();
    assert_eq!(record.remote_hash, ROOT);
    assert_eq!(record.revoked_addresses, vec!["mgdWjvq4RYAAP5goUNagTRMx7Xw534S5am"]);
    assert_eq!(
        transport.calls(),
        vec![
            "https://blockstream.info/api/tx/2378",
            "https://api.blockcypher.com/v1/btc/main/txs/2378?limit=500",
        ]
    );
}

#[tokio::test]
async fn bloxberg_with_unverified_contract() {
    let (transport, registry) = registry(
        MockTransport::new()
            .respond_json(
                "action=gettxinfo",
                &json!({
                    "status": "1",
                    "result": {
                        "from": "0x3d995ef85a8d1bcbed78182ab225b9f88dc8937c",
                        "to": "0x000000000000000000000000000000000000c0de",
                        "input": format!("0x{ROOT}"),
                        "timeStamp": "1559464706",
                        "confirmations": "7"
                    }
                }),
            )
            .respond_json(
                "action=getabi",
                &json!({ "status": "0", "message": "NOTOK", "result": "Contract source code not verified" }),
            ),
    );

    let record = registry.resolve(SupportedChain::Bloxberg, TX).await.unwrap();
    assert_eq!(record.remote_hash, ROOT);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn exhausted_explorers_give_uniform_error() {
    let (_, registry) = registry(MockTransport::new().respond_json(
        "action=eth_getTransactionByHash",
        &json!({ "status": "0", "message": "NOTOK", "result": "Error! Invalid transaction hash" }),
    ));

    let err = registry.resolve(SupportedChain::Ethsepolia, TX).await.unwrap_err();
    assert_eq!(err.to_string(), "Unable to get remote hash");
    match err {
        ResolveError::UnableToGetRemoteHash { chain, failures } => {
            assert_eq!(chain, SupportedChain::Ethsepolia);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].service, TransactionApi::Etherscan);
            assert!(matches!(failures[0].error, ExplorerError::MalformedResponse(_)));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn synthetic_chains_have_no_explorers() {
    let (transport, registry) = registry(MockTransport::new());
    for chain in [SupportedChain::Mocknet, SupportedChain::Regtest] {
        let err = registry.resolve(chain, TX).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoExplorers(c) if c == chain));
    }
    assert_eq!(transport.call_count(), 0);
}
