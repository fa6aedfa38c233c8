//! The contract every explorer backend implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::chain::SupportedChain;
use crate::error::ExplorerError;
use crate::record::TransactionData;

/// Token substituted by the transaction id before a service URL is fetched.
pub const TRANSACTION_ID_PLACEHOLDER: &str = "{transaction_id}";

/// Explorer service identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionApi {
    Etherscan,
    Blockscout,
    Blockstream,
    Blockcypher,
}

impl fmt::Display for TransactionApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Etherscan => write!(f, "etherscan"),
            Self::Blockscout => write!(f, "blockscout"),
            Self::Blockstream => write!(f, "blockstream"),
            Self::Blockcypher => write!(f, "blockcypher"),
        }
    }
}

/// Input handed to [`ExplorerApi::parse`].
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Decoded body of the primary transaction lookup.
    pub response: &'a Value,
    pub chain: SupportedChain,
}

/// URL builder and response parser for one explorer service.
///
/// Implementations may issue follow-up requests (block lookups, contract ABI)
/// from `parse`, strictly after the primary fetch.
#[async_trait]
pub trait ExplorerApi: Send + Sync + 'static {
    /// Transaction lookup URL containing [`TRANSACTION_ID_PLACEHOLDER`].
    fn service_url(&self, chain: SupportedChain) -> Result<String, ExplorerError>;

    async fn parse(&self, ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError>;
}

/// A registered explorer: name, preference and implementation.
#[derive(Clone)]
pub struct ExplorerBackend {
    pub service_name: TransactionApi,
    /// Higher is tried first; negative values mark last-resort explorers.
    pub priority: i32,
    pub api: Arc<dyn ExplorerApi>,
}

impl ExplorerBackend {
    pub fn new(service_name: TransactionApi, priority: i32, api: Arc<dyn ExplorerApi>) -> Self {
        Self { service_name, priority, api }
    }

    /// The lookup URL for `transaction_id` on `chain`.
    pub fn transaction_url(
        &self,
        chain: SupportedChain,
        transaction_id: &str,
    ) -> Result<String, ExplorerError> {
        Ok(self
            .api
            .service_url(chain)?
            .replace(TRANSACTION_ID_PLACEHOLDER, transaction_id))
    }
}

impl fmt::Debug for ExplorerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerBackend")
            .field("service_name", &self.service_name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// ─── Defensive field access ───────────────────────────────────────────────────

/// Non-null field, trying `keys` in order.
pub fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(k))
        .find(|v| !v.is_null())
}

/// Non-empty string field, trying `keys` in order.
pub fn str_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Like [`str_field`] but a missing value is a malformed response.
pub fn required_str<'a>(obj: &'a Value, keys: &[&str]) -> Result<&'a str, ExplorerError> {
    str_field(obj, keys)
        .ok_or_else(|| ExplorerError::malformed(format!("missing {}", keys.join("/"))))
}

/// The JSON object under `result`, as used by Etherscan-style envelopes.
pub fn result_object(response: &Value) -> Result<&Value, ExplorerError> {
    response
        .get("result")
        .filter(|r| r.is_object())
        .ok_or_else(|| ExplorerError::malformed("missing result object"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed;

    #[async_trait]
    impl ExplorerApi for Fixed {
        fn service_url(&self, _chain: SupportedChain) -> Result<String, ExplorerError> {
            Ok(format!("https://example.org/tx/{TRANSACTION_ID_PLACEHOLDER}?x=1"))
        }

        async fn parse(&self, _ctx: ParseContext<'_>) -> Result<TransactionData, ExplorerError> {
            Err(ExplorerError::malformed("unused"))
        }
    }

    #[test]
    fn transaction_url_substitutes_placeholder() {
        let backend = ExplorerBackend::new(TransactionApi::Blockstream, 0, Arc::new(Fixed));
        let url = backend.transaction_url(SupportedChain::Bitcoin, "abcd").unwrap();
        assert_eq!(url, "https://example.org/tx/abcd?x=1");
    }

    #[test]
    fn field_helpers_skip_null_and_empty() {
        let obj = json!({ "input": "", "data": "0x12", "timeStamp": null, "timestamp": "5" });
        assert_eq!(str_field(&obj, &["input", "data"]), Some("0x12"));
        assert_eq!(field(&obj, &["timeStamp", "timestamp"]), Some(&json!("5")));
        assert!(required_str(&obj, &["from"]).is_err());
    }

    #[test]
    fn result_object_requires_object() {
        assert!(result_object(&json!({ "result": "Invalid API Key" })).is_err());
        assert!(result_object(&json!({ "result": null })).is_err());
        assert!(result_object(&json!({ "result": {} })).is_ok());
    }
}
