//! Contract-ABI assisted decoding of anchoring calldata.
//!
//! Some issuers anchor through a contract call rather than by putting the
//! hash directly into the calldata. When the transaction has a destination
//! contract, the explorer's `getabi` endpoint is asked for its interface. The
//! calldata is decoded against the function whose 4-byte selector matches,
//! and the decoded arguments are scanned for the first `0x` + 64-hex value.
//!
//! Every failure on this path (fetch, unverified contract, unknown selector,
//! bad encoding) yields `None`. Callers then keep the raw calldata.

use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::JsonAbi;
use chainanchor_core::error::TransportError;
use chainanchor_core::normalize::is_prefixed_hash;
use chainanchor_core::transport::HttpTransport;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiDecodeError {
    #[error("ABI fetch failed: {0}")]
    Fetch(#[from] TransportError),

    #[error("invalid ABI: {0}")]
    InvalidAbi(#[from] serde_json::Error),

    #[error("calldata is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("calldata too short: {0} bytes")]
    CalldataTooShort(usize),

    #[error("no function for selector 0x{0}")]
    UnknownSelector(String),

    #[error("ABI decode failed: {0}")]
    Decode(String),
}

/// Decoded ABI value reduced to the three shapes the hash scan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// Leaf rendered as text: hex for bytes and addresses, decimal for ints.
    Scalar(String),
    Sequence(Vec<DecodedValue>),
    Keyed(Vec<(String, DecodedValue)>),
}

impl DecodedValue {
    /// First `0x` + 64-hex scalar in depth-first, declaration order.
    pub fn find_hash(&self) -> Option<&str> {
        match self {
            DecodedValue::Scalar(s) => is_prefixed_hash(s).then_some(s.as_str()),
            DecodedValue::Sequence(items) => items.iter().find_map(DecodedValue::find_hash),
            DecodedValue::Keyed(fields) => fields.iter().find_map(|(_, v)| v.find_hash()),
        }
    }
}

/// Convert an alloy `DynSolValue` into a [`DecodedValue`].
pub fn normalize(val: DynSolValue) -> DecodedValue {
    match val {
        DynSolValue::Bool(b) => DecodedValue::Scalar(b.to_string()),
        DynSolValue::Int(i, _) => DecodedValue::Scalar(i.to_string()),
        DynSolValue::Uint(u, _) => DecodedValue::Scalar(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            DecodedValue::Scalar(format!("0x{}", hex::encode(&word[..size])))
        }
        DynSolValue::Bytes(b) => DecodedValue::Scalar(format!("0x{}", hex::encode(b))),
        DynSolValue::String(s) => DecodedValue::Scalar(s),
        DynSolValue::Address(a) => DecodedValue::Scalar(a.to_checksum(None)),
        DynSolValue::Function(f) => DecodedValue::Scalar(format!("0x{}", hex::encode(f))),
        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            DecodedValue::Sequence(vals.into_iter().map(normalize).collect())
        }
        DynSolValue::Tuple(fields) => DecodedValue::Keyed(
            fields
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), normalize(v)))
                .collect(),
        ),
        // struct values only exist with alloy's eip712 feature
        #[allow(unreachable_patterns)]
        other => DecodedValue::Scalar(format!("{other:?}")),
    }
}

/// A function call decoded against a contract ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub method: String,
    /// `(parameter name, value)` in declaration order.
    pub inputs: Vec<(String, DecodedValue)>,
}

impl DecodedCall {
    /// The whole call as one keyed structure.
    pub fn to_value(&self) -> DecodedValue {
        DecodedValue::Keyed(vec![
            ("method".into(), DecodedValue::Scalar(self.method.clone())),
            (
                "inputs".into(),
                DecodedValue::Sequence(self.inputs.iter().map(|(_, v)| v.clone()).collect()),
            ),
            (
                "names".into(),
                DecodedValue::Sequence(
                    self.inputs
                        .iter()
                        .map(|(n, _)| DecodedValue::Scalar(n.clone()))
                        .collect(),
                ),
            ),
        ])
    }

    /// Scan the inputs first, then the whole decoded call.
    pub fn find_hash(&self) -> Option<String> {
        if let Some(hash) = self.inputs.iter().find_map(|(_, v)| v.find_hash()) {
            return Some(hash.to_string());
        }
        let whole = self.to_value();
        whole.find_hash().map(str::to_string)
    }
}

/// Decode `calldata` (selector included) against `abi`.
pub fn decode_call(abi: &JsonAbi, calldata: &[u8]) -> Result<DecodedCall, AbiDecodeError> {
    if calldata.len() < 4 {
        return Err(AbiDecodeError::CalldataTooShort(calldata.len()));
    }
    let (selector, args) = calldata.split_at(4);

    let func = abi
        .functions()
        .find(|f| f.selector().as_slice() == selector)
        .ok_or_else(|| AbiDecodeError::UnknownSelector(hex::encode(selector)))?;

    let types = func
        .inputs
        .iter()
        .map(|p| p.resolve())
        .collect::<Result<Vec<DynSolType>, _>>()
        .map_err(|e| AbiDecodeError::Decode(e.to_string()))?;

    let values = match DynSolType::Tuple(types)
        .abi_decode_params(args)
        .map_err(|e| AbiDecodeError::Decode(e.to_string()))?
    {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };

    let inputs = func
        .inputs
        .iter()
        .enumerate()
        .zip(values)
        .map(|((i, param), val)| {
            let name = if param.name.is_empty() {
                format!("arg{i}")
            } else {
                param.name.clone()
            };
            (name, normalize(val))
        })
        .collect();

    Ok(DecodedCall {
        method: func.name.clone(),
        inputs,
    })
}

/// Interpret the `result` of a `getabi` response.
///
/// Blockscout and Etherscan return the ABI as a JSON-encoded string; some
/// deployments inline the array. Empty results mean "no ABI".
pub fn parse_abi_result(result: Option<&Value>) -> Result<Option<JsonAbi>, AbiDecodeError> {
    match result {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(serde_json::from_str(s)?)),
        Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
    }
}

/// Fetches contract ABIs from an Etherscan-compatible `getabi` endpoint and
/// extracts anchored hashes from calldata.
#[derive(Clone)]
pub struct AbiDecoder {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
}

impl AbiDecoder {
    /// `api_base` is the explorer's `/api` endpoint, without a query string.
    pub fn new(transport: Arc<dyn HttpTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
        }
    }

    pub fn abi_url(&self, contract_address: &str) -> String {
        format!(
            "{}?module=contract&action=getabi&address={contract_address}",
            self.api_base
        )
    }

    /// The anchored hash (`0x`-prefixed) found in `input_hex`, if any.
    pub async fn decode(&self, contract_address: &str, input_hex: &str) -> Option<String> {
        match self.try_decode(contract_address, input_hex).await {
            Ok(found) => found,
            Err(error) => {
                tracing::debug!(
                    contract = contract_address,
                    error = %error,
                    "ABI-assisted decode unavailable, keeping raw input"
                );
                None
            }
        }
    }

    async fn try_decode(
        &self,
        contract_address: &str,
        input_hex: &str,
    ) -> Result<Option<String>, AbiDecodeError> {
        let Some(abi) = self.fetch_abi(contract_address).await? else {
            return Ok(None);
        };
        let calldata = hex::decode(input_hex.trim_start_matches("0x"))?;
        let call = decode_call(&abi, &calldata)?;
        Ok(call.find_hash())
    }

    pub async fn fetch_abi(&self, contract_address: &str) -> Result<Option<JsonAbi>, AbiDecodeError> {
        let body = self.transport.get(&self.abi_url(contract_address)).await?;
        let response: Value = serde_json::from_str(&body)?;
        parse_abi_result(response.get("result"))
    }
}
