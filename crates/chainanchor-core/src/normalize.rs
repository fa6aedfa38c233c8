//! Normalizers shared by every explorer parser: anchor hash, timestamp and
//! numeric quantities that explorers encode as decimal or `0x` hex.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ExplorerError;

/// Length of a hex-encoded 32-byte hash.
pub const HASH_HEX_LEN: usize = 64;

/// Strip the chain's anchor marker and any `0x`, returning a lowercase hash.
///
/// Only the first matching entry of `prefixes` is removed.
///
/// # Errors
/// Returns [`ExplorerError::InvalidHash`] unless exactly 64 hex characters remain.
pub fn strip_hash_prefix(hex: &str, prefixes: &[&str]) -> Result<String, ExplorerError> {
    let mut rest = hex.trim();
    if let Some(stripped) = prefixes.iter().find_map(|p| rest.strip_prefix(p)) {
        rest = stripped;
    }
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);

    if rest.len() != HASH_HEX_LEN || !rest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ExplorerError::InvalidHash(hex.to_string()));
    }
    Ok(rest.to_ascii_lowercase())
}

/// `true` for `0x` followed by exactly 64 hex characters.
pub fn is_prefixed_hash(s: &str) -> bool {
    s.strip_prefix("0x")
        .map(|h| h.len() == HASH_HEX_LEN && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Convert a seconds-since-epoch value into UTC time.
///
/// Accepts a `0x` hex string, a decimal string, or a JSON number. Anything
/// absent, unparsable or out of range maps to the Unix epoch.
pub fn to_time(value: Option<&Value>) -> DateTime<Utc> {
    let seconds = match value {
        Some(Value::String(s)) => parse_seconds(s),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    seconds.and_then(seconds_to_time).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// String form of [`to_time`].
pub fn to_time_str(value: &str) -> DateTime<Utc> {
    parse_seconds(value)
        .and_then(seconds_to_time)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_seconds(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok().map(|n| n as f64),
        None => s.parse::<f64>().ok(),
    }
}

fn seconds_to_time(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parse a non-negative integer quantity (block number, confirmation count).
///
/// Explorers disagree on encoding: Etherscan's proxy module answers in hex,
/// Blockscout in decimal strings, others in bare JSON numbers.
pub fn parse_quantity(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => parse_quantity_str(s),
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f.trunc() as u64)
        }),
        _ => None,
    }
}

/// String form of [`parse_quantity`].
pub fn parse_quantity_str(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse::<u64>().ok(),
    }
}
