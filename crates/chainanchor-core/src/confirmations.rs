//! Minimum-confirmation gate applied before a record is trusted.

use serde_json::Value;

use crate::error::ExplorerError;
use crate::normalize::parse_quantity;

/// Fail with [`ExplorerError::InsufficientConfirmations`] when `confirmations < minimum`.
pub fn check_confirmations(confirmations: u64, minimum: u64) -> Result<(), ExplorerError> {
    if confirmations < minimum {
        return Err(ExplorerError::InsufficientConfirmations {
            confirmations,
            minimum,
        });
    }
    Ok(())
}

/// Read a confirmation count from an explorer field and gate it.
///
/// An absent (or `null`) field counts as zero confirmations; a present but
/// unparsable one is a malformed response.
pub fn check_confirmations_field(value: Option<&Value>, minimum: u64) -> Result<u64, ExplorerError> {
    let confirmations = match value {
        None | Some(Value::Null) => 0,
        Some(v) => parse_quantity(v).ok_or_else(|| {
            ExplorerError::malformed(format!("unreadable confirmation count: {v}"))
        })?,
    };
    check_confirmations(confirmations, minimum)?;
    Ok(confirmations)
}
