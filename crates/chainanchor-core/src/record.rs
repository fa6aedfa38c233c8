//! The canonical anchoring record handed to the certificate verifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized view of an anchoring transaction, independent of which
/// explorer produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    /// 64 lowercase hex characters, no `0x` or script prefix.
    pub remote_hash: String,
    /// Address that signed/funded the anchoring transaction.
    pub issuing_address: String,
    pub time: DateTime<Utc>,
    /// Issuer addresses revoked by spending their output. Always empty for
    /// explorers whose chain family has no revocation outputs.
    pub revoked_addresses: Vec<String>,
}
