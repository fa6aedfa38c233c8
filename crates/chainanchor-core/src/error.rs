//! Error types for transport calls, explorer attempts and resolution.

use thiserror::Error;

use crate::chain::SupportedChain;
use crate::explorer::TransactionApi;

/// Errors raised by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, body read failure, etc.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if the error is transient and the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Other(_) => false,
        }
    }
}

/// Why a single explorer could not resolve a transaction.
///
/// These never reach callers of
/// [`ExplorerRegistry::resolve`](crate::registry::ExplorerRegistry::resolve)
/// directly; they are logged and kept on [`AttemptFailure`].
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// A required field is missing, empty or of the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Not enough confirmations: {confirmations} < {minimum}")]
    InsufficientConfirmations { confirmations: u64, minimum: u64 },

    /// The anchor payload does not normalize to a 32-byte hex hash.
    #[error("Invalid anchor hash: {0}")]
    InvalidHash(String),

    #[error("{service} does not serve chain {chain}")]
    UnsupportedChain {
        service: TransactionApi,
        chain: SupportedChain,
    },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl ExplorerError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }

    /// Short, stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedResponse(_) => "malformed_response",
            Self::InsufficientConfirmations { .. } => "insufficient_confirmations",
            Self::InvalidHash(_) => "invalid_hash",
            Self::UnsupportedChain { .. } => "unsupported_chain",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(format!("invalid JSON: {e}"))
    }
}

/// One failed explorer attempt, kept for diagnostics.
#[derive(Debug)]
pub struct AttemptFailure {
    pub service: TransactionApi,
    pub error: ExplorerError,
}

/// The only errors surfaced by the registry.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every explorer registered for the chain failed.
    #[error("Unable to get remote hash")]
    UnableToGetRemoteHash {
        chain: SupportedChain,
        failures: Vec<AttemptFailure>,
    },

    /// No explorer is registered for the chain (configuration error).
    #[error("No explorer registered for chain {0}")]
    NoExplorers(SupportedChain),
}
