//! Resolver configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the minimum confirmation count.
pub const MIN_CONFIRMATIONS_ENV: &str = "CHAINANCHOR_MIN_CONFIRMATIONS";
/// Environment variable holding the Etherscan V2 API key.
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings shared by every explorer backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Blocks that must sit on top of the anchoring block.
    #[serde(default = "default_min_confirmations")]
    pub minimum_confirmations: u64,
    /// Etherscan V2 key; requests are sent without one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etherscan_api_key: Option<String>,
    /// Per-request timeout of the HTTP transport.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Transport-level retries for transient HTTP failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_min_confirmations() -> u64 { 1 }
fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> u32 { 3 }

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            minimum_confirmations: default_min_confirmations(),
            etherscan_api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl ResolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `CHAINANCHOR_MIN_CONFIRMATIONS` and `ETHERSCAN_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(MIN_CONFIRMATIONS_ENV) {
            config.minimum_confirmations =
                raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: MIN_CONFIRMATIONS_ENV,
                    value: raw.clone(),
                })?;
        }
        config.etherscan_api_key = lookup(ETHERSCAN_API_KEY_ENV).filter(|k| !k.is_empty());
        Ok(config)
    }

    pub fn with_minimum_confirmations(mut self, minimum: u64) -> Self {
        self.minimum_confirmations = minimum;
        self
    }

    pub fn with_etherscan_api_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_api_key = Some(key.into());
        self
    }
}
