//! Supported chains and their static metadata (family, hash prefixes).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain VM family. Decides which prefix table is used to strip anchor payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Bitcoin,
    Ethereum,
    /// Synthetic chains used by issuers for local testing. No explorers.
    Mock,
}

impl ChainFamily {
    /// Known leading markers of an anchor payload on this family.
    ///
    /// Bitcoin anchors sit in an `OP_RETURN` output (`6a` opcode, `20` push
    /// of 32 bytes); EVM anchors are plain `0x`-prefixed calldata.
    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            ChainFamily::Bitcoin => &["6a20", "OP_RETURN "],
            ChainFamily::Ethereum => &["0x"],
            ChainFamily::Mock => &[],
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFamily::Bitcoin => write!(f, "bitcoin"),
            ChainFamily::Ethereum => write!(f, "ethereum"),
            ChainFamily::Mock => write!(f, "mock"),
        }
    }
}

/// Every chain a certificate can be anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedChain {
    Bitcoin,
    Ethmain,
    Ethropst,
    Ethrinkeby,
    Ethgoerli,
    Ethsepolia,
    ArbitrumOne,
    ArbitrumSepolia,
    Bloxberg,
    Mocknet,
    Regtest,
    Testnet,
}

/// Static description of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockchainInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub family: ChainFamily,
    pub test: bool,
}

impl SupportedChain {
    pub const ALL: [SupportedChain; 12] = [
        SupportedChain::Bitcoin,
        SupportedChain::Ethmain,
        SupportedChain::Ethropst,
        SupportedChain::Ethrinkeby,
        SupportedChain::Ethgoerli,
        SupportedChain::Ethsepolia,
        SupportedChain::ArbitrumOne,
        SupportedChain::ArbitrumSepolia,
        SupportedChain::Bloxberg,
        SupportedChain::Mocknet,
        SupportedChain::Regtest,
        SupportedChain::Testnet,
    ];

    pub fn info(&self) -> BlockchainInfo {
        use ChainFamily::*;
        let (code, name, family, test) = match self {
            SupportedChain::Bitcoin => ("bitcoin", "Bitcoin", Bitcoin, false),
            SupportedChain::Testnet => ("testnet", "Bitcoin Testnet", Bitcoin, true),
            SupportedChain::Ethmain => ("ethmain", "Ethereum", Ethereum, false),
            SupportedChain::Ethropst => ("ethropst", "Ethereum Testnet Ropsten", Ethereum, true),
            SupportedChain::Ethrinkeby => ("ethrinkeby", "Ethereum Testnet Rinkeby", Ethereum, true),
            SupportedChain::Ethgoerli => ("ethgoerli", "Ethereum Testnet Goerli", Ethereum, true),
            SupportedChain::Ethsepolia => ("ethsepolia", "Ethereum Testnet Sepolia", Ethereum, true),
            SupportedChain::ArbitrumOne => ("arbitrumone", "Arbitrum One", Ethereum, false),
            SupportedChain::ArbitrumSepolia => ("arbitrumsepolia", "Arbitrum Sepolia", Ethereum, true),
            SupportedChain::Bloxberg => ("bloxberg", "Bloxberg", Ethereum, false),
            SupportedChain::Mocknet => ("mocknet", "Mocknet", Mock, true),
            SupportedChain::Regtest => ("regtest", "Regtest", Mock, true),
        };
        BlockchainInfo { code, name, family, test }
    }

    pub fn family(&self) -> ChainFamily {
        self.info().family
    }

    pub fn prefixes(&self) -> &'static [&'static str] {
        self.family().prefixes()
    }

    pub fn is_test_chain(&self) -> bool {
        self.info().test
    }
}

impl fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().code)
    }
}

/// Returned when a chain code does not name a [`SupportedChain`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported chain: {0}")]
pub struct UnknownChain(pub String);

impl FromStr for SupportedChain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SupportedChain::ALL
            .into_iter()
            .find(|c| c.info().code == wanted)
            .ok_or_else(|| UnknownChain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_codes_round_trip_through_from_str() {
        for chain in SupportedChain::ALL {
            assert_eq!(chain.to_string().parse::<SupportedChain>().unwrap(), chain);
        }
    }

    #[test]
    fn serde_uses_chain_codes() {
        let json = serde_json::to_string(&SupportedChain::ArbitrumSepolia).unwrap();
        assert_eq!(json, "\"arbitrumsepolia\"");
        let back: SupportedChain = serde_json::from_str("\"ethmain\"").unwrap();
        assert_eq!(back, SupportedChain::Ethmain);
    }

    #[test]
    fn unknown_chain_is_rejected() {
        assert!("dogecoin".parse::<SupportedChain>().is_err());
    }

    #[test]
    fn prefix_tables_follow_family() {
        assert_eq!(SupportedChain::Testnet.prefixes(), &["6a20", "OP_RETURN "]);
        assert_eq!(SupportedChain::Bloxberg.prefixes(), &["0x"]);
        assert!(SupportedChain::Mocknet.prefixes().is_empty());
    }
}
