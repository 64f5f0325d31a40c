//! The closed set of EVM networks txshield scans.
//!
//! A [`Chain`] carries no state. It serializes by name (`"ethereum"`,
//! `"base"`, ...) and parses from either a name or a chain-id string, so
//! wallet payloads carrying `"chainId": "0x1"` and CLI flags carrying
//! `--chain base` resolve through the same code path.
//!
//! # Example
//!
//! ```
//! use txshield_types::Chain;
//!
//! let base: Chain = "base".parse().unwrap();
//! assert_eq!(base.id(), 8453);
//!
//! let by_id: Chain = "8453".parse().unwrap();
//! assert_eq!(by_id, Chain::Base);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A supported EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Base,
    Arbitrum,
    Optimism,
    Polygon,
}

impl Chain {
    /// All supported chains, in canonical order.
    pub fn variants() -> &'static [Chain] {
        &[
            Chain::Ethereum,
            Chain::Base,
            Chain::Arbitrum,
            Chain::Optimism,
            Chain::Polygon,
        ]
    }

    /// The numeric EIP-155 chain id.
    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::Optimism => 10,
            Chain::Polygon => 137,
        }
    }

    /// The lowercase network name used in serialized output and CLI flags.
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Optimism => "optimism",
            Chain::Polygon => "polygon",
        }
    }

    /// Resolves a chain from its numeric EIP-155 id.
    pub fn from_id(id: u64) -> Option<Chain> {
        Chain::variants().iter().copied().find(|c| c.id() == id)
    }

    /// The Etherscan-family API host for this chain.
    pub fn explorer_api_host(&self) -> &'static str {
        match self {
            Chain::Ethereum => "api.etherscan.io",
            Chain::Base => "api.basescan.org",
            Chain::Arbitrum => "api.arbiscan.io",
            Chain::Optimism => "api-optimistic.etherscan.io",
            Chain::Polygon => "api.polygonscan.com",
        }
    }

    /// The native currency ticker rendered in intents and deltas.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Polygon => "POL",
            _ => "ETH",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is neither a known network name nor a
/// supported chain-id.
#[derive(Debug, thiserror::Error)]
#[error("Unknown chain {0:?}")]
pub struct ChainParseError(pub String);

impl FromStr for Chain {
    type Err = ChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        for chain in Chain::variants() {
            if chain.name() == lower {
                return Ok(*chain);
            }
        }
        // Accept decimal or 0x-prefixed chain ids.
        let id = if let Some(hex_part) = lower.strip_prefix("0x") {
            u64::from_str_radix(hex_part, 16).ok()
        } else {
            lower.parse::<u64>().ok()
        };
        id.and_then(Chain::from_id)
            .ok_or_else(|| ChainParseError(s.to_string()))
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Chain::from_str(&s).map_err(de::Error::custom)
    }
}
