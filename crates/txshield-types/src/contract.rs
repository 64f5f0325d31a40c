//! Contract intelligence, populated incrementally as providers report back.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// Proxy pattern detected by the proxy-detect provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Eip1967,
    Uups,
    Beacon,
    Minimal,
    Unknown,
}

/// What is known about the scan target. Only `address`, `chain`,
/// `verified`, and `is_proxy` are always meaningful; everything else stays
/// `None` when the responsible provider was skipped or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub address: Address,
    pub chain: Chain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_name: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_count: Option<u64>,
    pub is_proxy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<ProxyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon: Option<Address>,
    /// Whether code exists at the address; `None` until the rpc provider
    /// has answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_contract: Option<bool>,
}

impl ContractInfo {
    pub fn new(address: Address, chain: Chain) -> Self {
        ContractInfo {
            address,
            chain,
            name: None,
            proxy_name: None,
            implementation_name: None,
            verified: false,
            age_days: None,
            tx_count: None,
            is_proxy: false,
            proxy_type: None,
            implementation: None,
            beacon: None,
            is_contract: None,
        }
    }
}

/// How the protocol registry matched the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMatch {
    pub name: String,
    pub slug: String,
    /// `"address"` for the canonical table, `"name-heuristic"` for the
    /// keyword fallback over proxy/implementation names.
    pub matched_by: String,
}
