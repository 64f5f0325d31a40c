//! Result shapes consumed from a transaction simulator.
//!
//! txshield does not construct forks itself; a [`SimulationResult`] arrives
//! from whichever backend is configured (an external forked node, or the
//! in-process heuristic) and is folded into the recommendation by the
//! analyzer.

use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};

/// How complete a set of simulated changes is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimConfidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Native,
    Erc20,
    Erc721,
    Erc1155,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    In,
    Out,
}

/// A single balance movement observed during simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetChange {
    pub asset_type: AssetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<U256>,
    pub amount: U256,
    pub direction: ChangeDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

/// Which approval standard a simulated approval delta belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStandard {
    Erc20,
    Permit2,
    Erc721,
    Erc1155,
}

/// A single approval/allowance movement observed during simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalChange {
    pub standard: ApprovalStandard,
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_amount: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_spender: Option<Address>,
    /// `"token"` for single-token approvals, `"all"` for operator grants.
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceChanges {
    pub changes: Vec<AssetChange>,
    pub confidence: SimConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalChanges {
    pub changes: Vec<ApprovalChange>,
    pub confidence: SimConfidence,
}

/// Outcome of simulating the candidate transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_diff: Option<I256>,
    pub balances: BalanceChanges,
    pub approvals: ApprovalChanges,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

impl SimulationResult {
    /// An empty successful simulation; the heuristic backend starts here.
    pub fn empty() -> Self {
        SimulationResult {
            success: true,
            revert_reason: None,
            native_diff: None,
            balances: BalanceChanges {
                changes: Vec::new(),
                confidence: SimConfidence::High,
            },
            approvals: ApprovalChanges {
                changes: Vec::new(),
                confidence: SimConfidence::High,
            },
            notes: Vec::new(),
        }
    }

    /// True when either change set is below full coverage.
    pub fn coverage_incomplete(&self) -> bool {
        self.balances.confidence < SimConfidence::High
            || self.approvals.confidence < SimConfidence::High
    }
}
