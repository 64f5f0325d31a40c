//! The simulator seam and the in-process heuristic backend.
//!
//! A real fork-backed simulator lives outside this crate; the analyzer
//! only consumes the [`SimulationResult`] shape. The heuristic backend
//! approximates deltas straight from the decoded call so that offline
//! scans still show what a transaction is about to move.

use alloy_primitives::U256;
use async_trait::async_trait;
use txshield_types::{
    ApprovalChange, ApprovalStandard, AssetChange, AssetType, CalldataInput, CallStandard,
    ChangeDirection, DecodedCall, SimConfidence, SimulationResult, Value,
};

#[async_trait]
pub trait Simulator: Send + Sync {
    /// Simulates the candidate transaction. `None` means the backend could
    /// not run at all (as opposed to a simulation that reverted).
    async fn simulate(
        &self,
        input: &CalldataInput,
        decoded: Option<&DecodedCall>,
    ) -> Option<SimulationResult>;
}

/// Decode-derived approximation of balance and approval deltas.
///
/// It cannot observe reverts or side effects of unknown calls, so balance
/// coverage is reported as medium whenever the call moves anything beyond
/// plain native value.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSimulator;

#[async_trait]
impl Simulator for HeuristicSimulator {
    async fn simulate(
        &self,
        input: &CalldataInput,
        decoded: Option<&DecodedCall>,
    ) -> Option<SimulationResult> {
        let mut result = SimulationResult::empty();
        result.notes.push("heuristic backend: derived from decoded calldata, not a fork".to_string());

        if input.value > U256::ZERO {
            result.balances.changes.push(AssetChange {
                asset_type: AssetType::Native,
                address: None,
                token_id: None,
                amount: input.value,
                direction: ChangeDirection::Out,
                symbol: Some(
                    input
                        .chain
                        .map(|c| c.native_symbol().to_string())
                        .unwrap_or_else(|| "ETH".to_string()),
                ),
                decimals: Some(18),
            });
        }

        let Some(call) = decoded else {
            if !input.is_empty_data() {
                result.balances.confidence = SimConfidence::Low;
                result.approvals.confidence = SimConfidence::Low;
            }
            return Some(result);
        };

        let owner = input.from.unwrap_or_default();
        match (call.standard, call.function_name.as_str()) {
            (Some(CallStandard::Erc20), "approve") => {
                if let (Some(spender), Some(amount)) = (
                    call.arg("spender", 0).and_then(Value::as_address),
                    call.arg("amount", 1).and_then(Value::as_uint),
                ) {
                    result.approvals.changes.push(ApprovalChange {
                        standard: ApprovalStandard::Erc20,
                        token: input.to,
                        owner,
                        spender,
                        amount: Some(amount),
                        previous_amount: None,
                        token_id: None,
                        previous_spender: None,
                        scope: "token".to_string(),
                        approved: None,
                        previous_approved: None,
                        symbol: None,
                        decimals: None,
                    });
                }
            }
            (Some(CallStandard::Eip2612), "permit") => {
                if let (Some(spender), Some(value)) = (
                    call.arg("spender", 1).and_then(Value::as_address),
                    call.arg("value", 2).and_then(Value::as_uint),
                ) {
                    result.approvals.changes.push(ApprovalChange {
                        standard: ApprovalStandard::Erc20,
                        token: input.to,
                        owner: call
                            .arg("owner", 0)
                            .and_then(Value::as_address)
                            .unwrap_or(owner),
                        spender,
                        amount: Some(value),
                        previous_amount: None,
                        token_id: None,
                        previous_spender: None,
                        scope: "token".to_string(),
                        approved: None,
                        previous_approved: None,
                        symbol: None,
                        decimals: None,
                    });
                }
            }
            (Some(CallStandard::Erc20), "transfer") => {
                if let Some(amount) = call.arg("amount", 1).and_then(Value::as_uint) {
                    result.balances.changes.push(AssetChange {
                        asset_type: AssetType::Erc20,
                        address: Some(input.to),
                        token_id: None,
                        amount,
                        direction: ChangeDirection::Out,
                        symbol: None,
                        decimals: None,
                    });
                }
            }
            (None, "setApprovalForAll") => {
                if let (Some(operator), Some(Value::Bool(approved))) =
                    (call.arg("operator", 0).and_then(Value::as_address), call.arg("approved", 1))
                {
                    result.approvals.changes.push(ApprovalChange {
                        standard: ApprovalStandard::Erc721,
                        token: input.to,
                        owner,
                        spender: operator,
                        amount: None,
                        previous_amount: None,
                        token_id: None,
                        previous_spender: None,
                        scope: "all".to_string(),
                        approved: Some(*approved),
                        previous_approved: None,
                        symbol: None,
                        decimals: None,
                    });
                }
            }
            // Permit2 permit: permitSingle is ((token, amount, expiration, nonce), spender, sigDeadline)
            (None, "permit") => {
                if let Some(Value::List(single)) = call.arg("permitSingle", 1) {
                    let details = single.first().and_then(Value::as_list);
                    let token = details.and_then(|d| d.first()).and_then(Value::as_address);
                    let amount = details.and_then(|d| d.get(1)).and_then(Value::as_uint);
                    let spender = single.get(1).and_then(Value::as_address);
                    if let (Some(token), Some(amount), Some(spender)) = (token, amount, spender) {
                        result.approvals.changes.push(ApprovalChange {
                            standard: ApprovalStandard::Permit2,
                            token,
                            owner: call
                                .arg("owner", 0)
                                .and_then(Value::as_address)
                                .unwrap_or(owner),
                            spender,
                            amount: Some(amount),
                            previous_amount: None,
                            token_id: None,
                            previous_spender: None,
                            scope: "token".to_string(),
                            approved: None,
                            previous_approved: None,
                            symbol: None,
                            decimals: None,
                        });
                    }
                }
            }
            _ => {
                // Unknown effects: the call may move balances we cannot see.
                result.balances.confidence = SimConfidence::Medium;
            }
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};
    use txshield_types::{Args, Chain, DecodeSource};

    fn input(to: Address, value: U256, data: Vec<u8>) -> CalldataInput {
        CalldataInput {
            to,
            from: Some(Address::repeat_byte(0x0f)),
            data: Bytes::from(data),
            value,
            chain: Some(Chain::Ethereum),
            authorization_list: Vec::new(),
        }
    }

    fn approve_call(spender: Address, amount: U256) -> DecodedCall {
        DecodedCall {
            selector: Default::default(),
            signature: "approve(address,uint256)".to_string(),
            function_name: "approve".to_string(),
            source: DecodeSource::KnownAbi,
            standard: Some(CallStandard::Erc20),
            args: Args::Named(vec![
                ("spender".to_string(), Value::Address(spender)),
                ("amount".to_string(), Value::Uint(amount)),
            ]),
            arg_names: vec![],
            arg_types: vec![],
            alternates: vec![],
            inner_calls: vec![],
            commands: vec![],
        }
    }

    #[tokio::test]
    async fn test_approve_produces_approval_delta() {
        let token = Address::repeat_byte(0x01);
        let spender = Address::repeat_byte(0x02);
        let call = approve_call(spender, U256::MAX);
        let result = HeuristicSimulator
            .simulate(&input(token, U256::ZERO, vec![1, 2, 3, 4]), Some(&call))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.approvals.changes.len(), 1);
        let change = &result.approvals.changes[0];
        assert_eq!(change.token, token);
        assert_eq!(change.spender, spender);
        assert_eq!(change.amount, Some(U256::MAX));
        assert_eq!(change.scope, "token");
    }

    #[tokio::test]
    async fn test_native_value_produces_out_delta() {
        let result = HeuristicSimulator
            .simulate(
                &input(Address::repeat_byte(0x03), U256::from(1000u64), vec![]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.balances.changes.len(), 1);
        assert_eq!(result.balances.changes[0].direction, ChangeDirection::Out);
        assert_eq!(result.balances.changes[0].asset_type, AssetType::Native);
    }

    #[tokio::test]
    async fn test_undecoded_calldata_lowers_confidence() {
        let result = HeuristicSimulator
            .simulate(
                &input(Address::repeat_byte(0x04), U256::ZERO, vec![0xde, 0xad, 0xbe, 0xef]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.balances.confidence, SimConfidence::Low);
        assert!(result.coverage_incomplete());
    }
}
