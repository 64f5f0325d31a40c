//! Templated rendering of a decoded call as one English sentence.
//!
//! Templates form a closed list keyed by standard and function name.
//! Three formatters are shared by every template: addresses render
//! lowercased, integers render decimal, and amounts pick up symbol and
//! decimals when the target is a known token. A plain ETH transfer is
//! detected before any template runs. When nothing matches, the canonical
//! signature is the intent.

use alloy_primitives::{Address, U256, address};
use std::collections::HashMap;
use std::sync::LazyLock;
use txshield_types::{CalldataInput, CallStandard, DecodedCall, Value};

struct TokenMeta {
    symbol: &'static str,
    decimals: u8,
}

static KNOWN_TOKENS: LazyLock<HashMap<Address, TokenMeta>> = LazyLock::new(|| {
    HashMap::from([
        (
            address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            TokenMeta { symbol: "USDC", decimals: 6 },
        ),
        (
            address!("dac17f958d2ee523a2206206994597c13d831ec7"),
            TokenMeta { symbol: "USDT", decimals: 6 },
        ),
        (
            address!("6b175474e89094c44da98b954eedeac495271d0f"),
            TokenMeta { symbol: "DAI", decimals: 18 },
        ),
        (
            address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
            TokenMeta { symbol: "WETH", decimals: 18 },
        ),
        // USDC on Base
        (
            address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"),
            TokenMeta { symbol: "USDC", decimals: 6 },
        ),
    ])
});

/// Renders the human-readable intent for a candidate transaction.
pub fn build_intent(input: &CalldataInput, call: Option<&DecodedCall>) -> Option<String> {
    // Plain ETH transfer wins before any template.
    if input.is_empty_data() {
        if input.value > U256::ZERO {
            return Some(format!(
                "Send {} {} to {}",
                format_units(input.value, 18),
                input.chain.map(|c| c.native_symbol()).unwrap_or("ETH"),
                format_address(input.to)
            ));
        }
        return None;
    }

    let call = call?;
    let rendered = match (call.standard, call.function_name.as_str()) {
        (Some(CallStandard::Erc20), "approve") => render_approve(input, call),
        (Some(CallStandard::Erc20), "transfer") => render_transfer(input, call),
        (Some(CallStandard::Erc20), "transferFrom") => render_transfer_from(input, call),
        (Some(CallStandard::Eip2612), "permit") => render_permit(call),
        (None, "safeTransferFrom") => render_nft_transfer(call),
        (None, "setApprovalForAll") => render_approval_for_all(call),
        (None, "supply") => render_aave(call, "Supply", "to"),
        (None, "borrow") => render_aave(call, "Borrow", "from"),
        (None, "repay") => render_aave(call, "Repay", "to"),
        (None, "withdraw") if call.args.len() == 3 => render_aave(call, "Withdraw", "from"),
        (None, name) if name.starts_with("swap") => render_v2_swap(call),
        (None, "exactInputSingle") => render_v3_single(call, true),
        (None, "exactOutputSingle") => render_v3_single(call, false),
        (None, "exactInput") => render_v3_path(call, true),
        (None, "exactOutput") => render_v3_path(call, false),
        (None, "permit") => Some(format!(
            "Grant a Permit2 allowance on behalf of {}",
            call.arg("owner", 0)
                .and_then(Value::as_address)
                .map(format_address)
                .unwrap_or_else(|| "the caller".to_string())
        )),
        (None, "permitTransferFrom") => Some("Transfer tokens via a Permit2 signature".to_string()),
        (None, "execute") if !call.commands.is_empty() => {
            let labels: Vec<&str> = call.commands.iter().map(|c| c.command.as_str()).collect();
            Some(labels.join(" \u{2192} "))
        }
        _ => None,
    };

    Some(rendered.unwrap_or_else(|| call.signature.clone()))
}

fn render_approve(input: &CalldataInput, call: &DecodedCall) -> Option<String> {
    let spender = call.arg("spender", 0).and_then(Value::as_address)?;
    let amount = call.arg("amount", 1).and_then(Value::as_uint)?;
    let rendered_amount = if amount == U256::MAX {
        "unlimited".to_string()
    } else {
        format_token_amount(amount, input.to)
    };
    Some(format!(
        "Approve {} to spend {} {}",
        format_address(spender),
        rendered_amount,
        token_noun(input.to)
    ))
}

fn render_transfer(input: &CalldataInput, call: &DecodedCall) -> Option<String> {
    let to = call.arg("to", 0).and_then(Value::as_address)?;
    let amount = call.arg("amount", 1).and_then(Value::as_uint)?;
    Some(format!(
        "Transfer {} {} to {}",
        format_token_amount(amount, input.to),
        token_noun(input.to),
        format_address(to)
    ))
}

fn render_transfer_from(input: &CalldataInput, call: &DecodedCall) -> Option<String> {
    let from = call.arg("from", 0).and_then(Value::as_address)?;
    let to = call.arg("to", 1).and_then(Value::as_address)?;
    let amount = call.arg("amount", 2).and_then(Value::as_uint)?;
    Some(format!(
        "Transfer {} {} from {} to {}",
        format_token_amount(amount, input.to),
        token_noun(input.to),
        format_address(from),
        format_address(to)
    ))
}

fn render_permit(call: &DecodedCall) -> Option<String> {
    let spender = call.arg("spender", 1).and_then(Value::as_address)?;
    let value = call.arg("value", 2).and_then(Value::as_uint)?;
    let rendered = if value == U256::MAX {
        "unlimited tokens".to_string()
    } else {
        format!("{value} tokens")
    };
    Some(format!(
        "Permit {} to spend {} by signature",
        format_address(spender),
        rendered
    ))
}

fn render_nft_transfer(call: &DecodedCall) -> Option<String> {
    let from = call.arg("from", 0).and_then(Value::as_address)?;
    let to = call.arg("to", 1).and_then(Value::as_address)?;
    let token_id = call.arg("tokenId", 2).and_then(Value::as_uint)?;
    Some(format!(
        "Transfer NFT #{} from {} to {}",
        token_id,
        format_address(from),
        format_address(to)
    ))
}

fn render_approval_for_all(call: &DecodedCall) -> Option<String> {
    let operator = call.arg("operator", 0).and_then(Value::as_address)?;
    let approved = match call.arg("approved", 1) {
        Some(Value::Bool(b)) => *b,
        _ => return None,
    };
    Some(if approved {
        format!(
            "Grant {} approval to manage all tokens in this collection",
            format_address(operator)
        )
    } else {
        format!(
            "Revoke the collection-wide approval of {}",
            format_address(operator)
        )
    })
}

fn render_aave(call: &DecodedCall, verb: &str, preposition: &str) -> Option<String> {
    let asset = call.arg("asset", 0).and_then(Value::as_address)?;
    let amount = call.arg("amount", 1).and_then(Value::as_uint)?;
    Some(format!(
        "{verb} {} of {} {preposition} the lending pool",
        format_token_amount(amount, asset),
        format_address(asset)
    ))
}

fn render_v2_swap(call: &DecodedCall) -> Option<String> {
    let path = call.arg("path", usize::MAX).or_else(|| {
        // path position varies across the six V2 swap variants
        call.args.values().into_iter().find(|v| v.as_list().is_some())
    })?;
    let path = path.as_list()?;
    let token_in = path.first().and_then(Value::as_address)?;
    let token_out = path.last().and_then(Value::as_address)?;
    let uses_eth_in = call.function_name.contains("ETHFor");
    let uses_eth_out = call.function_name.ends_with("ForETH");
    let leg_in = if uses_eth_in { "ETH".to_string() } else { format_address(token_in) };
    let leg_out = if uses_eth_out { "ETH".to_string() } else { format_address(token_out) };
    Some(format!("Swap {leg_in} for {leg_out}"))
}

fn render_v3_single(call: &DecodedCall, exact_in: bool) -> Option<String> {
    let params = call.arg("params", 0).and_then(Value::as_list)?;
    let token_in = params.first().and_then(Value::as_address)?;
    let token_out = params.get(1).and_then(Value::as_address)?;
    let direction = if exact_in { "exact input" } else { "exact output" };
    Some(format!(
        "Swap {} for {} ({direction})",
        format_address(token_in),
        format_address(token_out)
    ))
}

fn render_v3_path(call: &DecodedCall, exact_in: bool) -> Option<String> {
    let params = call.arg("params", 0).and_then(Value::as_list)?;
    let path = params.first().and_then(Value::as_bytes)?;
    if path.len() < 20 {
        return None;
    }
    let head = Address::from_slice(&path[..20]);
    let tail = Address::from_slice(&path[path.len() - 20..]);
    // exactOutput paths are encoded in reverse.
    let (token_in, token_out) = if exact_in { (head, tail) } else { (tail, head) };
    let direction = if exact_in { "exact input" } else { "exact output" };
    Some(format!(
        "Swap {} for {} ({direction})",
        format_address(token_in),
        format_address(token_out)
    ))
}

fn format_address(address: Address) -> String {
    format!("{address:#x}")
}

/// Amount with known-token scaling: `1500000` on USDC renders `1.5 USDC`.
fn format_token_amount(amount: U256, token: Address) -> String {
    match KNOWN_TOKENS.get(&token) {
        Some(meta) => format!("{} {}", format_units(amount, meta.decimals), meta.symbol),
        None => amount.to_string(),
    }
}

fn token_noun(token: Address) -> String {
    match KNOWN_TOKENS.get(&token) {
        Some(meta) => meta.symbol.to_string(),
        None => "tokens".to_string(),
    }
}

/// Scales a raw integer down by `decimals`, trimming trailing zeros.
fn format_units(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let fraction = amount % divisor;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction, width = decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    format!("{whole}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use txshield_types::{Args, Chain, DecodeSource};

    fn input_to(to: Address, value: U256) -> CalldataInput {
        CalldataInput {
            to,
            from: None,
            data: Bytes::from(vec![0x01, 0x02, 0x03, 0x04]),
            value,
            chain: Some(Chain::Ethereum),
            authorization_list: Vec::new(),
        }
    }

    fn call(
        name: &str,
        standard: Option<CallStandard>,
        args: Vec<(&str, Value)>,
    ) -> DecodedCall {
        DecodedCall {
            selector: Default::default(),
            signature: format!("{name}(...)"),
            function_name: name.to_string(),
            source: DecodeSource::KnownAbi,
            standard,
            args: Args::Named(args.into_iter().map(|(n, v)| (n.to_string(), v)).collect()),
            arg_names: Vec::new(),
            arg_types: Vec::new(),
            alternates: Vec::new(),
            inner_calls: Vec::new(),
            commands: Vec::new(),
        }
    }

    #[test]
    fn test_plain_eth_transfer() {
        let mut input = input_to(Address::repeat_byte(0x22), U256::from(1_500_000_000_000_000_000u64));
        input.data = Bytes::new();
        let intent = build_intent(&input, None).unwrap();
        assert_eq!(
            intent,
            format!("Send 1.5 ETH to {}", format_address(Address::repeat_byte(0x22)))
        );
    }

    #[test]
    fn test_unlimited_approve_on_known_token() {
        let usdc = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let spender = Address::repeat_byte(0x33);
        let decoded = call(
            "approve",
            Some(CallStandard::Erc20),
            vec![
                ("spender", Value::Address(spender)),
                ("amount", Value::Uint(U256::MAX)),
            ],
        );
        let intent = build_intent(&input_to(usdc, U256::ZERO), Some(&decoded)).unwrap();
        assert_eq!(
            intent,
            format!("Approve {} to spend unlimited USDC", format_address(spender))
        );
    }

    #[test]
    fn test_transfer_scales_known_decimals() {
        let usdc = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let decoded = call(
            "transfer",
            Some(CallStandard::Erc20),
            vec![
                ("to", Value::Address(Address::repeat_byte(0x44))),
                ("amount", Value::Uint(U256::from(1_500_000u64))),
            ],
        );
        let intent = build_intent(&input_to(usdc, U256::ZERO), Some(&decoded)).unwrap();
        assert!(intent.starts_with("Transfer 1.5 USDC to "));
    }

    #[test]
    fn test_universal_router_arrow_chain() {
        let mut decoded = call("execute", None, vec![]);
        for (index, label) in ["WRAP_ETH", "V4_SWAP", "SWEEP"].iter().enumerate() {
            decoded.commands.push(txshield_types::RouterCommand {
                index,
                opcode: 0,
                command: label.to_string(),
                allow_revert: false,
                details: Default::default(),
            });
        }
        let intent = build_intent(&input_to(Address::repeat_byte(0x55), U256::ZERO), Some(&decoded))
            .unwrap();
        assert_eq!(intent, "WRAP_ETH \u{2192} V4_SWAP \u{2192} SWEEP");
    }

    #[test]
    fn test_fallback_is_signature() {
        let decoded = call("frobnicate", None, vec![]);
        let intent = build_intent(&input_to(Address::repeat_byte(0x66), U256::ZERO), Some(&decoded))
            .unwrap();
        assert_eq!(intent, "frobnicate(...)");
    }

    #[test]
    fn test_set_approval_for_all() {
        let operator = Address::repeat_byte(0x77);
        let decoded = call(
            "setApprovalForAll",
            None,
            vec![
                ("operator", Value::Address(operator)),
                ("approved", Value::Bool(true)),
            ],
        );
        let intent = build_intent(&input_to(Address::repeat_byte(0x88), U256::ZERO), Some(&decoded))
            .unwrap();
        assert!(intent.starts_with("Grant "));
        assert!(intent.contains(&format_address(operator)));
    }

    #[test]
    fn test_format_units_trims_zeros() {
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_units(U256::from(1_230_000u64), 6), "1.23");
        assert_eq!(format_units(U256::from(5u64), 6), "0.000005");
    }
}
