//! Stage A: the built-in ABI of token functions every wallet sees daily.
//!
//! Matching here is what sets the `standard` tag (`erc20` / `eip2612`)
//! that later drives the unlimited-approval finding.

use alloy_dyn_abi::JsonAbiExt;
use alloy_json_abi::Function;
use alloy_primitives::Selector;
use std::collections::HashMap;
use std::sync::LazyLock;
use txshield_types::{Args, CallStandard, DecodeSource, DecodedCall};

use crate::value;

struct KnownFunction {
    signature: &'static str,
    arg_names: &'static [&'static str],
    standard: Option<CallStandard>,
}

static KNOWN_FUNCTIONS: &[KnownFunction] = &[
    KnownFunction {
        signature: "approve(address,uint256)",
        arg_names: &["spender", "amount"],
        standard: Some(CallStandard::Erc20),
    },
    KnownFunction {
        signature: "transfer(address,uint256)",
        arg_names: &["to", "amount"],
        standard: Some(CallStandard::Erc20),
    },
    KnownFunction {
        signature: "transferFrom(address,address,uint256)",
        arg_names: &["from", "to", "amount"],
        standard: Some(CallStandard::Erc20),
    },
    KnownFunction {
        signature: "permit(address,address,uint256,uint256,uint8,bytes32,bytes32)",
        arg_names: &["owner", "spender", "value", "deadline", "v", "r", "s"],
        standard: Some(CallStandard::Eip2612),
    },
    // Wrapped native token entry points.
    KnownFunction {
        signature: "deposit()",
        arg_names: &[],
        standard: None,
    },
    KnownFunction {
        signature: "withdraw(uint256)",
        arg_names: &["amount"],
        standard: None,
    },
];

static KNOWN_TABLE: LazyLock<HashMap<Selector, (Function, &'static KnownFunction)>> =
    LazyLock::new(|| {
        KNOWN_FUNCTIONS
            .iter()
            .filter_map(|entry| {
                let function = Function::parse(entry.signature).ok()?;
                Some((function.selector(), (function, entry)))
            })
            .collect()
    });

/// Decodes `data` against the built-in ABI, or `None` when the selector is
/// not one of ours or the arguments do not fit the signature.
pub fn decode_known(data: &[u8]) -> Option<DecodedCall> {
    if data.len() < 4 {
        return None;
    }
    let selector = Selector::from_slice(&data[..4]);
    let (function, entry) = KNOWN_TABLE.get(&selector)?;
    decode_with_function(function, entry.arg_names, data, DecodeSource::KnownAbi, entry.standard)
}

/// Shared decode helper: runs the dynamic decoder over `data[4..]` and
/// assembles a [`DecodedCall`] with named args when names are supplied.
pub(crate) fn decode_with_function(
    function: &Function,
    arg_names: &[&str],
    data: &[u8],
    source: DecodeSource,
    standard: Option<CallStandard>,
) -> Option<DecodedCall> {
    let decoded = function.abi_decode_input(&data[4..]).ok()?;
    Some(build_from_values(function, arg_names, decoded, source, standard))
}

/// Assembles a [`DecodedCall`] from already-decoded values. The nested
/// sub-decoders use this after pulling raw parts out of the value list.
pub(crate) fn build_from_values(
    function: &Function,
    arg_names: &[&str],
    decoded: Vec<alloy_dyn_abi::DynSolValue>,
    source: DecodeSource,
    standard: Option<CallStandard>,
) -> DecodedCall {
    let values: Vec<txshield_types::Value> = decoded.into_iter().map(value::from_dyn).collect();
    let arg_types: Vec<String> = function
        .inputs
        .iter()
        .map(|param| param.selector_type().into_owned())
        .collect();

    let (args, arg_names) = if arg_names.len() == values.len() {
        let names: Vec<String> = arg_names.iter().map(|n| n.to_string()).collect();
        let pairs = names.iter().cloned().zip(values).collect();
        (Args::Named(pairs), names)
    } else {
        (Args::Positional(values), Vec::new())
    };

    DecodedCall {
        selector: function.selector(),
        signature: function.signature(),
        function_name: function.name.clone(),
        source,
        standard,
        args,
        arg_names,
        arg_types,
        alternates: Vec::new(),
        inner_calls: Vec::new(),
        commands: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address, hex};
    use txshield_types::Value;

    fn approve_calldata(spender_suffix: u8, amount: U256) -> Vec<u8> {
        let mut data = hex::decode("095ea7b3").unwrap();
        let mut spender = [0u8; 32];
        spender[31] = spender_suffix;
        data.extend_from_slice(&spender);
        data.extend_from_slice(&amount.to_be_bytes::<32>());
        data
    }

    #[test]
    fn test_decode_unlimited_approve() {
        let data = approve_calldata(0x01, U256::MAX);
        let call = decode_known(&data).unwrap();
        assert_eq!(call.function_name, "approve");
        assert_eq!(call.signature, "approve(address,uint256)");
        assert_eq!(call.source, DecodeSource::KnownAbi);
        assert_eq!(call.standard, Some(CallStandard::Erc20));
        assert_eq!(
            call.arg("spender", 0).and_then(Value::as_address),
            Some(address!("0000000000000000000000000000000000000001"))
        );
        assert_eq!(call.arg("amount", 1).and_then(Value::as_uint), Some(U256::MAX));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = approve_calldata(0x42, U256::from(1000));
        let first = decode_known(&data).unwrap();
        let second = decode_known(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_selector_returns_none() {
        let data = hex::decode("deadbeef").unwrap();
        assert!(decode_known(&data).is_none());
    }

    #[test]
    fn test_truncated_args_return_none() {
        // approve selector with only half an address worth of data
        let mut data = hex::decode("095ea7b3").unwrap();
        data.extend_from_slice(&[0u8; 16]);
        assert!(decode_known(&data).is_none());
    }

    #[test]
    fn test_weth_deposit_has_no_standard() {
        let data = hex::decode("d0e30db0").unwrap(); // deposit()
        let call = decode_known(&data).unwrap();
        assert_eq!(call.function_name, "deposit");
        assert_eq!(call.standard, None);
        assert!(call.args.is_empty());
    }
}
