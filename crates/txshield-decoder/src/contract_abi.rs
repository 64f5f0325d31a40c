//! Stage C: decoding against an ABI fetched for the target contract.
//!
//! Argument names come from the ABI when present; missing names are
//! synthesized as `arg0`, `arg1`, ... and duplicates get `_1`, `_2`
//! suffixes so the named map never loses an entry.

use alloy_dyn_abi::JsonAbiExt;
use alloy_json_abi::JsonAbi;
use alloy_primitives::Selector;
use std::collections::HashMap;
use txshield_types::{Args, DecodeSource, DecodedCall};

use crate::value;

/// Decodes `data` against `abi`, or `None` when no function matches or the
/// arguments do not fit.
pub fn decode_contract_abi(abi: &JsonAbi, data: &[u8]) -> Option<DecodedCall> {
    if data.len() < 4 {
        return None;
    }
    let selector = Selector::from_slice(&data[..4]);
    let function = abi
        .functions()
        .find(|function| function.selector() == selector)?;

    let decoded = function.abi_decode_input(&data[4..]).ok()?;
    let values: Vec<txshield_types::Value> = decoded.into_iter().map(value::from_dyn).collect();
    let arg_types: Vec<String> = function
        .inputs
        .iter()
        .map(|param| param.selector_type().into_owned())
        .collect();
    let arg_names = resolve_names(function.inputs.iter().map(|param| param.name.as_str()));

    let pairs = arg_names.iter().cloned().zip(values).collect();
    Some(DecodedCall {
        selector,
        signature: function.signature(),
        function_name: function.name.clone(),
        source: DecodeSource::ContractAbi,
        standard: None,
        args: Args::Named(pairs),
        arg_names,
        arg_types,
        alternates: Vec::new(),
        inner_calls: Vec::new(),
        commands: Vec::new(),
    })
}

/// Fills gaps with `argN` and disambiguates repeats with `_N` suffixes.
fn resolve_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .enumerate()
        .map(|(index, name)| {
            let base = if name.is_empty() {
                format!("arg{index}")
            } else {
                name.to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let resolved = if *count == 0 {
                base.clone()
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            resolved
        })
        .collect()
}
