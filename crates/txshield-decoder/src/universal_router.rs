//! Universal Router command-plan decoding.
//!
//! The router's `execute(bytes,bytes[])` packs a plan as one opcode byte
//! per step plus a parallel array of ABI-encoded inputs. The low 6 bits of
//! each byte are the command id; the top bit marks the step as
//! allowed-to-revert. Input payloads are interpreted per-opcode to pull out
//! the fields a human reviewing the transaction cares about.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use serde_json::{Map, Value as JsonValue, json};
use txshield_types::RouterCommand;

const COMMAND_MASK: u8 = 0x3f;
const ALLOW_REVERT_FLAG: u8 = 0x80;

/// The fixed command-id label table.
fn command_label(id: u8) -> Option<&'static str> {
    Some(match id {
        0x00 => "V3_SWAP_EXACT_IN",
        0x01 => "V3_SWAP_EXACT_OUT",
        0x02 => "PERMIT2_TRANSFER_FROM",
        0x03 => "PERMIT2_PERMIT_BATCH",
        0x04 => "SWEEP",
        0x05 => "TRANSFER",
        0x06 => "PAY_PORTION",
        0x08 => "V2_SWAP_EXACT_IN",
        0x09 => "V2_SWAP_EXACT_OUT",
        0x0a => "PERMIT2_PERMIT",
        0x0b => "WRAP_ETH",
        0x0c => "UNWRAP_WETH",
        0x0d => "PERMIT2_TRANSFER_FROM_BATCH",
        0x0e => "BALANCE_CHECK_ERC20",
        0x10 => "V4_SWAP",
        0x11 => "V3_POSITION_MANAGER_PERMIT",
        0x12 => "V3_POSITION_MANAGER_CALL",
        0x13 => "V4_INITIALIZE_POOL",
        0x14 => "V4_POSITION_MANAGER_CALL",
        0x21 => "EXECUTE_SUB_PLAN",
        _ => return None,
    })
}

/// Decodes a commands byte stream plus its parallel inputs array into an
/// ordered step list. Always returns one entry per command byte; steps
/// whose inputs fail to decode simply carry no details.
pub fn decode_plan(commands: &[u8], inputs: &[&[u8]]) -> Vec<RouterCommand> {
    commands
        .iter()
        .enumerate()
        .map(|(index, &byte)| {
            let opcode = byte & COMMAND_MASK;
            let command = command_label(opcode)
                .map(str::to_string)
                .unwrap_or_else(|| format!("COMMAND_0x{opcode:02x}"));
            let details = inputs
                .get(index)
                .map(|input| decode_details(opcode, input))
                .unwrap_or_default();
            RouterCommand {
                index,
                opcode,
                command,
                allow_revert: byte & ALLOW_REVERT_FLAG != 0,
                details,
            }
        })
        .collect()
}

fn decode_details(opcode: u8, input: &[u8]) -> Map<String, JsonValue> {
    match opcode {
        // V3 swaps: (recipient, amount, amountLimit, path, payerIsUser)
        0x00 | 0x01 => decode_v3_swap(opcode, input),
        // Permit2 single transfer: (token, recipient, amount)
        0x02 => decode_token_recipient_amount(input, "amount"),
        0x04 => decode_token_recipient_amount(input, "amountMin"),
        0x05 => decode_token_recipient_amount(input, "value"),
        0x06 => decode_token_recipient_amount(input, "bips"),
        // V2 swaps: (recipient, amount, amountLimit, address[] path, payerIsUser)
        0x08 | 0x09 => decode_v2_swap(opcode, input),
        // (recipient, amount)
        0x0b => decode_recipient_amount(input, "amount"),
        0x0c => decode_recipient_amount(input, "amountMin"),
        _ => Map::new(),
    }
}

fn tuple(types: &[DynSolType]) -> DynSolType {
    DynSolType::Tuple(types.to_vec())
}

fn decode_sequence(schema: DynSolType, input: &[u8]) -> Option<Vec<DynSolValue>> {
    match schema.abi_decode_sequence(input).ok()? {
        DynSolValue::Tuple(values) => Some(values),
        _ => None,
    }
}

fn address_json(addr: Address) -> JsonValue {
    json!(format!("{addr:#x}"))
}

fn decode_v3_swap(opcode: u8, input: &[u8]) -> Map<String, JsonValue> {
    let schema = tuple(&[
        DynSolType::Address,
        DynSolType::Uint(256),
        DynSolType::Uint(256),
        DynSolType::Bytes,
        DynSolType::Bool,
    ]);
    let Some(values) = decode_sequence(schema, input) else {
        return Map::new();
    };
    let mut details = Map::new();
    if let Some(DynSolValue::Address(recipient)) = values.first() {
        details.insert("recipient".into(), address_json(*recipient));
    }
    let (amount_key, limit_key) = if opcode == 0x00 {
        ("amountIn", "amountOutMin")
    } else {
        ("amountOut", "amountInMax")
    };
    if let Some(DynSolValue::Uint(amount, _)) = values.get(1) {
        details.insert(amount_key.into(), json!(amount.to_string()));
    }
    if let Some(DynSolValue::Uint(limit, _)) = values.get(2) {
        details.insert(limit_key.into(), json!(limit.to_string()));
    }
    if let Some(DynSolValue::Bytes(path)) = values.get(3) {
        // exactInput paths run tokenIn -> tokenOut; exactOutput paths are
        // encoded in reverse.
        if let Some((head, tail)) = path_endpoints(path) {
            let (token_in, token_out) = if opcode == 0x00 { (head, tail) } else { (tail, head) };
            details.insert("tokenIn".into(), address_json(token_in));
            details.insert("tokenOut".into(), address_json(token_out));
        }
    }
    if let Some(DynSolValue::Bool(payer_is_user)) = values.get(4) {
        details.insert("payerIsUser".into(), json!(payer_is_user));
    }
    details
}

fn decode_v2_swap(opcode: u8, input: &[u8]) -> Map<String, JsonValue> {
    let schema = tuple(&[
        DynSolType::Address,
        DynSolType::Uint(256),
        DynSolType::Uint(256),
        DynSolType::Array(Box::new(DynSolType::Address)),
        DynSolType::Bool,
    ]);
    let Some(values) = decode_sequence(schema, input) else {
        return Map::new();
    };
    let mut details = Map::new();
    if let Some(DynSolValue::Address(recipient)) = values.first() {
        details.insert("recipient".into(), address_json(*recipient));
    }
    let (amount_key, limit_key) = if opcode == 0x08 {
        ("amountIn", "amountOutMin")
    } else {
        ("amountOut", "amountInMax")
    };
    if let Some(DynSolValue::Uint(amount, _)) = values.get(1) {
        details.insert(amount_key.into(), json!(amount.to_string()));
    }
    if let Some(DynSolValue::Uint(limit, _)) = values.get(2) {
        details.insert(limit_key.into(), json!(limit.to_string()));
    }
    if let Some(DynSolValue::Array(path)) = values.get(3) {
        let first = path.first().and_then(DynSolValue::as_address);
        let last = path.last().and_then(DynSolValue::as_address);
        if let (Some(token_in), Some(token_out)) = (first, last) {
            details.insert("tokenIn".into(), address_json(token_in));
            details.insert("tokenOut".into(), address_json(token_out));
        }
    }
    if let Some(DynSolValue::Bool(payer_is_user)) = values.get(4) {
        details.insert("payerIsUser".into(), json!(payer_is_user));
    }
    details
}

fn decode_token_recipient_amount(input: &[u8], amount_key: &str) -> Map<String, JsonValue> {
    let schema = tuple(&[DynSolType::Address, DynSolType::Address, DynSolType::Uint(256)]);
    let Some(values) = decode_sequence(schema, input) else {
        return Map::new();
    };
    let mut details = Map::new();
    if let Some(DynSolValue::Address(token)) = values.first() {
        details.insert("token".into(), address_json(*token));
    }
    if let Some(DynSolValue::Address(recipient)) = values.get(1) {
        details.insert("recipient".into(), address_json(*recipient));
    }
    if let Some(DynSolValue::Uint(amount, _)) = values.get(2) {
        details.insert(amount_key.into(), json!(amount.to_string()));
    }
    details
}

fn decode_recipient_amount(input: &[u8], amount_key: &str) -> Map<String, JsonValue> {
    let schema = tuple(&[DynSolType::Address, DynSolType::Uint(256)]);
    let Some(values) = decode_sequence(schema, input) else {
        return Map::new();
    };
    let mut details = Map::new();
    if let Some(DynSolValue::Address(recipient)) = values.first() {
        details.insert("recipient".into(), address_json(*recipient));
    }
    if let Some(DynSolValue::Uint(amount, _)) = values.get(1) {
        details.insert(amount_key.into(), json!(amount.to_string()));
    }
    details
}

/// First and last 20 bytes of a V3 path encoding.
fn path_endpoints(path: &[u8]) -> Option<(Address, Address)> {
    if path.len() < 20 {
        return None;
    }
    let head = Address::from_slice(&path[..20]);
    let tail = Address::from_slice(&path[path.len() - 20..]);
    Some((head, tail))
}
