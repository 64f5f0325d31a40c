//! Turning intercepted RPC params into a [`CalldataInput`].
//!
//! `eth_sendTransaction` carries a transaction object; the fields are
//! coerced with the same quantity rules wallets use (`0x` quantities or
//! decimal strings). `eth_sendRawTransaction` carries a signed envelope:
//! it is RLP-decoded and the sender recovered from the signature.

use alloy_consensus::TxEnvelope;
use alloy_consensus::transaction::SignerRecoverable;
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, Bytes, U256};
use serde_json::Value as JsonValue;
use txshield_types::{Chain, CalldataInput, parse_quantity};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("transaction object must have a `to` address")]
    MissingTo,
    #[error("invalid `{field}` field: {reason}")]
    BadField { field: &'static str, reason: String },
    #[error("raw transaction is not valid hex")]
    BadHex,
    #[error("raw transaction failed to decode: {0}")]
    BadEnvelope(String),
    #[error("contract creation transactions are not scanned")]
    ContractCreation,
}

/// Coerces `params[0]` of an `eth_sendTransaction` into a scan input.
pub fn from_transaction_object(params: &JsonValue) -> Result<CalldataInput, ExtractError> {
    let to = field_str(params, "to")
        .ok_or(ExtractError::MissingTo)?
        .parse::<Address>()
        .map_err(|e| ExtractError::BadField {
            field: "to",
            reason: e.to_string(),
        })?;
    let from = match field_str(params, "from") {
        Some(from) => Some(from.parse::<Address>().map_err(|e| ExtractError::BadField {
            field: "from",
            reason: e.to_string(),
        })?),
        None => None,
    };
    let data = match field_str(params, "data").or_else(|| field_str(params, "input")) {
        Some(data) => parse_hex_data(data).ok_or(ExtractError::BadField {
            field: "data",
            reason: "not valid hex".to_string(),
        })?,
        None => Bytes::new(),
    };
    let value = match params.get("value") {
        Some(value) => parse_value_field(value).map_err(|reason| ExtractError::BadField {
            field: "value",
            reason,
        })?,
        None => U256::ZERO,
    };
    let chain = params
        .get("chainId")
        .and_then(parse_chain_field)
        .transpose()
        .map_err(|reason| ExtractError::BadField {
            field: "chainId",
            reason,
        })?;
    let authorization_list = params
        .get("authorizationList")
        .and_then(|list| serde_json::from_value(list.clone()).ok())
        .unwrap_or_default();

    Ok(CalldataInput {
        to,
        from,
        data,
        value,
        chain,
        authorization_list,
    })
}

/// Decodes a signed raw transaction and recovers the sender.
pub fn from_raw_transaction(raw: &str) -> Result<CalldataInput, ExtractError> {
    let stripped = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(stripped).map_err(|_| ExtractError::BadHex)?;
    let envelope = TxEnvelope::decode_2718(&mut bytes.as_slice())
        .map_err(|e| ExtractError::BadEnvelope(e.to_string()))?;

    use alloy_consensus::Transaction;
    let to = envelope.to().ok_or(ExtractError::ContractCreation)?;
    // An unrecoverable signature still yields a scannable payload; the
    // sender just stays unknown.
    let from = envelope.recover_signer().ok();

    Ok(CalldataInput {
        to,
        from,
        data: envelope.input().clone(),
        value: envelope.value(),
        chain: envelope.chain_id().and_then(Chain::from_id),
        authorization_list: Vec::new(),
    })
}

fn field_str<'a>(params: &'a JsonValue, field: &str) -> Option<&'a str> {
    params.get(field).and_then(JsonValue::as_str)
}

fn parse_hex_data(data: &str) -> Option<Bytes> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    if stripped.is_empty() {
        return Some(Bytes::new());
    }
    hex::decode(stripped).ok().map(Bytes::from)
}

fn parse_value_field(value: &JsonValue) -> Result<U256, String> {
    match value {
        JsonValue::String(s) => parse_quantity(s).map_err(|e| e.to_string()),
        JsonValue::Number(n) => parse_quantity(&n.to_string()).map_err(|e| e.to_string()),
        other => Err(format!("expected quantity, got {other}")),
    }
}

fn parse_chain_field(value: &JsonValue) -> Option<Result<Chain, String>> {
    let id = match value {
        JsonValue::String(s) => match parse_quantity(s) {
            Ok(quantity) => quantity.try_into().ok()?,
            Err(e) => return Some(Err(e.to_string())),
        },
        JsonValue::Number(n) => n.as_u64()?,
        _ => return Some(Err("expected chain id".to_string())),
    };
    match Chain::from_id(id) {
        Some(chain) => Some(Ok(chain)),
        None => Some(Err(format!("unsupported chain id {id}"))),
    }
}
