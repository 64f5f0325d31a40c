//! Coercion of every accepted `--calldata` shape into a [`CalldataInput`].
//!
//! Accepted forms:
//! - raw hex (`0x...`), combined with `--to`
//! - canonical JSON: `{to, data, chain, value, from}`
//! - wallet JSON: `{chainId, from, to, value, data, authorizationList?}`
//! - a JSON-RPC request: `{method, params: [{...}]}`
//! - `@file` to read any of the above from disk
//! - `-` to read from stdin

use alloy_primitives::{Address, Bytes};
use serde_json::Value as JsonValue;
use std::io::Read;
use txshield_proxy::extract;
use txshield_types::{CalldataInput, Chain, parse_quantity};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("raw hex calldata requires --to")]
    HexWithoutTo,
    #[error("invalid address {0:?}")]
    BadAddress(String),
    #[error("invalid hex payload")]
    BadHex,
    #[error("invalid value: {0}")]
    BadValue(String),
    #[error("unrecognized calldata payload: {0}")]
    Unrecognized(String),
}

/// Extra flag-supplied fields that override or complete the payload.
#[derive(Debug, Default)]
pub struct InputOverrides {
    pub to: Option<String>,
    pub from: Option<String>,
    pub value: Option<String>,
    pub chain: Option<Chain>,
}

/// Parses a `--calldata` payload (after any `@file`/`-` indirection).
pub fn parse_calldata(
    payload: &str,
    overrides: &InputOverrides,
) -> Result<CalldataInput, InputError> {
    let resolved = resolve_indirection(payload)?;
    let trimmed = resolved.trim();

    let mut input = if looks_like_hex(trimmed) {
        let to = overrides
            .to
            .as_deref()
            .ok_or(InputError::HexWithoutTo)?
            .parse::<Address>()
            .map_err(|_| InputError::BadAddress(overrides.to.clone().unwrap_or_default()))?;
        let data = decode_hex(trimmed)?;
        CalldataInput {
            to,
            from: None,
            data,
            value: alloy_primitives::U256::ZERO,
            chain: None,
            authorization_list: Vec::new(),
        }
    } else {
        parse_json_payload(trimmed)?
    };

    apply_overrides(&mut input, overrides)?;
    Ok(input)
}

/// Builds an input purely from flags (`--to --data --value --from`).
pub fn from_flags(data: Option<&str>, overrides: &InputOverrides) -> Result<CalldataInput, InputError> {
    let to = overrides
        .to
        .as_deref()
        .ok_or(InputError::HexWithoutTo)?
        .parse::<Address>()
        .map_err(|_| InputError::BadAddress(overrides.to.clone().unwrap_or_default()))?;
    let data = match data {
        Some(data) => decode_hex(data.trim())?,
        None => Bytes::new(),
    };
    let mut input = CalldataInput {
        to,
        from: None,
        data,
        value: alloy_primitives::U256::ZERO,
        chain: None,
        authorization_list: Vec::new(),
    };
    apply_overrides(&mut input, overrides)?;
    Ok(input)
}

fn resolve_indirection(payload: &str) -> Result<String, InputError> {
    if payload == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| InputError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(buffer);
    }
    if let Some(path) = payload.strip_prefix('@') {
        return std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_string(),
            source,
        });
    }
    Ok(payload.to_string())
}

fn parse_json_payload(payload: &str) -> Result<CalldataInput, InputError> {
    let value: JsonValue = serde_json::from_str(payload)
        .map_err(|e| InputError::Unrecognized(e.to_string()))?;

    // A JSON-RPC request wraps the transaction object in params[0].
    let tx_object = if value.get("method").is_some() {
        value
            .get("params")
            .and_then(JsonValue::as_array)
            .and_then(|params| params.first())
            .cloned()
            .ok_or_else(|| InputError::Unrecognized("JSON-RPC request has no params".to_string()))?
    } else {
        value
    };

    let mut input = extract::from_transaction_object(&tx_object)
        .map_err(|e| InputError::Unrecognized(e.to_string()))?;

    // The canonical shape names the chain instead of numbering it.
    if input.chain.is_none() {
        input.chain = tx_object
            .get("chain")
            .and_then(JsonValue::as_str)
            .and_then(|name| name.parse().ok());
    }
    Ok(input)
}

fn apply_overrides(
    input: &mut CalldataInput,
    overrides: &InputOverrides,
) -> Result<(), InputError> {
    if let Some(from) = overrides.from.as_deref() {
        input.from = Some(
            from.parse()
                .map_err(|_| InputError::BadAddress(from.to_string()))?,
        );
    }
    if let Some(value) = overrides.value.as_deref() {
        input.value = parse_quantity(value).map_err(|e| InputError::BadValue(e.to_string()))?;
    }
    if overrides.chain.is_some() {
        input.chain = input.chain.or(overrides.chain);
    }
    Ok(())
}

fn looks_like_hex(payload: &str) -> bool {
    payload
        .strip_prefix("0x")
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_hexdigit()))
}

fn decode_hex(payload: &str) -> Result<Bytes, InputError> {
    let stripped = payload.strip_prefix("0x").unwrap_or(payload);
    if stripped.is_empty() {
        return Ok(Bytes::new());
    }
    hex::decode(stripped).map(Bytes::from).map_err(|_| InputError::BadHex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};

    fn overrides_to(to: &str) -> InputOverrides {
        InputOverrides {
            to: Some(to.to_string()),
            ..InputOverrides::default()
        }
    }

    #[test]
    fn test_raw_hex_with_to() {
        let input = parse_calldata(
            "0x095ea7b3",
            &overrides_to("0x00000000000000000000000000000000000000aa"),
        )
        .unwrap();
        assert_eq!(input.data.len(), 4);
        assert_eq!(input.to, address!("00000000000000000000000000000000000000aa"));
    }

    #[test]
    fn test_raw_hex_without_to_fails() {
        assert!(matches!(
            parse_calldata("0x095ea7b3", &InputOverrides::default()),
            Err(InputError::HexWithoutTo)
        ));
    }

    #[test]
    fn test_canonical_json() {
        let payload = r#"{
            "to": "0x00000000000000000000000000000000000000bb",
            "data": "0xa9059cbb",
            "chain": "base",
            "value": "1000"
        }"#;
        let input = parse_calldata(payload, &InputOverrides::default()).unwrap();
        assert_eq!(input.chain, Some(Chain::Base));
        assert_eq!(input.value, U256::from(1000u64));
    }

    #[test]
    fn test_wallet_shaped_json() {
        let payload = r#"{
            "chainId": "0x1",
            "from": "0x00000000000000000000000000000000000000cc",
            "to": "0x00000000000000000000000000000000000000dd",
            "value": "0x0",
            "data": "0x"
        }"#;
        let input = parse_calldata(payload, &InputOverrides::default()).unwrap();
        assert_eq!(input.chain, Some(Chain::Ethereum));
        assert!(input.is_empty_data());
        assert!(input.from.is_some());
    }

    #[test]
    fn test_json_rpc_request() {
        let payload = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_sendTransaction",
            "params": [{"to": "0x00000000000000000000000000000000000000ee", "data": "0x12345678"}]
        }"#;
        let input = parse_calldata(payload, &InputOverrides::default()).unwrap();
        assert_eq!(input.to, address!("00000000000000000000000000000000000000ee"));
        assert_eq!(input.data.len(), 4);
    }

    #[test]
    fn test_file_indirection() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "0xdeadbeef").unwrap();
        let payload = format!("@{}", tmp.path().display());
        let input = parse_calldata(
            &payload,
            &overrides_to("0x00000000000000000000000000000000000000aa"),
        )
        .unwrap();
        assert_eq!(input.data.len(), 4);
    }

    #[test]
    fn test_overrides_apply() {
        let overrides = InputOverrides {
            to: Some("0x00000000000000000000000000000000000000aa".to_string()),
            from: Some("0x00000000000000000000000000000000000000ab".to_string()),
            value: Some("42".to_string()),
            chain: Some(Chain::Polygon),
        };
        let input = parse_calldata("0x", &overrides).unwrap();
        assert_eq!(input.value, U256::from(42u64));
        assert_eq!(input.chain, Some(Chain::Polygon));
        assert!(input.from.is_some());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_calldata("not hex not json", &InputOverrides::default()).is_err());
    }
}
