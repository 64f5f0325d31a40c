//! The candidate-transaction input shape.
//!
//! A [`CalldataInput`] is what every surface (CLI, proxy, Safe ingest)
//! produces before handing work to the decoder and analyzer. `to` and
//! `data` are validated at construction; nothing downstream re-checks hex.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::chain::Chain;

/// A single EIP-7702 authorization tuple carried by wallet payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub address: Address,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub chain_id: U256,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub nonce: U256,
}

/// An unsigned candidate transaction, normalized from any input surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalldataInput {
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub data: Bytes,
    #[serde(serialize_with = "serialize_decimal")]
    pub value: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain: Option<Chain>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub authorization_list: Vec<Authorization>,
}

impl CalldataInput {
    /// A bare-address scan target: empty data, zero value.
    pub fn address_only(to: Address, chain: Option<Chain>) -> Self {
        CalldataInput {
            to,
            from: None,
            data: Bytes::new(),
            value: U256::ZERO,
            chain,
            authorization_list: Vec::new(),
        }
    }

    /// True when the payload carries no calldata (`"0x"`).
    pub fn is_empty_data(&self) -> bool {
        self.data.is_empty()
    }

    /// The 4-byte selector, when the payload is long enough to carry one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        if self.data.len() < 4 {
            return None;
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&self.data[..4]);
        Some(selector)
    }
}

/// Error returned for integer strings that are neither decimal nor 0x-hex.
#[derive(Debug, thiserror::Error)]
#[error("Invalid quantity {0:?}")]
pub struct QuantityParseError(pub String);

/// Parses a JSON-RPC quantity: `"0x1b"`, `"27"`, or a bare number.
///
/// Accepts arbitrary-precision values up to 256 bits, per the wire format
/// used by `value` and `chainId` fields.
pub fn parse_quantity(s: &str) -> Result<U256, QuantityParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(QuantityParseError(s.to_string()));
    }
    let parsed = if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        // "0x" alone is a valid zero quantity in the wild.
        if hex_part.is_empty() {
            Ok(U256::ZERO)
        } else {
            U256::from_str_radix(hex_part, 16).map_err(|_| QuantityParseError(s.to_string()))
        }
    } else {
        U256::from_str(s).map_err(|_| QuantityParseError(s.to_string()))
    };
    parsed
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => parse_quantity(&s).map_err(D::Error::custom),
        serde_json::Value::Number(n) => {
            let s = n.to_string();
            parse_quantity(&s).map_err(D::Error::custom)
        }
        other => Err(D::Error::custom(format!("expected quantity, got {other}"))),
    }
}

fn serialize_decimal<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_parse_quantity_decimal() {
        assert_eq!(parse_quantity("42").unwrap(), U256::from(42));
        assert_eq!(parse_quantity("0").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_quantity_hex() {
        assert_eq!(parse_quantity("0x2a").unwrap(), U256::from(42));
        assert_eq!(parse_quantity("0x").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_quantity_max_uint256() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_quantity(max).unwrap(), U256::MAX);
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("0xzz").is_err());
        assert!(parse_quantity("ten").is_err());
    }

    #[test]
    fn test_selector_extraction() {
        let input = CalldataInput {
            to: address!("0000000000000000000000000000000000000001"),
            from: None,
            data: Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3, 0x00]),
            value: U256::ZERO,
            chain: None,
            authorization_list: Vec::new(),
        };
        assert_eq!(input.selector(), Some([0x09, 0x5e, 0xa7, 0xb3]));

        let short = CalldataInput::address_only(input.to, None);
        assert_eq!(short.selector(), None);
        assert!(short.is_empty_data());
    }

    #[test]
    fn test_authorization_deserialize() {
        let auth: Authorization = serde_json::from_str(
            r#"{"address":"0x0000000000000000000000000000000000000002","chainId":"0x1","nonce":"7"}"#,
        )
        .unwrap();
        assert_eq!(auth.chain_id, U256::from(1));
        assert_eq!(auth.nonce, U256::from(7));
    }
}
