//! Decoded calls, their argument trees, and router command plans.
//!
//! `DecodedCall.args` is a tagged union rather than a duck-typed bag: a
//! decode either yields positional values (signature-db candidates carry no
//! names) or named values (known ABIs and fetched contract ABIs do). The
//! argument [`Value`] is itself recursive so nested multicall and Safe
//! `execTransaction` payloads decode into the same shape.

use alloy_primitives::{Address, Bytes, I256, Selector, U256};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Which pipeline stage produced a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeSource {
    KnownAbi,
    SignatureDb,
    ContractAbi,
    LocalSelector,
}

/// Token-standard tag set by the known-ABI stage; drives the
/// unlimited-approval finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStandard {
    Erc20,
    Eip2612,
}

/// A decoded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    Bytes(Bytes),
    Str(String),
    List(Vec<Value>),
    Record(Vec<(String, Value)>),
    Call(Box<DecodedCall>),
}

impl Value {
    /// The value as a U256, when it is an unsigned integer.
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as an address.
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// The value as raw bytes.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // Integers render as decimal strings: JSON numbers cannot carry
            // uint256 precision.
            Value::Uint(v) => serializer.serialize_str(&v.to_string()),
            Value::Int(v) => serializer.serialize_str(&v.to_string()),
            Value::Address(a) => serializer.serialize_str(&format!("{a:#x}")),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Bytes(b) => serializer.serialize_str(&b.to_string()),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Value::Call(call) => call.serialize(serializer),
        }
    }
}

/// Ordered or named decoded arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Args {
    #[default]
    Empty,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Args {
    pub fn is_empty(&self) -> bool {
        match self {
            Args::Empty => true,
            Args::Positional(values) => values.is_empty(),
            Args::Named(pairs) => pairs.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Args::Empty => 0,
            Args::Positional(values) => values.len(),
            Args::Named(pairs) => pairs.len(),
        }
    }

    /// Looks up an argument by name (named args) or by index (positional).
    pub fn get(&self, name: &str, index: usize) -> Option<&Value> {
        match self {
            Args::Empty => None,
            Args::Positional(values) => values.get(index),
            Args::Named(pairs) => pairs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .or_else(|| pairs.get(index).map(|(_, v)| v)),
        }
    }

    /// All values in declared order, names dropped.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Args::Empty => Vec::new(),
            Args::Positional(values) => values.iter().collect(),
            Args::Named(pairs) => pairs.iter().map(|(_, v)| v).collect(),
        }
    }
}

impl Serialize for Args {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Args::Empty => serializer.serialize_seq(Some(0))?.end(),
            Args::Positional(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Args::Named(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (name, value) in pairs {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

/// One step of a Universal Router command plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterCommand {
    pub index: usize,
    pub opcode: u8,
    pub command: String,
    pub allow_revert: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, JsonValue>,
}

/// A semantically named function call recovered from raw calldata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedCall {
    #[serde(serialize_with = "serialize_selector")]
    pub selector: Selector,
    pub signature: String,
    pub function_name: String,
    pub source: DecodeSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<CallStandard>,
    pub args: Args,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arg_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arg_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inner_calls: Vec<DecodedCall>,
    #[serde(rename = "commandsDecoded", skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<RouterCommand>,
}

impl DecodedCall {
    /// A minimal placeholder for a selector nothing could resolve.
    pub fn placeholder(selector: Selector) -> Self {
        DecodedCall {
            selector,
            signature: format!("{selector}()"),
            function_name: selector.to_string(),
            source: DecodeSource::LocalSelector,
            standard: None,
            args: Args::Empty,
            arg_names: Vec::new(),
            arg_types: Vec::new(),
            alternates: Vec::new(),
            inner_calls: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Convenience lookup used by the intent builder and approval checks.
    pub fn arg(&self, name: &str, index: usize) -> Option<&Value> {
        self.args.get(name, index)
    }
}

fn serialize_selector<S>(selector: &Selector, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{selector:#x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, fixed_bytes};

    fn approve_call() -> DecodedCall {
        DecodedCall {
            selector: fixed_bytes!("095ea7b3"),
            signature: "approve(address,uint256)".to_string(),
            function_name: "approve".to_string(),
            source: DecodeSource::KnownAbi,
            standard: Some(CallStandard::Erc20),
            args: Args::Named(vec![
                (
                    "spender".to_string(),
                    Value::Address(address!("0000000000000000000000000000000000000001")),
                ),
                ("amount".to_string(), Value::Uint(U256::MAX)),
            ]),
            arg_names: vec!["spender".to_string(), "amount".to_string()],
            arg_types: vec!["address".to_string(), "uint256".to_string()],
            alternates: Vec::new(),
            inner_calls: Vec::new(),
            commands: Vec::new(),
        }
    }

    #[test]
    fn test_named_args_serialize_as_object() {
        let json = serde_json::to_value(&approve_call()).unwrap();
        assert_eq!(json["selector"], "0x095ea7b3");
        assert_eq!(json["functionName"], "approve");
        assert_eq!(json["source"], "known-abi");
        assert_eq!(json["standard"], "erc20");
        assert_eq!(
            json["args"]["spender"],
            "0x0000000000000000000000000000000000000001"
        );
        assert_eq!(
            json["args"]["amount"],
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn test_positional_args_serialize_as_array() {
        let call = DecodedCall {
            args: Args::Positional(vec![Value::Uint(U256::from(7)), Value::Bool(true)]),
            arg_names: Vec::new(),
            ..approve_call()
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["args"][0], "7");
        assert_eq!(json["args"][1], true);
    }

    #[test]
    fn test_arg_lookup_by_name_and_index() {
        let call = approve_call();
        assert_eq!(call.arg("amount", 1).and_then(Value::as_uint), Some(U256::MAX));
        assert_eq!(
            call.arg("missing", 0).and_then(Value::as_address),
            Some(address!("0000000000000000000000000000000000000001"))
        );
    }

    #[test]
    fn test_placeholder_shape() {
        let placeholder = DecodedCall::placeholder(fixed_bytes!("deadbeef"));
        assert_eq!(placeholder.source, DecodeSource::LocalSelector);
        assert!(placeholder.args.is_empty());
        let json = serde_json::to_value(&placeholder).unwrap();
        assert_eq!(json["selector"], "0xdeadbeef");
        // Empty collections stay off the wire.
        assert!(json.get("innerCalls").is_none());
        assert!(json.get("commandsDecoded").is_none());
    }

    #[test]
    fn test_nested_call_value() {
        let inner = approve_call();
        let value = Value::Call(Box::new(inner));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["functionName"], "approve");
    }
}
