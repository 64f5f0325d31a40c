//! Conversion from dynamically decoded ABI values into the argument tree.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Bytes;
use txshield_types::Value;

/// Maps an [`DynSolValue`] onto the recursive [`Value`] union.
///
/// Tuples flatten to lists: the dynamic decoder does not carry component
/// names, and consumers index into them positionally.
pub fn from_dyn(value: DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(b),
        DynSolValue::Int(i, _) => Value::Int(i),
        DynSolValue::Uint(u, _) => Value::Uint(u),
        DynSolValue::FixedBytes(word, size) => {
            Value::Bytes(Bytes::copy_from_slice(&word.as_slice()[..size]))
        }
        DynSolValue::Address(a) => Value::Address(a),
        DynSolValue::Function(f) => Value::Bytes(Bytes::copy_from_slice(f.as_slice())),
        DynSolValue::Bytes(b) => Value::Bytes(Bytes::from(b)),
        DynSolValue::String(s) => Value::Str(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::List(items.into_iter().map(from_dyn).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(
            from_dyn(DynSolValue::Uint(U256::from(5), 256)),
            Value::Uint(U256::from(5))
        );
        assert_eq!(from_dyn(DynSolValue::Bool(true)), Value::Bool(true));
        let addr = Address::repeat_byte(0x11);
        assert_eq!(from_dyn(DynSolValue::Address(addr)), Value::Address(addr));
    }

    #[test]
    fn test_tuple_flattens_to_list() {
        let tuple = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1), 256),
            DynSolValue::Bool(false),
        ]);
        match from_dyn(tuple) {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }
}
