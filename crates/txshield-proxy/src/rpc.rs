//! JSON-RPC 2.0 message shapes and error codes.

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INVALID_PARAMS: i64 = -32602;
/// The wallet-facing rejection code for blocked transactions, matching
/// EIP-1193's "user rejected request".
pub const TRANSACTION_BLOCKED: i64 = 4001;

/// One parsed request entry (single request or batch element).
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent id marks a notification: it must never receive a reply.
    #[serde(default)]
    pub id: Option<JsonValue>,
    pub method: String,
    #[serde(default)]
    pub params: Option<JsonValue>,
}

impl RpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The two methods the proxy intercepts; everything else passes
    /// through untouched.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self.method.as_str(),
            "eth_sendTransaction" | "eth_sendRawTransaction"
        )
    }

    pub fn first_param(&self) -> Option<&JsonValue> {
        self.params.as_ref()?.as_array()?.first()
    }
}

pub fn error_response(id: JsonValue, code: i64, message: &str) -> JsonValue {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

pub fn error_response_with_data(
    id: JsonValue,
    code: i64,
    message: &str,
    data: JsonValue,
) -> JsonValue {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message, "data": data }
    })
}

/// Whether an upstream body looks like a JSON-RPC response at all.
pub fn is_rpc_response(value: &JsonValue) -> bool {
    match value {
        JsonValue::Object(object) => object.contains_key("result") || object.contains_key("error"),
        JsonValue::Array(entries) => entries.iter().all(is_rpc_response),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_and_notification() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"eth_blockNumber"}"#).unwrap();
        assert!(!request.is_notification());
        assert!(!request.is_mutating());

        let notification: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"eth_sendRawTransaction","params":["0x00"]}"#)
                .unwrap();
        assert!(notification.is_notification());
        assert!(notification.is_mutating());
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(json!(3), INVALID_PARAMS, "Invalid params");
        assert_eq!(response["id"], 3);
        assert_eq!(response["error"]["code"], -32602);
        assert!(response.get("result").is_none());
    }

    #[test]
    fn test_is_rpc_response() {
        assert!(is_rpc_response(&json!({"jsonrpc":"2.0","id":1,"result":"0x10"})));
        assert!(is_rpc_response(&json!({"id":1,"error":{"code":-32000,"message":"x"}})));
        assert!(!is_rpc_response(&json!({"hello":"world"})));
        assert!(!is_rpc_response(&json!("plain string")));
        assert!(is_rpc_response(&json!([{"id":1,"result":null}])));
    }
}
