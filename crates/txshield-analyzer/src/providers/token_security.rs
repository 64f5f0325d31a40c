//! Token risk flags from the GoPlus token-security API.

use alloy_primitives::Address;
use serde_json::Value as JsonValue;
use txshield_types::Chain;
use url::Url;

use crate::http::HttpClient;
use crate::providers::{ProviderError, TokenSecurityOutput};

const GOPLUS_BASE: &str = "https://api.gopluslabs.io/api/v1/token_security";

pub async fn fetch(
    client: &HttpClient,
    chain: Chain,
    address: Address,
) -> Result<TokenSecurityOutput, ProviderError> {
    let url = Url::parse(&format!(
        "{GOPLUS_BASE}/{}?contract_addresses={address:#x}",
        chain.id()
    ))
    .map_err(|e| ProviderError::BadBody(e.to_string()))?;
    let body = client.get_json(url).await?;
    parse_body(&body, address)
}

fn parse_body(body: &JsonValue, address: Address) -> Result<TokenSecurityOutput, ProviderError> {
    let result = body
        .get("result")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| ProviderError::BadBody("missing result".to_string()))?;
    // GoPlus keys the result map by lowercase address.
    let entry = result
        .get(&format!("{address:#x}"))
        .or_else(|| result.values().next())
        .ok_or_else(|| ProviderError::BadBody("empty result".to_string()))?;

    Ok(TokenSecurityOutput {
        is_honeypot: flag(entry, "is_honeypot"),
        is_mintable: flag(entry, "is_mintable"),
        can_take_back_ownership: flag(entry, "can_take_back_ownership"),
        hidden_owner: flag(entry, "hidden_owner"),
        selfdestruct: flag(entry, "selfdestruct"),
        is_blacklisted: flag(entry, "is_blacklisted"),
        owner_can_change_balance: flag(entry, "owner_change_balance"),
        buy_tax: rate(entry, "buy_tax"),
        sell_tax: rate(entry, "sell_tax"),
    })
}

/// GoPlus encodes booleans as the strings "0" / "1".
fn flag(entry: &JsonValue, key: &str) -> bool {
    entry.get(key).and_then(JsonValue::as_str) == Some("1")
}

fn rate(entry: &JsonValue, key: &str) -> Option<f64> {
    entry
        .get(key)
        .and_then(JsonValue::as_str)
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    #[test]
    fn test_parse_flags() {
        let addr = address!("00000000000000000000000000000000000000aa");
        let body = json!({
            "result": {
                "0x00000000000000000000000000000000000000aa": {
                    "is_honeypot": "1",
                    "is_mintable": "0",
                    "selfdestruct": "1",
                    "buy_tax": "0.35",
                    "sell_tax": ""
                }
            }
        });
        let output = parse_body(&body, addr).unwrap();
        assert!(output.is_honeypot);
        assert!(!output.is_mintable);
        assert!(output.selfdestruct);
        assert_eq!(output.buy_tax, Some(0.35));
        assert_eq!(output.sell_tax, None);
    }

    #[test]
    fn test_missing_result_is_error() {
        assert!(parse_body(&json!({"code": 4004}), Address::ZERO).is_err());
    }
}
