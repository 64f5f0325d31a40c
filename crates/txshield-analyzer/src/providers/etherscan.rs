//! Explorer metadata: contract age and activity from the Etherscan API
//! family.

use alloy_primitives::Address;
use serde_json::Value as JsonValue;
use std::time::{SystemTime, UNIX_EPOCH};
use txshield_types::Chain;
use url::Url;

use crate::http::HttpClient;
use crate::providers::{MetadataOutput, ProviderError};

/// How many transactions we page in; activity beyond this reads as "busy
/// enough" and the exact count stops mattering.
const TX_PAGE: usize = 100;

pub async fn fetch(
    client: &HttpClient,
    chain: Chain,
    address: Address,
    api_key: &str,
) -> Result<MetadataOutput, ProviderError> {
    let url = Url::parse(&format!(
        "https://{}/api?module=account&action=txlist&address={address:#x}&startblock=0&page=1&offset={TX_PAGE}&sort=asc&apikey={api_key}",
        chain.explorer_api_host()
    ))
    .map_err(|e| ProviderError::BadBody(e.to_string()))?;

    let body = client.get_json(url).await?;
    parse_body(&body, now_secs())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn parse_body(body: &JsonValue, now: u64) -> Result<MetadataOutput, ProviderError> {
    let status = body.get("status").and_then(JsonValue::as_str);
    // status "0" with "No transactions found" is an empty answer.
    let result = body.get("result");
    let transactions = match result.and_then(JsonValue::as_array) {
        Some(list) => list,
        None if status == Some("0") => return Ok(MetadataOutput::default()),
        None => {
            return Err(ProviderError::BadBody(
                result.map(|r| r.to_string()).unwrap_or_default(),
            ));
        }
    };

    let first = transactions.first();
    let age_days = first
        .and_then(|tx| tx.get("timeStamp"))
        .and_then(JsonValue::as_str)
        .and_then(|ts| ts.parse::<u64>().ok())
        .map(|created| now.saturating_sub(created) / 86_400);
    let creator = first
        .and_then(|tx| tx.get("from"))
        .and_then(JsonValue::as_str)
        .and_then(|from| from.parse().ok());

    Ok(MetadataOutput {
        age_days,
        tx_count: Some(transactions.len() as u64),
        creator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_transactions() {
        let now = 1_700_000_000u64;
        let created = now - 90 * 86_400;
        let body = json!({
            "status": "1",
            "result": [
                {"timeStamp": created.to_string(), "from": "0x00000000000000000000000000000000000000aa"},
                {"timeStamp": (created + 10).to_string(), "from": "0x00000000000000000000000000000000000000bb"}
            ]
        });
        let output = parse_body(&body, now).unwrap();
        assert_eq!(output.age_days, Some(90));
        assert_eq!(output.tx_count, Some(2));
        assert!(output.creator.is_some());
    }

    #[test]
    fn test_parse_empty_result() {
        let body = json!({"status": "0", "message": "No transactions found", "result": "..."});
        let output = parse_body(&body, 0).unwrap();
        assert_eq!(output.age_days, None);
        assert_eq!(output.tx_count, None);
    }

    #[test]
    fn test_parse_error_body() {
        let body = json!({"status": "1", "result": "Max rate limit reached"});
        assert!(parse_body(&body, 0).is_err());
    }
}
