//! Source verification lookups against Sourcify.
//!
//! Sourcify serves verified contract metadata keyed by chain id and
//! address. A match gives us the contract name and, when present, the ABI
//! that feeds the decoder's contract-ABI stage.

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use serde_json::Value as JsonValue;
use txshield_types::Chain;
use url::Url;

use crate::http::HttpClient;
use crate::providers::{ProviderError, VerificationOutput};

const SOURCIFY_BASE: &str = "https://sourcify.dev/server";

pub async fn fetch(
    client: &HttpClient,
    chain: Chain,
    address: Address,
) -> Result<VerificationOutput, ProviderError> {
    let url = Url::parse(&format!(
        "{SOURCIFY_BASE}/v2/contract/{}/{address:#x}?fields=abi",
        chain.id()
    ))
    .map_err(|e| ProviderError::BadBody(e.to_string()))?;

    let body = match client.get_json(url).await {
        Ok(body) => body,
        // 404 means "not verified", which is an answer, not a failure.
        Err(crate::http::HttpError::Status { status: 404, .. }) => {
            return Ok(VerificationOutput {
                verified: false,
                name: None,
                abi: None,
            });
        }
        Err(error) => return Err(error.into()),
    };

    Ok(parse_body(&body))
}

fn parse_body(body: &JsonValue) -> VerificationOutput {
    let matched = body
        .get("match")
        .and_then(JsonValue::as_str)
        .map(|m| m == "exact_match" || m == "match" || m == "partial_match")
        .unwrap_or(false);
    let name = body
        .get("name")
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    let abi = body
        .get("abi")
        .and_then(|abi| serde_json::from_value::<JsonAbi>(abi.clone()).ok());
    VerificationOutput {
        verified: matched,
        name,
        abi,
    }
}
