//! Direct chain queries over JSON-RPC: code presence and storage slots.

use alloy_primitives::{Address, B256};
use serde_json::{Value as JsonValue, json};
use url::Url;

use crate::http::HttpClient;
use crate::providers::{ProviderError, RpcOutput};

/// A thin JSON-RPC caller bound to one upstream URL.
#[derive(Debug, Clone)]
pub struct RpcCaller {
    client: HttpClient,
    url: Url,
}

impl RpcCaller {
    pub fn new(client: HttpClient, url: Url) -> Self {
        RpcCaller { client, url }
    }

    async fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let reply = self.client.post_json(self.url.clone(), &body).await?;
        if let Some(error) = reply.get("error") {
            return Err(ProviderError::BadBody(error.to_string()));
        }
        reply
            .get("result")
            .cloned()
            .ok_or_else(|| ProviderError::BadBody("missing result".to_string()))
    }

    /// `eth_getCode` at latest; `"0x"` means no code.
    pub async fn get_code(&self, address: Address) -> Result<String, ProviderError> {
        let result = self
            .call("eth_getCode", json!([format!("{address:#x}"), "latest"]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::BadBody("eth_getCode returned non-string".to_string()))
    }

    /// `eth_getStorageAt` for a fixed slot at latest.
    pub async fn get_storage(&self, address: Address, slot: B256) -> Result<B256, ProviderError> {
        let result = self
            .call(
                "eth_getStorageAt",
                json!([format!("{address:#x}"), format!("{slot:#x}"), "latest"]),
            )
            .await?;
        let text = result
            .as_str()
            .ok_or_else(|| ProviderError::BadBody("eth_getStorageAt returned non-string".to_string()))?;
        parse_word(text)
            .ok_or_else(|| ProviderError::BadBody(format!("bad storage word {text:?}")))
    }
}

/// Whether the target has code at all. An EOA target changes how approval
/// findings read.
pub async fn fetch(caller: &RpcCaller, address: Address) -> Result<RpcOutput, ProviderError> {
    let code = caller.get_code(address).await?;
    Ok(RpcOutput {
        is_contract: !is_empty_code(&code),
    })
}

pub(crate) fn is_empty_code(code: &str) -> bool {
    matches!(code, "" | "0x" | "0x0")
}

/// Parses a storage word, tolerating short (unpadded) replies.
fn parse_word(text: &str) -> Option<B256> {
    let stripped = text.strip_prefix("0x")?;
    if stripped.len() > 64 || stripped.len() % 2 != 0 {
        return None;
    }
    let bytes = hex::decode(stripped).ok()?;
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(B256::from(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_variants() {
        assert!(is_empty_code("0x"));
        assert!(is_empty_code(""));
        assert!(!is_empty_code("0x60806040"));
    }

    #[test]
    fn test_parse_word_pads_short_replies() {
        let word = parse_word("0x01").unwrap();
        assert_eq!(word.as_slice()[31], 0x01);
        assert!(parse_word("0x123").is_none()); // odd length
        assert!(parse_word("abcd").is_none()); // no prefix
    }
}
