//! HTTP-backed signature database source (openchain.xyz).

use alloy_primitives::Selector;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use txshield_decoder::{SignatureSource, SignatureSourceError};
use url::Url;

use crate::http::HttpClient;

const OPENCHAIN_LOOKUP: &str = "https://api.openchain.xyz/signature-database/v1/lookup";

/// Looks selectors up in the openchain signature database.
#[derive(Debug, Clone)]
pub struct OpenchainSource {
    client: HttpClient,
}

impl OpenchainSource {
    pub fn new(client: HttpClient) -> Self {
        OpenchainSource { client }
    }
}

#[async_trait]
impl SignatureSource for OpenchainSource {
    async fn lookup(&self, selector: Selector) -> Result<Vec<String>, SignatureSourceError> {
        let url = Url::parse(&format!(
            "{OPENCHAIN_LOOKUP}?function={selector:#x}&filter=true"
        ))
        .map_err(|e| SignatureSourceError::BadBody(e.to_string()))?;
        let body = self
            .client
            .get_json(url)
            .await
            .map_err(|e| SignatureSourceError::Transport(e.to_string()))?;
        parse_body(&body, selector)
    }
}

fn parse_body(body: &JsonValue, selector: Selector) -> Result<Vec<String>, SignatureSourceError> {
    let entries = body
        .get("result")
        .and_then(|r| r.get("function"))
        .and_then(|f| f.get(format!("{selector:#x}")))
        .and_then(JsonValue::as_array)
        .ok_or_else(|| SignatureSourceError::BadBody("missing result.function entry".to_string()))?;
    Ok(entries
        .iter()
        .filter_map(|entry| entry.get("name"))
        .filter_map(JsonValue::as_str)
        .map(str::to_string)
        .collect())
}
