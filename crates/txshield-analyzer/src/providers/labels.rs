//! Address label lookups: phishing and sanction tags.
//!
//! The label service endpoint is deployment-specific, so it is configured
//! through `TXSHIELD_LABELS_URL` rather than baked in. Without it the
//! provider reports itself skipped.

use alloy_primitives::Address;
use serde_json::Value as JsonValue;
use std::env;
use url::Url;

use crate::http::HttpClient;
use crate::providers::{LabelsOutput, ProviderError};

const ENV_LABELS_URL: &str = "TXSHIELD_LABELS_URL";

pub fn configured_base() -> Option<Url> {
    env::var(ENV_LABELS_URL).ok().and_then(|s| Url::parse(&s).ok())
}

pub async fn fetch(
    client: &HttpClient,
    base: &Url,
    address: Address,
) -> Result<LabelsOutput, ProviderError> {
    let url = base
        .join(&format!("address/{address:#x}"))
        .map_err(|e| ProviderError::BadBody(e.to_string()))?;
    let body = client.get_json(url).await?;
    Ok(parse_body(&body))
}

fn parse_body(body: &JsonValue) -> LabelsOutput {
    let tags = body
        .get("tags")
        .and_then(JsonValue::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(JsonValue::as_str)
                .map(|tag| tag.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default();
    LabelsOutput { tags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tags_lowercased() {
        let output = parse_body(&json!({"tags": ["Phishing", "drainer"]}));
        assert_eq!(output.tags, vec!["phishing", "drainer"]);
    }

    #[test]
    fn test_parse_missing_tags() {
        let output = parse_body(&json!({}));
        assert!(output.tags.is_empty());
    }
}
