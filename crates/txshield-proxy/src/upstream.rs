//! The upstream RPC endpoint: raw forwarding and the one-shot chain probe.

use serde_json::{Value as JsonValue, json};
use tokio::sync::OnceCell;
use txshield_types::Chain;
use txshield_analyzer::{HttpClient, HttpError};
use url::Url;

use crate::rpc::is_rpc_response;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("upstream returned a non-JSON-RPC body")]
    NotJsonRpc,
}

/// One upstream endpoint plus its lazily probed chain id.
pub struct Upstream {
    client: HttpClient,
    url: Url,
    chain: OnceCell<Option<Chain>>,
}

impl Upstream {
    pub fn new(client: HttpClient, url: Url) -> Self {
        Upstream {
            client,
            url,
            chain: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Forwards a raw body and parses the reply, validating it is
    /// JSON-RPC shaped. The original bytes are sent untouched.
    pub async fn forward_raw(&self, body: Vec<u8>) -> Result<JsonValue, UpstreamError> {
        let (_, reply) = self.client.post_raw(self.url.clone(), body).await?;
        let value: JsonValue =
            serde_json::from_slice(&reply).map_err(|_| UpstreamError::NotJsonRpc)?;
        if !is_rpc_response(&value) {
            return Err(UpstreamError::NotJsonRpc);
        }
        Ok(value)
    }

    /// Forwards a single request value (used for batch entries, which
    /// must reach the upstream one at a time).
    pub async fn forward_entry(&self, entry: &JsonValue) -> Result<JsonValue, UpstreamError> {
        let body = serde_json::to_vec(entry).unwrap_or_default();
        self.forward_raw(body).await
    }

    /// Fires a notification upstream; the reply (if any) is discarded.
    pub async fn forward_notification(&self, entry: &JsonValue) {
        let body = serde_json::to_vec(entry).unwrap_or_default();
        if let Err(error) = self.client.post_raw(self.url.clone(), body).await {
            tracing::debug!(%error, "notification forward failed");
        }
    }

    /// The upstream's chain id, probed once with `eth_chainId` on first
    /// use and cached for the proxy's lifetime.
    pub async fn chain(&self) -> Option<Chain> {
        *self
            .chain
            .get_or_init(|| async {
                let probe = json!({
                    "jsonrpc": "2.0",
                    "id": 0,
                    "method": "eth_chainId",
                    "params": []
                });
                match self.client.post_json(self.url.clone(), &probe).await {
                    Ok(reply) => reply
                        .get("result")
                        .and_then(JsonValue::as_str)
                        .and_then(|hex| u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok())
                        .and_then(Chain::from_id),
                    Err(error) => {
                        tracing::warn!(%error, "chain id probe failed");
                        None
                    }
                }
            })
            .await
    }
}
