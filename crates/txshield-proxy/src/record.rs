//! Append-only recording of intercepted transactions.
//!
//! Each intercepted mutating RPC gets its own timestamped sub-directory
//! holding the original RPC entry, the normalized calldata, the full
//! analysis response, and the rendered text verdict.

use alloy_primitives::Address;
use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use std::path::{Path, PathBuf};
use tokio::fs;
use txshield_types::{CalldataInput, Chain};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Recorder {
    dir: PathBuf,
}

/// Everything persisted for one interception.
pub struct RecordEntry<'a> {
    pub method: &'a str,
    pub chain: Chain,
    pub rpc: &'a JsonValue,
    pub calldata: &'a CalldataInput,
    pub analyze_response: &'a JsonValue,
    pub rendered: &'a str,
    pub action: &'a str,
}

impl Recorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Recorder { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one record. Failures are reported to the caller so that
    /// `--once` runs can surface them; background recording logs and
    /// drops them.
    pub async fn record(&self, entry: RecordEntry<'_>) -> std::io::Result<PathBuf> {
        let sub_dir = self.dir.join(Self::dir_name(
            entry.method,
            entry.chain,
            entry.calldata.to,
            entry.calldata.from,
        ));
        fs::create_dir_all(&sub_dir).await?;

        let meta = json!({
            "recordedAt": Utc::now().to_rfc3339(),
            "method": entry.method,
            "chain": entry.chain,
            "action": entry.action,
        });
        write_json(&sub_dir, "meta.json", &meta).await?;
        write_json(&sub_dir, "rpc.json", entry.rpc).await?;
        write_json(&sub_dir, "calldata.json", &serde_json::to_value(entry.calldata)?).await?;
        write_json(&sub_dir, "analyzeResponse.json", entry.analyze_response).await?;
        fs::write(sub_dir.join("rendered.txt"), entry.rendered).await?;
        Ok(sub_dir)
    }

    /// `<iso-ts>__<method>__<chain>__<to-short>__<from-short>__<uuid8>`,
    /// with colons kept out of the timestamp for filesystem portability.
    fn dir_name(method: &str, chain: Chain, to: Address, from: Option<Address>) -> String {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let uuid8: String = Uuid::new_v4().simple().to_string()[..8].to_string();
        format!(
            "{timestamp}__{method}__{chain}__{}__{}__{uuid8}",
            short_address(Some(to)),
            short_address(from),
        )
    }
}

fn short_address(address: Option<Address>) -> String {
    match address {
        Some(address) => format!("{address:#x}")[..10].to_string(),
        None => "unknown".to_string(),
    }
}

async fn write_json(dir: &Path, name: &str, value: &JsonValue) -> std::io::Result<()> {
    let pretty = serde_json::to_vec_pretty(value)?;
    fs::write(dir.join(name), pretty).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_dir_name_shape() {
        let name = Recorder::dir_name(
            "eth_sendTransaction",
            Chain::Base,
            address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            None,
        );
        let parts: Vec<&str> = name.split("__").collect();
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[1], "eth_sendTransaction");
        assert_eq!(parts[2], "base");
        assert_eq!(parts[3], "0xa0b86991");
        assert_eq!(parts[4], "unknown");
        assert_eq!(parts[5].len(), 8);
        assert!(!name.contains(':'));
    }

    #[tokio::test]
    async fn test_record_writes_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(tmp.path());
        let calldata = CalldataInput::address_only(
            address!("00000000000000000000000000000000000000aa"),
            Some(Chain::Ethereum),
        );
        let rpc = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_sendTransaction"});
        let analysis = json!({"recommendation": "danger"});
        let written = recorder
            .record(RecordEntry {
                method: "eth_sendTransaction",
                chain: Chain::Ethereum,
                rpc: &rpc,
                calldata: &calldata,
                analyze_response: &analysis,
                rendered: "BLOCK",
                action: "block",
            })
            .await
            .unwrap();

        for file in ["meta.json", "rpc.json", "calldata.json", "analyzeResponse.json", "rendered.txt"] {
            assert!(written.join(file).exists(), "missing {file}");
        }
        let meta: JsonValue =
            serde_json::from_slice(&std::fs::read(written.join("meta.json")).unwrap()).unwrap();
        assert_eq!(meta["action"], "block");
    }
}
