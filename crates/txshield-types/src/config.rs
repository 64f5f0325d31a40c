//! The JSON config file model, merged with environment overrides.
//!
//! The file lives at `~/.config/txshield/config.json` by default;
//! `TXSHIELD_CONFIG` overrides the path. Environment values win over file
//! values so CI and one-off runs never need to edit the file.
//!
//! ```json
//! {
//!   "etherscanKeys": { "ethereum": "KEY" },
//!   "rpcUrls":       { "base": "https://mainnet.base.org" },
//!   "simulation":    { "enabled": true, "backend": "heuristic" },
//!   "allowlist":     { "to": ["0x.."], "spenders": ["0x.."] }
//! }
//! ```

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chain::Chain;

/// Which simulation backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationBackend {
    /// An external forked node driven over RPC.
    Anvil,
    /// In-process approximation derived from the decoded call.
    #[default]
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub backend: SimulationBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anvil_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            enabled: true,
            backend: SimulationBackend::Heuristic,
            anvil_path: None,
            fork_block: None,
            rpc_url: None,
        }
    }
}

/// Addresses the operator has vouched for. Findings against allowlisted
/// targets or spenders are suppressed by the aggregator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Allowlist {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Address>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spenders: Vec<Address>,
}

/// The merged application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub etherscan_keys: HashMap<Chain, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub rpc_urls: HashMap<Chain, String>,
    pub simulation: SimulationConfig,
    pub allowlist: Allowlist,
}

/// Configuration errors surfaced to the harness.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl AppConfig {
    /// Loads configuration: file (if present), then env overrides.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let mut config = match &path {
            Some(p) if p.exists() => Self::load_from_path(p)?,
            _ => AppConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Loads from an explicit path without env merging. Used by tests and
    /// by `--config`-style overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(explicit) = env::var("TXSHIELD_CONFIG") {
            return Some(PathBuf::from(explicit));
        }
        let home = env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("txshield")
                .join("config.json"),
        )
    }

    /// Environment values override file values.
    ///
    /// `ETHERSCAN_API_KEY` applies to every chain without a per-chain key;
    /// `ETHERSCAN_API_KEY_<CHAIN>` and `RPC_URL_<CHAIN>` are per-chain.
    fn apply_env(&mut self) {
        for chain in Chain::variants() {
            let suffix = chain.name().to_ascii_uppercase();
            if let Ok(key) = env::var(format!("ETHERSCAN_API_KEY_{suffix}")) {
                self.etherscan_keys.insert(*chain, key);
            }
            if let Ok(url) = env::var(format!("RPC_URL_{suffix}")) {
                self.rpc_urls.insert(*chain, url);
            }
        }
        if let Ok(key) = env::var("ETHERSCAN_API_KEY") {
            for chain in Chain::variants() {
                self.etherscan_keys.entry(*chain).or_insert(key.clone());
            }
        }
    }

    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        self.rpc_urls.get(&chain).map(String::as_str)
    }

    pub fn etherscan_key(&self, chain: Chain) -> Option<&str> {
        self.etherscan_keys.get(&chain).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "etherscanKeys": { "ethereum": "KEY1", "base": "KEY2" },
                "rpcUrls": { "ethereum": "https://eth.example" },
                "simulation": { "enabled": false, "backend": "anvil", "forkBlock": 123 },
                "allowlist": { "to": ["0x0000000000000000000000000000000000000009"] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.etherscan_key(Chain::Base), Some("KEY2"));
        assert_eq!(config.rpc_url(Chain::Ethereum), Some("https://eth.example"));
        assert!(!config.simulation.enabled);
        assert_eq!(config.simulation.backend, SimulationBackend::Anvil);
        assert_eq!(config.simulation.fork_block, Some(123));
        assert_eq!(config.allowlist.to.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.backend, SimulationBackend::Heuristic);
        assert!(config.allowlist.to.is_empty());
        assert!(config.rpc_url(Chain::Polygon).is_none());
    }
}
