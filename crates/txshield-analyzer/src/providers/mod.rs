//! External intelligence providers.
//!
//! Each provider is an independent computation returning
//! `Result<Output, ProviderError>`; failures are isolated and contribute
//! nothing. The fan-out (see [`crate::fanout`]) wraps every call in its own
//! timeout and reports progress over an optional channel.

use alloy_primitives::Address;
use serde::Serialize;
use txshield_types::{ProtocolMatch, ProxyType};

pub mod etherscan;
pub mod labels;
pub mod protocol;
pub mod proxy_detect;
pub mod rpc;
pub mod sourcify;
pub mod token_security;

/// The closed provider set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Rpc,
    Sourcify,
    Labels,
    Etherscan,
    ProxyDetect,
    ProtocolRegistry,
    ImplSourcify,
    ImplProtocol,
    TokenSecurity,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 9] = [
        ProviderKind::Rpc,
        ProviderKind::Sourcify,
        ProviderKind::Labels,
        ProviderKind::Etherscan,
        ProviderKind::ProxyDetect,
        ProviderKind::ProtocolRegistry,
        ProviderKind::ImplSourcify,
        ProviderKind::ImplProtocol,
        ProviderKind::TokenSecurity,
    ];
}

/// Why a provider produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] crate::http::HttpError),
    #[error("provider returned an unexpected body: {0}")]
    BadBody(String),
    #[error("provider is not configured: {0}")]
    NotConfigured(&'static str),
}

/// Outcome of one provider under the fan-out.
#[derive(Debug)]
pub enum ProviderReport<T> {
    Ok(T),
    Failed(String),
    TimedOut,
    Skipped,
}

impl<T> ProviderReport<T> {
    pub fn ok(&self) -> Option<&T> {
        match self {
            ProviderReport::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderReport::Ok(_))
    }
}

/// Progress events for an optional sink (the CLI renders these as
/// per-provider status lines).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub provider: ProviderKind,
    pub state: ProgressState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressState {
    Started,
    Finished,
    Failed,
    TimedOut,
    Skipped,
}

/// Output of the rpc provider: whether code exists at the address.
#[derive(Debug, Clone)]
pub struct RpcOutput {
    pub is_contract: bool,
}

/// Output of a verification provider.
#[derive(Debug, Clone)]
pub struct VerificationOutput {
    pub verified: bool,
    pub name: Option<String>,
    pub abi: Option<alloy_json_abi::JsonAbi>,
}

/// Output of the labels provider: free-form tags, `"phishing"` being the
/// one the aggregator acts on.
#[derive(Debug, Clone)]
pub struct LabelsOutput {
    pub tags: Vec<String>,
}

/// Output of the explorer metadata provider.
#[derive(Debug, Clone, Default)]
pub struct MetadataOutput {
    pub age_days: Option<u64>,
    pub tx_count: Option<u64>,
    pub creator: Option<Address>,
}

/// Output of the proxy-detect provider.
#[derive(Debug, Clone, Default)]
pub struct ProxyDetectOutput {
    pub is_proxy: bool,
    pub proxy_type: Option<ProxyType>,
    pub implementation: Option<Address>,
    pub beacon: Option<Address>,
}

/// Output of the protocol registry.
#[derive(Debug, Clone)]
pub struct ProtocolOutput {
    pub matched: Option<ProtocolMatch>,
}

/// Boolean risk flags from the token-security provider.
#[derive(Debug, Clone, Default)]
pub struct TokenSecurityOutput {
    pub is_honeypot: bool,
    pub is_mintable: bool,
    pub can_take_back_ownership: bool,
    pub hidden_owner: bool,
    pub selfdestruct: bool,
    pub is_blacklisted: bool,
    pub owner_can_change_balance: bool,
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
}
