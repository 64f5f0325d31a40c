//! Findings: the individual observations attached to a scan result.
//!
//! Finding codes form a closed enumeration with a fixed priority table. The
//! aggregator sorts findings by severity bucket first (danger, warning,
//! info, safe) and then by this priority, and deduplicates by code. The
//! ordering here is load-bearing: renderers, tests, and the recommendation
//! function all assume it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Severity of a single finding. `Safe` is a positive signal, not an
/// absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Safe,
    Info,
    Warning,
    Danger,
}

/// The closed set of finding codes.
///
/// Serialized as SCREAMING_SNAKE_CASE strings to match the JSON output
/// schema consumed by wallets and CI integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    KnownPhishing,
    Honeypot,
    OwnerDrain,
    HiddenMint,
    Selfdestruct,
    Unverified,
    ApprovalTargetMismatch,
    ApprovalToDangerousContract,
    ApprovalToEoa,
    PossibleTyposquat,
    Upgradeable,
    NewContract,
    UnlimitedApproval,
    SimFailed,
    SimPartialCoverage,
    LowActivity,
    Blacklist,
    HighTax,
    Verified,
    KnownProtocol,
    MetadataUnavailable,
    CalldataUnknownSelector,
    CalldataEmpty,
    NotAContract,
}

impl FindingCode {
    /// Position in the canonical ordering. Lower sorts first within a
    /// severity bucket, and survives deduplication.
    pub fn priority(&self) -> u8 {
        match self {
            FindingCode::KnownPhishing => 0,
            FindingCode::Honeypot => 1,
            FindingCode::OwnerDrain => 2,
            FindingCode::HiddenMint => 3,
            FindingCode::Selfdestruct => 4,
            FindingCode::Unverified => 5,
            FindingCode::ApprovalTargetMismatch => 6,
            FindingCode::ApprovalToDangerousContract => 7,
            FindingCode::ApprovalToEoa => 8,
            FindingCode::PossibleTyposquat => 9,
            FindingCode::Upgradeable => 10,
            FindingCode::NewContract => 11,
            FindingCode::UnlimitedApproval => 12,
            FindingCode::SimFailed => 13,
            FindingCode::SimPartialCoverage => 14,
            FindingCode::LowActivity => 15,
            FindingCode::Blacklist => 16,
            FindingCode::HighTax => 17,
            FindingCode::NotAContract => 18,
            FindingCode::Verified => 19,
            FindingCode::KnownProtocol => 20,
            FindingCode::MetadataUnavailable => 21,
            FindingCode::CalldataUnknownSelector => 22,
            FindingCode::CalldataEmpty => 23,
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The serde rename is the canonical spelling; reuse it.
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(s.trim_matches('"'))
    }
}

/// A single observation attached to a scan result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub level: Severity,
    pub code: FindingCode,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub details: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub refs: Vec<String>,
}

impl Finding {
    pub fn new(level: Severity, code: FindingCode, message: impl Into<String>) -> Self {
        Finding {
            level,
            code,
            message: message.into(),
            details: Map::new(),
            refs: Vec::new(),
        }
    }

    pub fn danger(code: FindingCode, message: impl Into<String>) -> Self {
        Finding::new(Severity::Danger, code, message)
    }

    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Finding::new(Severity::Warning, code, message)
    }

    pub fn info(code: FindingCode, message: impl Into<String>) -> Self {
        Finding::new(Severity::Info, code, message)
    }

    pub fn safe(code: FindingCode, message: impl Into<String>) -> Self {
        Finding::new(Severity::Safe, code, message)
    }

    /// Attaches a detail entry, builder-style.
    pub fn with_detail(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Attaches a reference link, builder-style.
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.refs.push(reference.into());
        self
    }
}
