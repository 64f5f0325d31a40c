//! The aggregate result returned to every surface.

use serde::{Deserialize, Serialize};

use crate::contract::{ContractInfo, ProtocolMatch};
use crate::finding::Finding;
use crate::recommendation::Recommendation;
use crate::simulation::SimulationResult;

/// How much the analyzer trusts its own picture of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Confidence level plus the reasons for every downgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reasons: Vec<String>,
}

impl Confidence {
    pub fn high() -> Self {
        Confidence {
            level: ConfidenceLevel::High,
            reasons: Vec::new(),
        }
    }

    /// Downgrades to at most `level`, recording why. Never upgrades.
    pub fn downgrade(&mut self, level: ConfidenceLevel, reason: impl Into<String>) {
        if level < self.level {
            self.level = level;
        }
        self.reasons.push(reason.into());
    }
}

/// Everything a scan produced: contract intelligence, findings, the
/// verdict, the decoded intent, and the simulation deltas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub contract: ContractInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_match: Option<ProtocolMatch>,
    pub findings: Vec<Finding>,
    pub confidence: Confidence,
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationResult>,
}
