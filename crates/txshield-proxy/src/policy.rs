//! The risk policy: what happens to an intercepted transaction.

use serde::{Deserialize, Serialize};
use txshield_types::Recommendation;

/// What to do when a scan crosses the risk threshold and an operator is
/// present to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRisk {
    #[default]
    Block,
    Prompt,
}

impl std::str::FromStr for OnRisk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(OnRisk::Block),
            "prompt" => Ok(OnRisk::Prompt),
            other => Err(format!("expected block or prompt, got {other:?}")),
        }
    }
}

impl std::fmt::Display for OnRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OnRisk::Block => "block",
            OnRisk::Prompt => "prompt",
        })
    }
}

/// The decision for one intercepted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Forward,
    Block,
    Prompt,
}

/// Proxy risk policy, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct ProxyPolicy {
    /// Scans at or above this recommendation are risky.
    pub threshold: Recommendation,
    pub on_risk: OnRisk,
    /// Whether a terminal is attached; without one, `Prompt` degrades to
    /// `Block`.
    pub interactive: bool,
    /// When false, a failed simulation always blocks even in interactive
    /// mode.
    pub allow_prompt_when_simulation_fails: bool,
}

impl Default for ProxyPolicy {
    fn default() -> Self {
        ProxyPolicy {
            threshold: Recommendation::Warning,
            on_risk: OnRisk::Block,
            interactive: false,
            allow_prompt_when_simulation_fails: true,
        }
    }
}

impl ProxyPolicy {
    /// The decision table over (risky, simulation failed, interactive).
    pub fn decide(&self, recommendation: Recommendation, simulation_success: bool) -> PolicyAction {
        let risky = recommendation.at_least(self.threshold);
        let sim_failed = !simulation_success;

        if !risky && !sim_failed {
            return PolicyAction::Forward;
        }
        if !self.interactive {
            return PolicyAction::Block;
        }
        if sim_failed && !self.allow_prompt_when_simulation_fails {
            return PolicyAction::Block;
        }
        match self.on_risk {
            OnRisk::Prompt => PolicyAction::Prompt,
            OnRisk::Block => PolicyAction::Block,
        }
    }
}
