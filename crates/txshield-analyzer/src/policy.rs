//! Analyze-time policies: which providers run and for how long.

use std::time::Duration;

use crate::providers::ProviderKind;

/// The provider set and time budgets for a scan.
///
/// `Wallet` is the degraded interactive mode used by the proxy: a hard
/// overall budget with tight per-provider slices, and the slow providers
/// (labels, explorer metadata, token security) disabled outright. Both the
/// per-provider timeout and the overall budget are enforced; whichever is
/// tighter wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzePolicy {
    #[default]
    Default,
    Wallet,
}

impl AnalyzePolicy {
    /// The overall budget, when this policy has one.
    pub fn overall_budget(&self) -> Option<Duration> {
        match self {
            AnalyzePolicy::Default => None,
            AnalyzePolicy::Wallet => Some(Duration::from_millis(3_000)),
        }
    }

    /// Whether a provider participates under this policy.
    pub fn enables(&self, kind: ProviderKind) -> bool {
        match self {
            AnalyzePolicy::Default => true,
            AnalyzePolicy::Wallet => matches!(
                kind,
                ProviderKind::Rpc
                    | ProviderKind::Sourcify
                    | ProviderKind::ProxyDetect
                    | ProviderKind::ProtocolRegistry
                    | ProviderKind::ImplSourcify
                    | ProviderKind::ImplProtocol
            ),
        }
    }

    /// The per-provider timeout.
    pub fn provider_timeout(&self, kind: ProviderKind) -> Duration {
        match self {
            AnalyzePolicy::Default => Duration::from_millis(10_000),
            AnalyzePolicy::Wallet => Duration::from_millis(match kind {
                ProviderKind::Rpc => 800,
                ProviderKind::Sourcify => 1_600,
                ProviderKind::ProxyDetect => 800,
                ProviderKind::ProtocolRegistry => 250,
                ProviderKind::ImplSourcify => 1_000,
                ProviderKind::ImplProtocol => 200,
                // Disabled under wallet mode; the value is never used.
                _ => 0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_everything() {
        for kind in ProviderKind::ALL {
            assert!(AnalyzePolicy::Default.enables(kind));
            assert_eq!(
                AnalyzePolicy::Default.provider_timeout(kind),
                Duration::from_millis(10_000)
            );
        }
        assert!(AnalyzePolicy::Default.overall_budget().is_none());
    }

    #[test]
    fn test_wallet_disables_slow_providers() {
        assert!(!AnalyzePolicy::Wallet.enables(ProviderKind::Labels));
        assert!(!AnalyzePolicy::Wallet.enables(ProviderKind::Etherscan));
        assert!(!AnalyzePolicy::Wallet.enables(ProviderKind::TokenSecurity));
        assert!(AnalyzePolicy::Wallet.enables(ProviderKind::Rpc));
    }

    #[test]
    fn test_wallet_budgets() {
        assert_eq!(
            AnalyzePolicy::Wallet.overall_budget(),
            Some(Duration::from_millis(3_000))
        );
        assert_eq!(
            AnalyzePolicy::Wallet.provider_timeout(ProviderKind::Sourcify),
            Duration::from_millis(1_600)
        );
        assert_eq!(
            AnalyzePolicy::Wallet.provider_timeout(ProviderKind::ImplProtocol),
            Duration::from_millis(200)
        );
    }
}
