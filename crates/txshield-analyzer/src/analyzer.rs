//! The scan orchestrator: decode, fan out, simulate, aggregate.

use alloy_primitives::Address;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use txshield_decoder::{DecodeContext, Decoder, SelectorResolver, build_intent};
use txshield_types::{
    AnalysisResult, AppConfig, CalldataInput, Chain, DecodedCall, Finding, FindingCode,
    Recommendation, Severity,
};
use url::Url;

use crate::aggregate;
use crate::fanout::{FanoutInputs, run_fanout};
use crate::http::HttpClient;
use crate::policy::AnalyzePolicy;
use crate::providers::rpc::RpcCaller;
use crate::providers::{ProgressEvent, labels};
use crate::signature_source::OpenchainSource;
use crate::simulate::{HeuristicSimulator, Simulator};

/// Per-scan options.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub policy: AnalyzePolicy,
    /// Whether to run the configured simulator at all (`--no-sim` clears
    /// it; address-only scans never simulate).
    pub simulate: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        AnalyzeOptions {
            policy: AnalyzePolicy::Default,
            simulate: true,
        }
    }
}

/// A configured analyzer, shared by the CLI and the proxy.
pub struct Analyzer {
    config: AppConfig,
    client: HttpClient,
    resolver: SelectorResolver,
    simulator: Arc<dyn Simulator>,
}

impl Analyzer {
    pub fn new(config: AppConfig, client: HttpClient) -> Self {
        let resolver = SelectorResolver::new(Arc::new(OpenchainSource::new(client.clone())));
        Analyzer {
            config,
            client,
            resolver,
            simulator: Arc::new(HeuristicSimulator),
        }
    }

    /// Swaps the simulation backend (the fork-backed one lives outside
    /// this crate).
    pub fn with_simulator(mut self, simulator: Arc<dyn Simulator>) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn rpc_caller(&self, chain: Chain) -> Option<RpcCaller> {
        let url = self.config.rpc_url(chain)?;
        let url = Url::parse(url).ok()?;
        Some(RpcCaller::new(self.client.clone(), url))
    }

    /// Runs a full scan. Provider failures are isolated; this function
    /// itself cannot fail.
    pub async fn analyze(
        &self,
        input: &CalldataInput,
        chain: Chain,
        options: AnalyzeOptions,
        progress: Option<&UnboundedSender<ProgressEvent>>,
    ) -> AnalysisResult {
        let fanout_inputs = FanoutInputs {
            client: self.client.clone(),
            rpc: self.rpc_caller(chain),
            chain,
            address: input.to,
            etherscan_key: self.config.etherscan_key(chain).map(str::to_string),
            labels_base: labels::configured_base(),
        };
        let fanout = run_fanout(&fanout_inputs, options.policy, progress).await;

        let contract = aggregate::merge_contract(&fanout, input.to, chain);
        let protocol_match = aggregate::resolve_protocol(&fanout, &contract);

        let decoded = self.decode(input, &fanout).await;
        let intent = build_intent(input, decoded.as_ref());

        let simulation = if options.simulate
            && self.config.simulation.enabled
            && !input.is_empty_data()
        {
            self.simulator.simulate(input, decoded.as_ref()).await
        } else {
            None
        };

        let spender_is_contract = self
            .spender_is_contract(chain, decoded.as_ref())
            .await;

        let mut findings = aggregate::collect_findings(
            input,
            &contract,
            protocol_match.as_ref(),
            &fanout,
            decoded.as_ref(),
            simulation.as_ref(),
            spender_is_contract,
            &self.config.allowlist,
        );
        let mut recommendation = aggregate::recommend(&findings);
        if let Some(simulation) = &simulation {
            recommendation = aggregate::fold_simulation(recommendation, simulation, &mut findings);
        }
        let confidence = aggregate::derive_confidence(&fanout);

        AnalysisResult {
            protocol: protocol_match.as_ref().map(|m| m.name.clone()),
            protocol_match,
            contract,
            findings,
            confidence,
            recommendation,
            intent,
            simulation,
        }
    }

    async fn decode(&self, input: &CalldataInput, fanout: &crate::fanout::FanoutOutput) -> Option<DecodedCall> {
        if input.is_empty_data() {
            return None;
        }
        let abi = fanout.verification.ok().and_then(|v| v.abi.as_ref());
        let decoder = match abi {
            Some(abi) => Decoder::new().with_contract_abi(abi),
            None => Decoder::new(),
        };
        decoder
            .with_resolver(&self.resolver)
            .decode(&input.data, DecodeContext::root())
            .await
    }

    /// Best-effort code check on an approval spender. `None` when there is
    /// no spender or no RPC endpoint to ask.
    async fn spender_is_contract(
        &self,
        chain: Chain,
        decoded: Option<&DecodedCall>,
    ) -> Option<bool> {
        let spender = decoded.and_then(aggregate::approval_spender)?;
        let caller = self.rpc_caller(chain)?;
        let code = caller.get_code(spender).await.ok()?;
        Some(!crate::providers::rpc::is_empty_code(&code))
    }

    /// Standalone approval review used by the `approval` subcommand: scans
    /// the spender and layers the approval-specific findings on top.
    pub async fn analyze_approval(
        &self,
        token: Address,
        spender: Address,
        amount: alloy_primitives::U256,
        expected: Option<Address>,
        chain: Chain,
        options: AnalyzeOptions,
    ) -> AnalysisResult {
        let input = CalldataInput::address_only(spender, Some(chain));
        let mut result = self.analyze(&input, chain, options, None).await;

        let spender_is_contract = result.contract.is_contract;
        let mut extra = aggregate::approval_findings(
            token,
            spender,
            amount,
            expected,
            spender_is_contract,
            &self.config.allowlist,
        );
        // A spender that already scans as dangerous makes the approval
        // itself dangerous.
        if result
            .findings
            .iter()
            .any(|f: &Finding| f.level == Severity::Danger)
        {
            extra.push(Finding::danger(
                FindingCode::ApprovalToDangerousContract,
                "Approval spender carries danger findings of its own",
            ));
        }
        result.findings.extend(extra);
        result.findings = aggregate::finalize(std::mem::take(&mut result.findings));
        let rebased = aggregate::recommend(&result.findings);
        // Re-deriving can only use the richer finding set; keep the higher.
        result.recommendation = Recommendation::max(result.recommendation, rebased);
        result
    }
}
