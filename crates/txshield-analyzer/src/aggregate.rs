//! Finding aggregation and verdict derivation.
//!
//! The aggregator merges provider outputs into contract intelligence,
//! produces findings in a deterministic order, deduplicates by code, and
//! derives the recommendation through [`recommend`], a pure function of
//! the finding set. Simulation evidence is folded in afterwards and can
//! only raise `ok` to `caution`; it never downgrades.

use alloy_primitives::{Address, U256};
use serde_json::json;
use txshield_types::{
    Allowlist, CalldataInput, CallStandard, Chain, Confidence, ConfidenceLevel, ContractInfo,
    DecodedCall, Finding, FindingCode, ProtocolMatch, Recommendation, Severity, SimulationResult,
    Value,
};

use crate::fanout::FanoutOutput;
use crate::providers::protocol;

/// Contracts younger than this read as new.
const NEW_CONTRACT_DAYS: u64 = 30;
/// Fewer lifetime transactions than this reads as low activity.
const LOW_ACTIVITY_TXS: u64 = 10;
/// A buy or sell tax above this fraction is worth flagging.
const HIGH_TAX_THRESHOLD: f64 = 0.10;

/// Merges provider outputs into the contract picture, in provider order.
pub fn merge_contract(fanout: &FanoutOutput, address: Address, chain: Chain) -> ContractInfo {
    let mut contract = ContractInfo::new(address, chain);

    if let Some(rpc) = fanout.rpc.ok() {
        contract.is_contract = Some(rpc.is_contract);
    }
    if let Some(verification) = fanout.verification.ok() {
        contract.verified = verification.verified;
        contract.name = verification.name.clone();
    }
    if let Some(metadata) = fanout.metadata.ok() {
        contract.age_days = metadata.age_days;
        contract.tx_count = metadata.tx_count;
    }
    if let Some(proxy) = fanout.proxy.ok() {
        contract.is_proxy = proxy.is_proxy;
        contract.proxy_type = proxy.proxy_type;
        contract.implementation = proxy.implementation;
        contract.beacon = proxy.beacon;
        if proxy.is_proxy {
            contract.proxy_name = contract.name.clone();
        }
    }
    if let Some(impl_verification) = fanout.impl_verification.ok() {
        contract.implementation_name = impl_verification.name.clone();
        // A verified implementation behind an unverified shell still counts.
        if impl_verification.verified && !contract.verified {
            contract.verified = true;
        }
    }
    contract
}

/// Two-tier protocol resolution: the canonical table first, then the
/// keyword heuristic over every name any provider recovered.
pub fn resolve_protocol(fanout: &FanoutOutput, contract: &ContractInfo) -> Option<ProtocolMatch> {
    if let Some(output) = fanout.protocol.ok() {
        if let Some(matched) = &output.matched {
            return Some(matched.clone());
        }
    }
    if let Some(output) = fanout.impl_protocol.ok() {
        if let Some(matched) = &output.matched {
            return Some(matched.clone());
        }
    }
    let names = [
        contract.name.as_deref(),
        contract.proxy_name.as_deref(),
        contract.implementation_name.as_deref(),
    ];
    protocol::lookup_by_names(names.into_iter().flatten())
}

/// Produces the finding set for a scan, sorted and deduplicated.
#[allow(clippy::too_many_arguments)]
pub fn collect_findings(
    input: &CalldataInput,
    contract: &ContractInfo,
    protocol_match: Option<&ProtocolMatch>,
    fanout: &FanoutOutput,
    decoded: Option<&DecodedCall>,
    simulation: Option<&SimulationResult>,
    spender_is_contract: Option<bool>,
    allowlist: &Allowlist,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(labels) = fanout.labels.ok() {
        if labels.tags.iter().any(|tag| tag == "phishing") {
            findings.push(
                Finding::danger(
                    FindingCode::KnownPhishing,
                    "Address is tagged as a known phishing target",
                )
                .with_detail("tags", json!(labels.tags)),
            );
        }
    }

    if let Some(token) = fanout.token_security.ok() {
        if token.is_honeypot {
            findings.push(Finding::danger(
                FindingCode::Honeypot,
                "Token is flagged as a honeypot: selling may be impossible",
            ));
        }
        if token.owner_can_change_balance || token.can_take_back_ownership || token.hidden_owner {
            findings.push(Finding::danger(
                FindingCode::OwnerDrain,
                "Token owner can modify balances or reclaim ownership",
            ));
        }
        if token.is_mintable {
            findings.push(Finding::warning(
                FindingCode::HiddenMint,
                "Token supply can be minted after deployment",
            ));
        }
        if token.selfdestruct {
            findings.push(Finding::warning(
                FindingCode::Selfdestruct,
                "Token contract contains selfdestruct",
            ));
        }
        if token.is_blacklisted {
            findings.push(Finding::warning(
                FindingCode::Blacklist,
                "Token supports blacklisting holders",
            ));
        }
        let worst_tax = token.buy_tax.into_iter().chain(token.sell_tax).fold(0.0, f64::max);
        if worst_tax > HIGH_TAX_THRESHOLD {
            findings.push(
                Finding::warning(FindingCode::HighTax, "Token charges a high transfer tax")
                    .with_detail("tax", json!(worst_tax)),
            );
        }
    }

    let to_allowlisted = allowlist.to.contains(&input.to);
    if contract.verified {
        findings.push(Finding::safe(
            FindingCode::Verified,
            "Contract source is verified",
        ));
    } else if contract.is_contract != Some(false) && !to_allowlisted {
        findings.push(Finding::warning(
            FindingCode::Unverified,
            "Contract source is not verified",
        ));
    }

    if contract.is_contract == Some(false) && !input.is_empty_data() {
        findings.push(Finding::info(
            FindingCode::NotAContract,
            "Target address has no code; calldata will be ignored",
        ));
    }

    if contract.is_proxy {
        let mut finding = Finding::warning(
            FindingCode::Upgradeable,
            "Contract is a proxy and can be upgraded",
        );
        if let Some(proxy_type) = contract.proxy_type {
            finding = finding.with_detail("proxyType", json!(proxy_type));
        }
        findings.push(finding);
    }

    match (fanout.metadata.ok(), &fanout.metadata) {
        (Some(metadata), _) => {
            if let Some(age) = metadata.age_days {
                if age < NEW_CONTRACT_DAYS && !to_allowlisted {
                    findings.push(
                        Finding::warning(
                            FindingCode::NewContract,
                            format!("Contract is only {age} days old"),
                        )
                        .with_detail("ageDays", json!(age)),
                    );
                }
            }
            if let Some(tx_count) = metadata.tx_count {
                if tx_count < LOW_ACTIVITY_TXS && !to_allowlisted {
                    findings.push(
                        Finding::info(
                            FindingCode::LowActivity,
                            format!("Only {tx_count} transactions on record"),
                        )
                        .with_detail("txCount", json!(tx_count)),
                    );
                }
            }
        }
        (None, crate::providers::ProviderReport::Skipped) => {}
        (None, _) => {
            findings.push(Finding::info(
                FindingCode::MetadataUnavailable,
                "Explorer metadata unavailable",
            ));
        }
    }

    if let Some(matched) = protocol_match {
        findings.push(
            Finding::safe(
                FindingCode::KnownProtocol,
                format!("Recognized protocol: {}", matched.name),
            )
            .with_detail("slug", json!(matched.slug))
            .with_detail("matchedBy", json!(matched.matched_by)),
        );
    } else if let Some(finding) = typosquat_finding(contract) {
        findings.push(finding);
    }

    findings.extend(calldata_findings(input, decoded, spender_is_contract, allowlist));
    findings.extend(unlimited_approval_findings(decoded, simulation, allowlist));

    finalize(findings)
}

/// Findings derived purely from the decode outcome.
fn calldata_findings(
    input: &CalldataInput,
    decoded: Option<&DecodedCall>,
    spender_is_contract: Option<bool>,
    allowlist: &Allowlist,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    if input.is_empty_data() {
        if input.value > U256::ZERO {
            findings.push(Finding::info(
                FindingCode::CalldataEmpty,
                "Plain value transfer with no calldata",
            ));
        }
        return findings;
    }

    match decoded {
        None => findings.push(Finding::info(
            FindingCode::CalldataUnknownSelector,
            "Calldata is too short to carry a selector",
        )),
        Some(call) if call.args.is_empty() && call.source == txshield_types::DecodeSource::LocalSelector && call.inner_calls.is_empty() && call.commands.is_empty() => {
            findings.push(
                Finding::info(
                    FindingCode::CalldataUnknownSelector,
                    format!("Selector {} could not be resolved", call.selector),
                )
                .with_detail("selector", json!(call.selector.to_string())),
            );
        }
        Some(call) => {
            if let Some(spender) = approval_spender(call) {
                let spender_allowlisted = allowlist.spenders.contains(&spender);
                if spender_is_contract == Some(false) && !spender_allowlisted {
                    findings.push(
                        Finding::warning(
                            FindingCode::ApprovalToEoa,
                            "Approval spender is an externally owned account",
                        )
                        .with_detail("spender", json!(format!("{spender:#x}"))),
                    );
                }
            }
        }
    }
    findings
}

/// The spender of an approval-shaped call, when there is one.
pub(crate) fn approval_spender(call: &DecodedCall) -> Option<Address> {
    match (call.standard, call.function_name.as_str()) {
        (Some(CallStandard::Erc20), "approve") => {
            call.arg("spender", 0).and_then(Value::as_address)
        }
        (Some(CallStandard::Eip2612), "permit") => {
            call.arg("spender", 1).and_then(Value::as_address)
        }
        (None, "setApprovalForAll") => call.arg("operator", 0).and_then(Value::as_address),
        _ => None,
    }
}

/// The max-uint unlimited approval checks, from decode and from simulated
/// approval deltas (Permit2's uint160 max).
fn unlimited_approval_findings(
    decoded: Option<&DecodedCall>,
    simulation: Option<&SimulationResult>,
    allowlist: &Allowlist,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let permit2_max = (U256::from(1u64) << 160) - U256::from(1u64);

    if let Some(call) = decoded {
        let unlimited = match call.standard {
            Some(CallStandard::Erc20) if call.function_name == "approve" => {
                call.arg("amount", 1).and_then(Value::as_uint) == Some(U256::MAX)
            }
            Some(CallStandard::Eip2612) if call.function_name == "permit" => {
                call.arg("value", 2).and_then(Value::as_uint) == Some(U256::MAX)
            }
            _ => false,
        };
        let spender = approval_spender(call);
        let suppressed = spender.is_some_and(|s| allowlist.spenders.contains(&s));
        if unlimited && !suppressed {
            let mut finding = Finding::warning(
                FindingCode::UnlimitedApproval,
                "Approval is for an unlimited amount",
            );
            if let Some(spender) = spender {
                finding = finding.with_detail("spender", json!(format!("{spender:#x}")));
            }
            findings.push(finding);
        }
    }

    if let Some(simulation) = simulation {
        for change in &simulation.approvals.changes {
            let amount = change.amount.unwrap_or(U256::ZERO);
            if (amount == U256::MAX || amount == permit2_max)
                && !allowlist.spenders.contains(&change.spender)
            {
                findings.push(
                    Finding::warning(
                        FindingCode::UnlimitedApproval,
                        "Simulated approval delta grants an unlimited allowance",
                    )
                    .with_detail("spender", json!(format!("{:#x}", change.spender)))
                    .with_detail("standard", json!(change.standard)),
                );
            }
        }
    }
    findings
}

/// Findings for a standalone approval review (`approval` subcommand).
pub fn approval_findings(
    token: Address,
    spender: Address,
    amount: U256,
    expected: Option<Address>,
    spender_is_contract: Option<bool>,
    allowlist: &Allowlist,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let spender_allowlisted = allowlist.spenders.contains(&spender);

    if let Some(expected) = expected {
        if expected != spender {
            findings.push(
                Finding::danger(
                    FindingCode::ApprovalTargetMismatch,
                    "Approval spender does not match the expected address",
                )
                .with_detail("expected", json!(format!("{expected:#x}")))
                .with_detail("spender", json!(format!("{spender:#x}"))),
            );
        }
    }
    if amount == U256::MAX && !spender_allowlisted {
        findings.push(
            Finding::warning(
                FindingCode::UnlimitedApproval,
                "Approval is for an unlimited amount",
            )
            .with_detail("token", json!(format!("{token:#x}"))),
        );
    }
    if spender_is_contract == Some(false) && !spender_allowlisted {
        findings.push(Finding::warning(
            FindingCode::ApprovalToEoa,
            "Approval spender is an externally owned account",
        ));
    }
    findings
}

/// Name-similarity check against the protocol vocabulary. Only fires when
/// the registry found no legitimate match.
fn typosquat_finding(contract: &ContractInfo) -> Option<Finding> {
    let name = contract.name.as_deref()?;
    let lowered = name.to_ascii_lowercase();
    for word in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.len() < 4 {
            continue;
        }
        for keyword in protocol::keyword_vocabulary() {
            let distance = levenshtein(word, keyword);
            if distance > 0 && distance <= 2 && keyword.len() >= 4 {
                return Some(
                    Finding::warning(
                        FindingCode::PossibleTyposquat,
                        format!("Contract name {name:?} is suspiciously close to {keyword:?}"),
                    )
                    .with_detail("similarTo", json!(keyword)),
                );
            }
        }
    }
    None
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut previous = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous + usize::from(ca != cb);
            previous = row[j + 1];
            row[j + 1] = substitution.min(previous + 1).min(row[j] + 1);
        }
    }
    row[b.len()]
}

/// Sorts by severity bucket then code priority, and deduplicates by code
/// keeping the first (highest-severity, lowest-priority) copy.
pub fn finalize(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| a.code.priority().cmp(&b.code.priority()))
    });
    let mut seen = std::collections::HashSet::new();
    findings.retain(|finding| seen.insert(finding.code));
    findings
}

/// The recommendation function: a pure function of the final finding set.
///
/// Any danger wins outright. A single warning reads as a sharp `warning`;
/// several independent warnings read as diffuse `caution`.
pub fn recommend(findings: &[Finding]) -> Recommendation {
    if findings.iter().any(|f| f.level == Severity::Danger) {
        return Recommendation::Danger;
    }
    let warnings = findings
        .iter()
        .filter(|f| f.level == Severity::Warning)
        .count();
    match warnings {
        0 => Recommendation::Ok,
        1 => Recommendation::Warning,
        _ => Recommendation::Caution,
    }
}

/// Derives confidence from which providers answered.
pub fn derive_confidence(fanout: &FanoutOutput) -> Confidence {
    let mut confidence = Confidence::high();
    let verified = fanout
        .verification
        .ok()
        .map(|v| v.verified)
        .unwrap_or(false);
    let has_metadata = fanout.metadata.is_ok();

    if !verified {
        let level = if has_metadata {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };
        confidence.downgrade(level, "source verification unavailable");
        if !has_metadata {
            confidence.downgrade(ConfidenceLevel::Low, "explorer metadata unavailable");
        }
    }
    confidence
}

/// Folds the simulation outcome into the recommendation.
///
/// A failed simulation raises `ok` to `caution` and never lowers anything.
/// Incomplete coverage is surfaced by the renderer but leaves the stored
/// recommendation untouched beyond `caution`.
pub fn fold_simulation(
    recommendation: Recommendation,
    simulation: &SimulationResult,
    findings: &mut Vec<Finding>,
) -> Recommendation {
    let mut folded = recommendation;
    if !simulation.success {
        let mut finding = Finding::warning(FindingCode::SimFailed, "Simulation reverted");
        if let Some(reason) = &simulation.revert_reason {
            finding = finding.with_detail("revertReason", json!(reason));
        }
        findings.push(finding);
        if folded == Recommendation::Ok {
            folded = Recommendation::Caution;
        }
    }
    if simulation.coverage_incomplete() {
        findings.push(Finding::info(
            FindingCode::SimPartialCoverage,
            "Simulation could not account for every balance or approval change",
        ));
    }
    *findings = finalize(std::mem::take(findings));
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(code: FindingCode) -> Finding {
        Finding::warning(code, "w")
    }

    #[test]
    fn test_recommend_table() {
        assert_eq!(recommend(&[]), Recommendation::Ok);
        assert_eq!(
            recommend(&[Finding::safe(FindingCode::Verified, "s")]),
            Recommendation::Ok
        );
        assert_eq!(
            recommend(&[warning(FindingCode::Upgradeable)]),
            Recommendation::Warning
        );
        assert_eq!(
            recommend(&[
                warning(FindingCode::Upgradeable),
                warning(FindingCode::NewContract)
            ]),
            Recommendation::Caution
        );
        assert_eq!(
            recommend(&[
                warning(FindingCode::Upgradeable),
                Finding::danger(FindingCode::Honeypot, "d")
            ]),
            Recommendation::Danger
        );
    }

    #[test]
    fn test_recommend_one_warning_plus_info_stays_warning() {
        let findings = vec![
            warning(FindingCode::Upgradeable),
            Finding::info(FindingCode::LowActivity, "i"),
            Finding::safe(FindingCode::Verified, "s"),
        ];
        assert_eq!(recommend(&findings), Recommendation::Warning);
    }

    #[test]
    fn test_danger_addition_is_monotone() {
        // Adding a danger finding never lowers the verdict, and info/safe
        // additions never change it.
        let base = vec![warning(FindingCode::Upgradeable)];
        let before = recommend(&base);
        let mut with_danger = base.clone();
        with_danger.push(Finding::danger(FindingCode::KnownPhishing, "d"));
        assert!(recommend(&with_danger) >= before);

        let mut with_info = base.clone();
        with_info.push(Finding::info(FindingCode::LowActivity, "i"));
        assert_eq!(recommend(&with_info), before);
    }

    #[test]
    fn test_finalize_orders_and_dedupes() {
        let findings = vec![
            Finding::info(FindingCode::LowActivity, "low"),
            Finding::warning(FindingCode::UnlimitedApproval, "warn copy"),
            Finding::danger(FindingCode::Honeypot, "danger"),
            Finding::info(FindingCode::UnlimitedApproval, "info copy"),
            Finding::safe(FindingCode::Verified, "safe"),
        ];
        let finalized = finalize(findings);
        let codes: Vec<FindingCode> = finalized.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec![
                FindingCode::Honeypot,
                FindingCode::UnlimitedApproval,
                FindingCode::LowActivity,
                FindingCode::Verified,
            ]
        );
        // The surviving UNLIMITED_APPROVAL copy is the higher-severity one.
        assert_eq!(finalized[1].level, Severity::Warning);
        assert_eq!(finalized[1].message, "warn copy");
    }

    #[test]
    fn test_fold_simulation_raises_ok_to_caution() {
        let mut sim = SimulationResult::empty();
        sim.success = false;
        let mut findings = Vec::new();
        let folded = fold_simulation(Recommendation::Ok, &sim, &mut findings);
        assert_eq!(folded, Recommendation::Caution);
        assert!(findings.iter().any(|f| f.code == FindingCode::SimFailed));
    }

    #[test]
    fn test_fold_simulation_never_downgrades_danger() {
        let mut sim = SimulationResult::empty();
        sim.success = false;
        let mut findings = Vec::new();
        let folded = fold_simulation(Recommendation::Danger, &sim, &mut findings);
        assert_eq!(folded, Recommendation::Danger);
    }

    #[test]
    fn test_fold_partial_coverage_keeps_recommendation() {
        let mut sim = SimulationResult::empty();
        sim.balances.confidence = txshield_types::SimConfidence::Medium;
        let mut findings = Vec::new();
        let folded = fold_simulation(Recommendation::Ok, &sim, &mut findings);
        assert_eq!(folded, Recommendation::Ok);
        assert!(findings.iter().any(|f| f.code == FindingCode::SimPartialCoverage));
    }

    fn empty_fanout() -> FanoutOutput {
        use crate::providers::ProviderReport;
        FanoutOutput {
            rpc: ProviderReport::Skipped,
            verification: ProviderReport::Skipped,
            labels: ProviderReport::Skipped,
            metadata: ProviderReport::Skipped,
            proxy: ProviderReport::Skipped,
            protocol: ProviderReport::Skipped,
            impl_verification: ProviderReport::Skipped,
            impl_protocol: ProviderReport::Skipped,
            token_security: ProviderReport::Skipped,
        }
    }

    #[test]
    fn test_unlimited_approve_appends_warning() {
        use alloy_primitives::{Bytes, address};
        use txshield_types::{Args, DecodeSource};

        let token = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let input = CalldataInput {
            to: token,
            from: None,
            data: Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3]),
            value: U256::ZERO,
            chain: Some(Chain::Ethereum),
            authorization_list: Vec::new(),
        };
        let call = DecodedCall {
            selector: Default::default(),
            signature: "approve(address,uint256)".to_string(),
            function_name: "approve".to_string(),
            source: DecodeSource::KnownAbi,
            standard: Some(CallStandard::Erc20),
            args: Args::Named(vec![
                ("spender".to_string(), Value::Address(Address::repeat_byte(0x01))),
                ("amount".to_string(), Value::Uint(U256::MAX)),
            ]),
            arg_names: vec![],
            arg_types: vec![],
            alternates: vec![],
            inner_calls: vec![],
            commands: vec![],
        };
        let fanout = empty_fanout();
        let contract = merge_contract(&fanout, token, Chain::Ethereum);
        let findings = collect_findings(
            &input,
            &contract,
            None,
            &fanout,
            Some(&call),
            None,
            None,
            &Allowlist::default(),
        );
        assert!(findings.iter().any(|f| {
            f.code == FindingCode::UnlimitedApproval && f.level == Severity::Warning
        }));
    }

    #[test]
    fn test_verified_proxy_scan_is_single_warning() {
        use crate::providers::{ProviderReport, ProxyDetectOutput, VerificationOutput};
        use txshield_types::ProxyType;

        let mut fanout = empty_fanout();
        fanout.verification = ProviderReport::Ok(VerificationOutput {
            verified: true,
            name: Some("USD Coin".to_string()),
            abi: None,
        });
        fanout.proxy = ProviderReport::Ok(ProxyDetectOutput {
            is_proxy: true,
            proxy_type: Some(ProxyType::Eip1967),
            implementation: Some(Address::repeat_byte(0x22)),
            beacon: None,
        });

        let address = Address::repeat_byte(0x11);
        let contract = merge_contract(&fanout, address, Chain::Ethereum);
        assert!(contract.verified);
        assert!(contract.is_proxy);

        let input = CalldataInput::address_only(address, Some(Chain::Ethereum));
        let findings = collect_findings(
            &input,
            &contract,
            None,
            &fanout,
            None,
            None,
            None,
            &Allowlist::default(),
        );
        let codes: Vec<FindingCode> = findings.iter().map(|f| f.code).collect();
        assert!(codes.contains(&FindingCode::Verified));
        assert!(codes.contains(&FindingCode::Upgradeable));
        assert_eq!(recommend(&findings), Recommendation::Warning);
        assert_eq!(derive_confidence(&fanout).level, ConfidenceLevel::High);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("uniswap", "uniswap"), 0);
        assert_eq!(levenshtein("uniswab", "uniswap"), 1);
        assert_eq!(levenshtein("unisvvap", "uniswap"), 2);
        assert_eq!(levenshtein("abc", "xyz"), 3);
    }
}
