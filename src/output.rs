//! Report rendering: text, JSON, and SARIF.
//!
//! The text verdict line is deliberately stricter than the stored
//! recommendation: incomplete simulation coverage renders as a BLOCK even
//! though the underlying `recommendation` field (and therefore the JSON
//! and SARIF output) is never raised past `caution` by coverage alone.

use serde_json::{Value as JsonValue, json};
use txshield_types::{
    AnalysisResult, CalldataInput, ConfidenceLevel, Recommendation, Severity,
};
use uuid::Uuid;

/// The rendered verdict banner for the text format.
pub fn verdict_line(result: &AnalysisResult) -> String {
    let coverage_incomplete = result
        .simulation
        .as_ref()
        .is_some_and(|sim| sim.coverage_incomplete());
    match result.recommendation {
        Recommendation::Danger => "BLOCK".to_string(),
        _ if coverage_incomplete => "BLOCK \u{2014} simulation coverage incomplete".to_string(),
        Recommendation::Warning => "WARN".to_string(),
        Recommendation::Caution => "CAUTION".to_string(),
        Recommendation::Ok => "OK".to_string(),
    }
}

pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", verdict_line(result)));
    out.push_str(&format!(
        "target: {:#x} ({})\n",
        result.contract.address, result.contract.chain
    ));
    if let Some(name) = &result.contract.name {
        out.push_str(&format!("name: {name}\n"));
    }
    if let Some(protocol) = &result.protocol {
        out.push_str(&format!("protocol: {protocol}\n"));
    }
    if let Some(intent) = &result.intent {
        out.push_str(&format!("intent: {intent}\n"));
    }
    out.push_str(&format!(
        "recommendation: {} (confidence: {})\n",
        result.recommendation,
        confidence_name(result.confidence.level)
    ));

    if !result.findings.is_empty() {
        out.push('\n');
        for finding in &result.findings {
            let marker = match finding.level {
                Severity::Danger => "[!!]",
                Severity::Warning => "[ !]",
                Severity::Info => "[ i]",
                Severity::Safe => "[ok]",
            };
            out.push_str(&format!("{marker} {}: {}\n", finding.code, finding.message));
        }
    }

    if let Some(simulation) = &result.simulation {
        out.push('\n');
        if simulation.success {
            out.push_str("simulation: success\n");
        } else {
            out.push_str(&format!(
                "simulation: reverted{}\n",
                simulation
                    .revert_reason
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default()
            ));
        }
        for change in &simulation.balances.changes {
            let sign = match change.direction {
                txshield_types::ChangeDirection::In => "+",
                txshield_types::ChangeDirection::Out => "-",
            };
            out.push_str(&format!(
                "  {sign}{} {}\n",
                change.amount,
                change.symbol.as_deref().unwrap_or("(token)")
            ));
        }
        for change in &simulation.approvals.changes {
            out.push_str(&format!(
                "  approval: {:#x} may spend {} of {:#x}\n",
                change.spender,
                change
                    .amount
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "all".to_string()),
                change.token
            ));
        }
    }
    out
}

/// The machine-readable schema: `{requestId, scan: {...}}`.
pub fn render_json(input: &CalldataInput, result: &AnalysisResult) -> JsonValue {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "scan": {
            "input": input,
            "recommendation": result.recommendation,
            "confidence": confidence_score(result.confidence.level),
            "findings": result.findings.iter().map(|finding| json!({
                "code": finding.code,
                "severity": finding.level,
                "message": finding.message,
                "details": finding.details,
                "refs": finding.refs,
            })).collect::<Vec<_>>(),
            "contract": {
                "address": format!("{:#x}", result.contract.address),
                "chain": result.contract.chain,
                "isContract": result.contract.is_contract,
                "name": result.contract.name,
                "isProxy": result.contract.is_proxy,
                "implementation": result.contract.implementation.map(|a| format!("{a:#x}")),
                "verifiedSource": result.contract.verified,
                "tags": result.protocol_match.as_ref().map(|m| vec![m.slug.clone()]).unwrap_or_default(),
            },
            "intent": result.intent,
            "simulation": result.simulation,
        }
    })
}

/// SARIF 2.1.0, one result per finding.
pub fn render_sarif(result: &AnalysisResult) -> JsonValue {
    let rules: Vec<JsonValue> = result
        .findings
        .iter()
        .map(|finding| {
            json!({
                "id": finding.code,
                "shortDescription": { "text": finding.message }
            })
        })
        .collect();
    let results: Vec<JsonValue> = result
        .findings
        .iter()
        .map(|finding| {
            json!({
                "ruleId": finding.code,
                "level": sarif_level(finding.level),
                "message": { "text": finding.message },
                "properties": {
                    "details": finding.details,
                    "refs": finding.refs,
                }
            })
        })
        .collect();
    json!({
        "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "txshield",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                }
            },
            "results": results,
        }]
    })
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Danger => "error",
        Severity::Warning => "warning",
        Severity::Info | Severity::Safe => "note",
    }
}

fn confidence_score(level: ConfidenceLevel) -> f64 {
    match level {
        ConfidenceLevel::High => 0.9,
        ConfidenceLevel::Medium => 0.6,
        ConfidenceLevel::Low => 0.3,
    }
}

fn confidence_name(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    }
}

/// Exit code 2 iff the recommendation reaches the threshold.
pub fn exit_code(recommendation: Recommendation, fail_on: Recommendation) -> i32 {
    if recommendation.at_least(fail_on) { 2 } else { 0 }
}
