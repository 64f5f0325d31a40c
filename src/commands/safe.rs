//! `txshield safe`: review a Safe transaction from a local JSON file.
//!
//! The Safe Transaction Service client lives outside this tool; the
//! command ingests the transaction JSON the service would have returned
//! (`--safe-tx-json`). MultiSend batches are unpacked and every resolved
//! target analyzed, three at a time.

use alloy_primitives::{Address, Bytes, U256};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use txshield_analyzer::{AnalyzeOptions, Analyzer, run_bounded};
use txshield_decoder::decode_multisend;
use txshield_types::{AppConfig, CalldataInput, Recommendation, parse_quantity};

use crate::cli::{OutputFormat, SafeArgs};
use crate::commands::{build_http_client, write_report};
use crate::output;

/// Safe Transaction Service payload, trimmed to the fields the scan uses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafeTxJson {
    to: Address,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    operation: u8,
    #[serde(default)]
    safe: Option<Address>,
}

/// `multiSend(bytes)` selector.
const MULTISEND_SELECTOR: [u8; 4] = [0x8d, 0x80, 0xff, 0x0a];

pub async fn run(args: SafeArgs, config: AppConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let path = args.safe_tx_json.as_deref().ok_or(
        "no --safe-tx-json given; export the transaction JSON from the Safe Transaction Service",
    )?;
    let raw = std::fs::read_to_string(path)?;
    let safe_tx: SafeTxJson = serde_json::from_str(&raw)?;

    let data = match safe_tx.data.as_deref() {
        Some(data) => {
            let stripped = data.strip_prefix("0x").unwrap_or(data);
            Bytes::from(hex::decode(stripped).map_err(|_| "safe tx data is not valid hex")?)
        }
        None => Bytes::new(),
    };
    let value = match safe_tx.value.as_deref() {
        Some(value) => parse_quantity(value)?,
        None => U256::ZERO,
    };

    let client = build_http_client(&config, false, None);
    let analyzer = Arc::new(Analyzer::new(config, client));
    let chain = args.chain;

    // A delegatecalled multiSend batch fans out into per-record scans.
    let records = multisend_records(&data, safe_tx.operation);
    let (targets, truncated_flags) = match &records {
        Some(batch) => (
            batch
                .records
                .iter()
                .map(|record| CalldataInput {
                    to: record.to,
                    from: safe_tx.safe,
                    data: record.data.clone(),
                    value: record.value,
                    chain: Some(chain),
                    authorization_list: Vec::new(),
                })
                .collect::<Vec<_>>(),
            (batch.truncated, batch.too_large),
        ),
        None => (
            vec![CalldataInput {
                to: safe_tx.to,
                from: safe_tx.safe,
                data,
                value,
                chain: Some(chain),
                authorization_list: Vec::new(),
            }],
            (false, false),
        ),
    };

    // Parallel per-call analysis, at most three in flight.
    let factories: Vec<_> = targets
        .iter()
        .cloned()
        .map(|input| {
            let analyzer = analyzer.clone();
            move || {
                let analyzer = analyzer.clone();
                async move {
                    let result = analyzer
                        .analyze(&input, chain, AnalyzeOptions::default(), None)
                        .await;
                    (input, result)
                }
            }
        })
        .collect();
    let results = run_bounded(factories, 3).await;

    let overall = results
        .iter()
        .map(|(_, result)| result.recommendation)
        .max()
        .unwrap_or(Recommendation::Ok);

    let rendered = match args.format {
        OutputFormat::Text => {
            let mut out = format!(
                "safe tx {} on {} - overall: {}\n",
                args.safe_tx_hash,
                chain,
                overall.as_str().to_ascii_uppercase()
            );
            if truncated_flags.0 {
                out.push_str("batch truncated at the record cap\n");
            }
            if truncated_flags.1 {
                out.push_str("batch exceeded the size cap; only a prefix was scanned\n");
            }
            for (index, (input, result)) in results.iter().enumerate() {
                out.push_str(&format!("\n-- call {index} -> {:#x} --\n", input.to));
                out.push_str(&output::render_text(result));
            }
            out
        }
        OutputFormat::Json | OutputFormat::Sarif => {
            let calls: Vec<_> = results
                .iter()
                .map(|(input, result)| output::render_json(input, result))
                .collect();
            serde_json::to_string_pretty(&json!({
                "safeTxHash": args.safe_tx_hash,
                "chain": chain,
                "recommendation": overall,
                "truncated": truncated_flags.0,
                "tooLarge": truncated_flags.1,
                "calls": calls,
            }))?
        }
    };
    write_report(None, &rendered)?;

    Ok(output::exit_code(overall, args.fail_on))
}

/// Unpacks `multiSend(bytes)` calldata when the Safe tx delegatecalls a
/// batch; anything else scans as a single call.
fn multisend_records(data: &Bytes, operation: u8) -> Option<txshield_decoder::MultiSendBatch> {
    if operation != 1 || data.len() < 4 || data[..4] != MULTISEND_SELECTOR {
        return None;
    }
    // multiSend(bytes): head offset word, then length-prefixed payload.
    let payload = data.get(4..)?;
    if payload.len() < 64 {
        return None;
    }
    let length = U256::from_be_slice(payload.get(32..64)?);
    let length: usize = length.try_into().ok()?;
    let stream = payload.get(64..64 + length)?;
    Some(decode_multisend(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn multisend_calldata(records: &[u8]) -> Bytes {
        let mut data = MULTISEND_SELECTOR.to_vec();
        data.extend_from_slice(&U256::from(32u64).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(records.len() as u64).to_be_bytes::<32>());
        data.extend_from_slice(records);
        // ABI padding to a 32-byte boundary
        let pad = (32 - records.len() % 32) % 32;
        data.extend_from_slice(&vec![0u8; pad]);
        Bytes::from(data)
    }

    #[test]
    fn test_multisend_records_unpacked() {
        let to = address!("00000000000000000000000000000000000000aa");
        let mut record = vec![0u8];
        record.extend_from_slice(to.as_slice());
        record.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
        record.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());

        let data = multisend_calldata(&record);
        let batch = multisend_records(&data, 1).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].to, to);
    }

    #[test]
    fn test_plain_call_is_not_a_batch() {
        let data = Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3]);
        assert!(multisend_records(&data, 0).is_none());
        assert!(multisend_records(&data, 1).is_none());
    }
}
