//! Safe MultiSend packed-batch parsing.
//!
//! The byte stream inside `multiSend(bytes)` concatenates records with no
//! separator:
//!
//! ```text
//! [1 byte operation][20 bytes to][32 bytes value][32 bytes dataLen][dataLen bytes data]
//! ```
//!
//! The walker is deliberately paranoid: it never reads past the stream,
//! refuses absurd `dataLen` values, stops after [`MAX_RECORDS`] records,
//! and refuses whole batches above [`MAX_BATCH_BYTES`] while still
//! reporting the prefix of targets it resolved.

use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;

/// Record cap; batches beyond this are flagged `truncated`.
pub const MAX_RECORDS: usize = 250;
/// Cumulative input cap; batches beyond this are flagged `too_large`.
pub const MAX_BATCH_BYTES: usize = 2_000_000;
/// Largest `dataLen` a record may claim (2^53 - 1).
const MAX_DATA_LEN: u64 = (1 << 53) - 1;

const HEADER_LEN: usize = 1 + 20 + 32 + 32;

/// One parsed MultiSend record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSendRecord {
    /// 0 = call, 1 = delegatecall.
    pub operation: u8,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// The outcome of walking a batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSendBatch {
    pub records: Vec<MultiSendRecord>,
    /// Set when the walk stopped at [`MAX_RECORDS`].
    pub truncated: bool,
    /// Set when the input exceeded [`MAX_BATCH_BYTES`]; `records` then
    /// holds only the prefix resolved before the cap.
    pub too_large: bool,
    /// Set when a record header or body ran past the stream end.
    pub malformed: bool,
}

/// Walks a MultiSend byte stream into records.
pub fn decode_multisend(stream: &[u8]) -> MultiSendBatch {
    let mut batch = MultiSendBatch::default();
    let too_large = stream.len() > MAX_BATCH_BYTES;
    let mut offset = 0usize;

    while offset < stream.len() {
        if batch.records.len() >= MAX_RECORDS {
            batch.truncated = true;
            break;
        }
        if too_large && offset + HEADER_LEN > MAX_BATCH_BYTES {
            break;
        }
        let Some(record_end) = parse_record(stream, offset, &mut batch) else {
            break;
        };
        offset = record_end;
    }

    batch.too_large = too_large;
    batch
}

/// Parses one record at `offset`, pushing onto the batch. Returns the
/// offset just past the record, or `None` on a malformed record.
fn parse_record(stream: &[u8], offset: usize, batch: &mut MultiSendBatch) -> Option<usize> {
    if offset + HEADER_LEN > stream.len() {
        batch.malformed = true;
        return None;
    }
    let operation = stream[offset];
    let to = Address::from_slice(&stream[offset + 1..offset + 21]);
    let value = U256::from_be_slice(&stream[offset + 21..offset + 53]);
    let data_len = U256::from_be_slice(&stream[offset + 53..offset + 85]);

    if data_len > U256::from(MAX_DATA_LEN) {
        batch.malformed = true;
        return None;
    }
    let data_len = data_len.to::<u64>() as usize;
    let body_start = offset + HEADER_LEN;
    let body_end = body_start.checked_add(data_len)?;
    if body_end > stream.len() {
        batch.malformed = true;
        return None;
    }

    batch.records.push(MultiSendRecord {
        operation,
        to,
        value,
        data: Bytes::copy_from_slice(&stream[body_start..body_end]),
    });
    Some(body_end)
}
