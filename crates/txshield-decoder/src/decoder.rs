//! The decode pipeline: known ABI, local routers, contract ABI, signature
//! database, placeholder.
//!
//! A [`Decoder`] borrows its collaborators (the fetched contract ABI and
//! the signature-database resolver) per scan; nothing here mutates shared
//! state. Stages short-circuit on the first success. The local-selector
//! placeholder is only emitted after every other stage failed, so a
//! fetched ABI or a database hit is never shadowed by it.

use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Selector;
use txshield_types::{DecodeSource, DecodedCall};

use crate::context::DecodeContext;
use crate::contract_abi::decode_contract_abi;
use crate::known::{self, build_from_values};
use crate::multisend::decode_multisend;
use crate::routers::{self, RouterKind};
use crate::signatures::{SelectorResolver, decode_via_database};
use crate::universal_router::decode_plan;

/// A configured decode pipeline.
#[derive(Default)]
pub struct Decoder<'a> {
    contract_abi: Option<&'a JsonAbi>,
    resolver: Option<&'a SelectorResolver>,
}

impl<'a> Decoder<'a> {
    pub fn new() -> Self {
        Decoder {
            contract_abi: None,
            resolver: None,
        }
    }

    /// Enables Stage C against an ABI fetched for the target contract.
    pub fn with_contract_abi(mut self, abi: &'a JsonAbi) -> Self {
        self.contract_abi = Some(abi);
        self
    }

    /// Enables Stage D through the given resolver handle.
    pub fn with_resolver(mut self, resolver: &'a SelectorResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Decodes a calldata payload. Returns `None` only for payloads too
    /// short to carry a selector; everything else yields at least the
    /// local-selector placeholder.
    pub async fn decode(&self, data: &[u8], ctx: DecodeContext) -> Option<DecodedCall> {
        if data.len() < 4 {
            return None;
        }
        let selector = Selector::from_slice(&data[..4]);

        // Stage A: built-in token ABI.
        if let Some(call) = known::decode_known(data) {
            return Some(call);
        }

        // Stage B: local router table, with nested sub-decoders.
        if let Some(call) = self.decode_local(selector, data, ctx).await {
            return Some(call);
        }

        // Stage C: fetched contract ABI.
        if let Some(abi) = self.contract_abi {
            if ctx.depth == 0 {
                if let Some(call) = decode_contract_abi(abi, data) {
                    return Some(call);
                }
            }
        }

        // Stage D: signature database.
        if let Some(resolver) = self.resolver {
            if let Some(call) = decode_via_database(resolver, data).await {
                return Some(call);
            }
        }

        Some(DecodedCall::placeholder(selector))
    }

    async fn decode_local(
        &self,
        selector: Selector,
        data: &[u8],
        ctx: DecodeContext,
    ) -> Option<DecodedCall> {
        let (function, entry) = routers::lookup(&selector)?;
        let values = function.abi_decode_input(&data[4..]).ok()?;

        match entry.kind {
            RouterKind::Plain => Some(build_from_values(
                function,
                entry.arg_names,
                values,
                DecodeSource::LocalSelector,
                None,
            )),
            RouterKind::UniversalRouter => {
                let commands = as_bytes(values.first())?;
                let inputs: Vec<&[u8]> = match values.get(1) {
                    Some(DynSolValue::Array(items)) => {
                        items.iter().filter_map(|item| as_bytes(Some(item))).collect()
                    }
                    _ => Vec::new(),
                };
                let plan = decode_plan(commands, &inputs);
                let mut call = build_from_values(
                    function,
                    entry.arg_names,
                    values.clone(),
                    DecodeSource::LocalSelector,
                    None,
                );
                call.commands = plan;
                Some(call)
            }
            RouterKind::Multicall => {
                let payloads: Vec<Vec<u8>> = values
                    .iter()
                    .find_map(|value| match value {
                        DynSolValue::Array(items) => Some(
                            items
                                .iter()
                                .filter_map(|item| as_bytes(Some(item)).map(<[u8]>::to_vec))
                                .collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default();
                let mut inner_calls = Vec::new();
                if let Some(inner_ctx) = ctx.descend() {
                    for payload in &payloads {
                        if let Some(inner) = Box::pin(self.decode(payload, inner_ctx)).await {
                            inner_calls.push(inner);
                        }
                    }
                }
                let mut call = build_from_values(
                    function,
                    entry.arg_names,
                    values,
                    DecodeSource::LocalSelector,
                    None,
                );
                call.inner_calls = inner_calls;
                Some(call)
            }
            RouterKind::ExecTransaction => {
                let embedded = as_bytes(values.get(2)).map(<[u8]>::to_vec);
                let mut inner_calls = Vec::new();
                if let (Some(embedded), Some(inner_ctx)) = (embedded, ctx.descend()) {
                    if let Some(inner) = Box::pin(self.decode(&embedded, inner_ctx)).await {
                        inner_calls.push(inner);
                    }
                }
                let mut call = build_from_values(
                    function,
                    entry.arg_names,
                    values,
                    DecodeSource::LocalSelector,
                    None,
                );
                call.inner_calls = inner_calls;
                Some(call)
            }
            RouterKind::MultiSend => {
                let stream = as_bytes(values.first()).map(<[u8]>::to_vec);
                let mut inner_calls = Vec::new();
                if let (Some(stream), Some(inner_ctx)) = (stream, ctx.descend()) {
                    let batch = decode_multisend(&stream);
                    for record in &batch.records {
                        if record.data.len() < 4 {
                            continue;
                        }
                        if let Some(inner) = Box::pin(self.decode(&record.data, inner_ctx)).await {
                            inner_calls.push(inner);
                        }
                    }
                }
                let mut call = build_from_values(
                    function,
                    entry.arg_names,
                    values,
                    DecodeSource::LocalSelector,
                    None,
                );
                call.inner_calls = inner_calls;
                Some(call)
            }
        }
    }
}

fn as_bytes(value: Option<&DynSolValue>) -> Option<&[u8]> {
    match value {
        Some(DynSolValue::Bytes(bytes)) => Some(bytes.as_slice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_abi::Function;
    use alloy_primitives::{Address, U256, hex};
    use txshield_types::Value;

    fn approve_calldata() -> Vec<u8> {
        let mut data = hex::decode("095ea7b3").unwrap();
        data.extend_from_slice(&[0u8; 31]);
        data.push(0x01);
        data.extend_from_slice(&U256::MAX.to_be_bytes::<32>());
        data
    }

    fn multicall_calldata(payloads: Vec<Vec<u8>>) -> Vec<u8> {
        let function = Function::parse("multicall(bytes[])").unwrap();
        let inner = DynSolValue::Array(
            payloads.into_iter().map(DynSolValue::Bytes).collect::<Vec<_>>(),
        );
        function.abi_encode_input(&[inner]).unwrap()
    }

    #[tokio::test]
    async fn test_stage_a_wins() {
        let decoder = Decoder::new();
        let call = decoder
            .decode(&approve_calldata(), DecodeContext::root())
            .await
            .unwrap();
        assert_eq!(call.source, DecodeSource::KnownAbi);
        assert_eq!(call.function_name, "approve");
    }

    #[tokio::test]
    async fn test_unknown_selector_yields_placeholder() {
        let decoder = Decoder::new();
        let call = decoder
            .decode(&hex::decode("deadbeef00").unwrap(), DecodeContext::root())
            .await
            .unwrap();
        assert_eq!(call.source, DecodeSource::LocalSelector);
        assert!(call.args.is_empty());
    }

    #[tokio::test]
    async fn test_short_payload_yields_none() {
        let decoder = Decoder::new();
        assert!(decoder.decode(&[0x01], DecodeContext::root()).await.is_none());
    }

    #[tokio::test]
    async fn test_multicall_recursion() {
        let decoder = Decoder::new();
        let data = multicall_calldata(vec![approve_calldata(), approve_calldata()]);
        let call = decoder.decode(&data, DecodeContext::root()).await.unwrap();
        assert_eq!(call.function_name, "multicall");
        assert_eq!(call.inner_calls.len(), 2);
        assert_eq!(call.inner_calls[0].function_name, "approve");
        assert_eq!(
            call.inner_calls[0].arg("amount", 1).and_then(Value::as_uint),
            Some(U256::MAX)
        );
    }

    #[tokio::test]
    async fn test_recursion_depth_capped_at_two() {
        // multicall(multicall(multicall(approve))) - the innermost approve
        // sits at depth 3 and must not be decoded.
        let level3 = multicall_calldata(vec![approve_calldata()]);
        let level2 = multicall_calldata(vec![level3]);
        let level1 = multicall_calldata(vec![level2]);

        let decoder = Decoder::new();
        let call = decoder.decode(&level1, DecodeContext::root()).await.unwrap();
        let depth1 = &call.inner_calls[0];
        assert_eq!(depth1.function_name, "multicall");
        let depth2 = &depth1.inner_calls[0];
        assert_eq!(depth2.function_name, "multicall");
        // Depth cap: the decoder stopped descending here.
        assert!(depth2.inner_calls.is_empty());
    }

    #[tokio::test]
    async fn test_exec_transaction_recursion() {
        let function = Function::parse(
            "execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)",
        )
        .unwrap();
        let args = vec![
            DynSolValue::Address(Address::repeat_byte(0x11)),
            DynSolValue::Uint(U256::ZERO, 256),
            DynSolValue::Bytes(approve_calldata()),
            DynSolValue::Uint(U256::ZERO, 8),
            DynSolValue::Uint(U256::ZERO, 256),
            DynSolValue::Uint(U256::ZERO, 256),
            DynSolValue::Uint(U256::ZERO, 256),
            DynSolValue::Address(Address::ZERO),
            DynSolValue::Address(Address::ZERO),
            DynSolValue::Bytes(vec![]),
        ];
        let data = function.abi_encode_input(&args).unwrap();

        let decoder = Decoder::new();
        let call = decoder.decode(&data, DecodeContext::root()).await.unwrap();
        assert_eq!(call.function_name, "execTransaction");
        assert_eq!(call.inner_calls.len(), 1);
        assert_eq!(call.inner_calls[0].function_name, "approve");
    }

    #[tokio::test]
    async fn test_universal_router_plan_attached() {
        let function = Function::parse("execute(bytes,bytes[],uint256)").unwrap();
        let args = vec![
            DynSolValue::Bytes(vec![0x0b, 0x10, 0x04]),
            DynSolValue::Array(vec![
                DynSolValue::Bytes(vec![]),
                DynSolValue::Bytes(vec![]),
                DynSolValue::Bytes(vec![]),
            ]),
            DynSolValue::Uint(U256::from(9999u64), 256),
        ];
        let data = function.abi_encode_input(&args).unwrap();

        let decoder = Decoder::new();
        let call = decoder.decode(&data, DecodeContext::root()).await.unwrap();
        assert_eq!(call.function_name, "execute");
        let labels: Vec<&str> = call.commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(labels, vec!["WRAP_ETH", "V4_SWAP", "SWEEP"]);
    }

    #[tokio::test]
    async fn test_decode_idempotent() {
        let decoder = Decoder::new();
        let data = multicall_calldata(vec![approve_calldata()]);
        let first = decoder.decode(&data, DecodeContext::root()).await;
        let second = decoder.decode(&data, DecodeContext::root()).await;
        assert_eq!(first, second);
    }
}
