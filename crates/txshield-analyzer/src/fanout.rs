//! The concurrent provider fan-out.
//!
//! Every enabled provider runs under its own timeout; in wallet mode an
//! overall deadline is enforced on top, and whichever bound is tighter
//! wins. A provider failure contributes nothing and cancels no sibling.
//! Results are merged in provider order after all of them have resolved,
//! never in completion order.
//!
//! The impl-* providers form a second wave: they need the implementation
//! address recovered by proxy-detect, and still respect whatever remains
//! of the overall budget.

use alloy_primitives::Address;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use txshield_types::Chain;
use url::Url;

use crate::http::HttpClient;
use crate::policy::AnalyzePolicy;
use crate::providers::rpc::RpcCaller;
use crate::providers::{
    LabelsOutput, MetadataOutput, ProgressEvent, ProgressState, ProtocolOutput, ProviderError,
    ProviderKind, ProviderReport, ProxyDetectOutput, RpcOutput, TokenSecurityOutput,
    VerificationOutput, etherscan, labels, protocol, proxy_detect, rpc, sourcify, token_security,
};

/// Everything the fan-out needs to know about its environment.
pub struct FanoutInputs {
    pub client: HttpClient,
    pub rpc: Option<RpcCaller>,
    pub chain: Chain,
    pub address: Address,
    pub etherscan_key: Option<String>,
    pub labels_base: Option<Url>,
}

/// The per-provider outcomes, in canonical provider order.
#[derive(Debug)]
pub struct FanoutOutput {
    pub rpc: ProviderReport<RpcOutput>,
    pub verification: ProviderReport<VerificationOutput>,
    pub labels: ProviderReport<LabelsOutput>,
    pub metadata: ProviderReport<MetadataOutput>,
    pub proxy: ProviderReport<ProxyDetectOutput>,
    pub protocol: ProviderReport<ProtocolOutput>,
    pub impl_verification: ProviderReport<VerificationOutput>,
    pub impl_protocol: ProviderReport<ProtocolOutput>,
    pub token_security: ProviderReport<TokenSecurityOutput>,
}

pub async fn run_fanout(
    inputs: &FanoutInputs,
    policy: AnalyzePolicy,
    progress: Option<&UnboundedSender<ProgressEvent>>,
) -> FanoutOutput {
    let deadline = policy.overall_budget().map(|budget| Instant::now() + budget);

    // Wave 1: everything that depends only on the scan target.
    let (rpc_report, verification, labels_report, metadata, proxy, token) = tokio::join!(
        run_provider(ProviderKind::Rpc, policy, deadline, progress, {
            let caller = inputs.rpc.clone();
            let address = inputs.address;
            async move {
                let caller = caller.ok_or(ProviderError::NotConfigured("rpc url"))?;
                rpc::fetch(&caller, address).await
            }
        }),
        run_provider(ProviderKind::Sourcify, policy, deadline, progress, {
            let client = inputs.client.clone();
            let chain = inputs.chain;
            let address = inputs.address;
            async move { sourcify::fetch(&client, chain, address).await }
        }),
        run_provider(ProviderKind::Labels, policy, deadline, progress, {
            let client = inputs.client.clone();
            let base = inputs.labels_base.clone();
            let address = inputs.address;
            async move {
                let base = base.ok_or(ProviderError::NotConfigured("labels url"))?;
                labels::fetch(&client, &base, address).await
            }
        }),
        run_provider(ProviderKind::Etherscan, policy, deadline, progress, {
            let client = inputs.client.clone();
            let chain = inputs.chain;
            let address = inputs.address;
            let key = inputs.etherscan_key.clone();
            async move {
                let key = key.ok_or(ProviderError::NotConfigured("etherscan api key"))?;
                etherscan::fetch(&client, chain, address, &key).await
            }
        }),
        run_provider(ProviderKind::ProxyDetect, policy, deadline, progress, {
            let caller = inputs.rpc.clone();
            let address = inputs.address;
            async move {
                let caller = caller.ok_or(ProviderError::NotConfigured("rpc url"))?;
                proxy_detect::fetch(&caller, address).await
            }
        }),
        run_provider(ProviderKind::TokenSecurity, policy, deadline, progress, {
            let client = inputs.client.clone();
            let chain = inputs.chain;
            let address = inputs.address;
            async move { token_security::fetch(&client, chain, address).await }
        }),
    );

    // The registry's canonical tier is local; the keyword tier runs over
    // names recovered by the other providers during the merge.
    let protocol_report = run_provider(
        ProviderKind::ProtocolRegistry,
        policy,
        deadline,
        progress,
        {
            let chain = inputs.chain;
            let address = inputs.address;
            async move {
                Ok::<_, ProviderError>(ProtocolOutput {
                    matched: protocol::lookup_canonical(address, chain),
                })
            }
        },
    )
    .await;

    // Wave 2: secondary lookups against the implementation address.
    let implementation = proxy.ok().and_then(|output| output.implementation);
    let (impl_verification, impl_protocol) = match implementation {
        Some(implementation) => tokio::join!(
            run_provider(ProviderKind::ImplSourcify, policy, deadline, progress, {
                let client = inputs.client.clone();
                let chain = inputs.chain;
                async move { sourcify::fetch(&client, chain, implementation).await }
            }),
            run_provider(ProviderKind::ImplProtocol, policy, deadline, progress, {
                let chain = inputs.chain;
                async move {
                    Ok::<_, ProviderError>(ProtocolOutput {
                        matched: protocol::lookup_canonical(implementation, chain),
                    })
                }
            }),
        ),
        None => {
            emit(progress, ProviderKind::ImplSourcify, ProgressState::Skipped);
            emit(progress, ProviderKind::ImplProtocol, ProgressState::Skipped);
            (ProviderReport::Skipped, ProviderReport::Skipped)
        }
    };

    FanoutOutput {
        rpc: rpc_report,
        verification,
        labels: labels_report,
        metadata,
        proxy,
        protocol: protocol_report,
        impl_verification,
        impl_protocol,
        token_security: token,
    }
}

/// Wraps one provider computation in policy checks, budget-aware timeout,
/// and progress reporting.
async fn run_provider<T, Fut>(
    kind: ProviderKind,
    policy: AnalyzePolicy,
    deadline: Option<Instant>,
    progress: Option<&UnboundedSender<ProgressEvent>>,
    fut: Fut,
) -> ProviderReport<T>
where
    Fut: Future<Output = Result<T, ProviderError>>,
{
    if !policy.enables(kind) {
        emit(progress, kind, ProgressState::Skipped);
        return ProviderReport::Skipped;
    }

    let mut timeout = policy.provider_timeout(kind);
    if let Some(deadline) = deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        timeout = timeout.min(remaining);
    }
    if timeout == Duration::ZERO {
        emit(progress, kind, ProgressState::TimedOut);
        return ProviderReport::TimedOut;
    }

    emit(progress, kind, ProgressState::Started);
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(output)) => {
            emit(progress, kind, ProgressState::Finished);
            ProviderReport::Ok(output)
        }
        Ok(Err(ProviderError::NotConfigured(what))) => {
            tracing::debug!(provider = ?kind, what, "provider not configured");
            emit(progress, kind, ProgressState::Skipped);
            ProviderReport::Skipped
        }
        Ok(Err(error)) => {
            tracing::debug!(provider = ?kind, %error, "provider failed");
            emit(progress, kind, ProgressState::Failed);
            ProviderReport::Failed(error.to_string())
        }
        Err(_) => {
            tracing::debug!(provider = ?kind, ?timeout, "provider timed out");
            emit(progress, kind, ProgressState::TimedOut);
            ProviderReport::TimedOut
        }
    }
}

fn emit(
    progress: Option<&UnboundedSender<ProgressEvent>>,
    provider: ProviderKind,
    state: ProgressState,
) {
    if let Some(sink) = progress {
        let _ = sink.send(ProgressEvent { provider, state });
    }
}
