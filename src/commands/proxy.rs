//! `txshield proxy`: the wallet-facing interception server.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use txshield_analyzer::{AnalyzeOptions, AnalyzePolicy, Analyzer};
use txshield_proxy::{
    AnalyzerScanService, ProxyApp, ProxyPolicy, Recorder, ScanQueue, StdinPrompter, Upstream,
    router,
};
use txshield_types::AppConfig;
use url::Url;

use crate::cli::ProxyArgs;
use crate::commands::build_http_client;
use crate::signals::SigDown;

pub async fn run(args: ProxyArgs, config: AppConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let upstream_url = args
        .upstream
        .clone()
        .or_else(|| {
            args.chain
                .and_then(|chain| config.rpc_url(chain).map(str::to_string))
        })
        .ok_or("no upstream RPC endpoint: pass --upstream or set TXSHIELD_UPSTREAM")?;
    let upstream_url = Url::parse(&upstream_url)?;

    let client = build_http_client(&config, false, Some(&upstream_url));
    let analyzer = Arc::new(Analyzer::new(config, client.clone()));

    let policy = ProxyPolicy {
        threshold: args.threshold,
        on_risk: args.on_risk,
        interactive: std::io::stdin().is_terminal(),
        allow_prompt_when_simulation_fails: true,
    };
    let options = AnalyzeOptions {
        policy: if args.wallet {
            AnalyzePolicy::Wallet
        } else {
            AnalyzePolicy::Default
        },
        simulate: true,
    };
    let queue = ScanQueue::new(Arc::new(AnalyzerScanService::new(analyzer, options)));
    let recorder = args.save.then(|| Recorder::new(&args.record_dir));

    let shutdown = CancellationToken::new();
    let app = Arc::new(ProxyApp::new(
        Upstream::new(client, upstream_url.clone()),
        queue,
        policy,
        args.chain,
        recorder,
        Arc::new(StdinPrompter),
        args.once,
        shutdown.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", args.hostname, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "txshield proxy listening on http://{addr} -> {upstream_url} (threshold: {}, on-risk: {})",
        args.threshold,
        args.on_risk
    );

    let sig_down = SigDown::try_new(shutdown)?;
    let token = sig_down.cancellation_token();
    let graceful = async move { token.cancelled().await };
    let service = router(app).layer(tower_http::trace::TraceLayer::new_for_http());
    axum::serve(listener, service)
        .with_graceful_shutdown(graceful)
        .await?;

    Ok(0)
}
