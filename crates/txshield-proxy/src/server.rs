//! The HTTP front door.
//!
//! Front-door contract: `OPTIONS` answers 204 with CORS headers, `GET`
//! answers a small health object, `POST` is JSON-RPC (single or batch).
//! Batch entries are processed in declared order; notifications receive no
//! reply; a batch that produced no replies answers HTTP 204 with no body.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::any;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use txshield_types::{CalldataInput, Chain};

use crate::extract;
use crate::policy::{PolicyAction, ProxyPolicy};
use crate::prompt::Prompter;
use crate::record::{RecordEntry, Recorder};
use crate::rpc::{
    INVALID_PARAMS, INVALID_REQUEST, PARSE_ERROR, RpcRequest, TRANSACTION_BLOCKED, error_response,
    error_response_with_data,
};
use crate::scan::{ScanOutcome, ScanQueue};
use crate::upstream::Upstream;

/// Everything one proxy process holds.
pub struct ProxyApp {
    pub upstream: Upstream,
    pub queue: ScanQueue,
    pub policy: ProxyPolicy,
    /// `--chain` override, consulted between the payload's own chain id
    /// and the upstream probe.
    pub chain_flag: Option<Chain>,
    pub recorder: Option<Recorder>,
    pub prompter: Arc<dyn Prompter>,
    /// Shut down after the first handled request.
    pub once: bool,
    pub shutdown: CancellationToken,
    handled: AtomicBool,
}

impl ProxyApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upstream: Upstream,
        queue: ScanQueue,
        policy: ProxyPolicy,
        chain_flag: Option<Chain>,
        recorder: Option<Recorder>,
        prompter: Arc<dyn Prompter>,
        once: bool,
        shutdown: CancellationToken,
    ) -> Self {
        ProxyApp {
            upstream,
            queue,
            policy,
            chain_flag,
            recorder,
            prompter,
            once,
            shutdown,
            handled: AtomicBool::new(false),
        }
    }
}

pub fn router(app: Arc<ProxyApp>) -> Router {
    Router::new().fallback(any(front_door)).with_state(app)
}

#[tracing::instrument(skip_all, fields(method = %method))]
async fn front_door(
    State(app): State<Arc<ProxyApp>>,
    method: Method,
    body: Bytes,
) -> Response {
    match method {
        Method::OPTIONS => with_cors(StatusCode::NO_CONTENT.into_response()),
        Method::GET => with_cors(
            Json(json!({
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "upstream": app.upstream.url().as_str(),
                "intercepts": ["eth_sendTransaction", "eth_sendRawTransaction"],
            }))
            .into_response(),
        ),
        Method::POST => {
            let response = handle_post(&app, &body).await;
            if app.once && !app.handled.swap(true, Ordering::SeqCst) {
                // Graceful shutdown drains in-flight connections, so the
                // reply for this request still reaches the wallet.
                app.shutdown.cancel();
            }
            with_cors(response)
        }
        _ => with_cors(StatusCode::METHOD_NOT_ALLOWED.into_response()),
    }
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, authorization"),
    );
    response
}

async fn handle_post(app: &Arc<ProxyApp>, body: &[u8]) -> Response {
    let parsed: Result<JsonValue, _> = serde_json::from_slice(body);
    let value = match parsed {
        Ok(value) => value,
        Err(_) => {
            return Json(error_response(JsonValue::Null, PARSE_ERROR, "Parse error"))
                .into_response();
        }
    };

    match value {
        JsonValue::Object(_) => {
            match process_entry(app, value, Some(body)).await {
                Some(reply) => Json(reply).into_response(),
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
        JsonValue::Array(entries) => {
            if entries.is_empty() {
                return Json(error_response(
                    JsonValue::Null,
                    INVALID_REQUEST,
                    "Invalid Request",
                ))
                .into_response();
            }
            let mut replies = Vec::new();
            for entry in entries {
                if let Some(reply) = process_entry(app, entry, None).await {
                    replies.push(reply);
                }
            }
            if replies.is_empty() {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(JsonValue::Array(replies)).into_response()
            }
        }
        _ => Json(error_response(
            JsonValue::Null,
            INVALID_REQUEST,
            "Invalid Request",
        ))
        .into_response(),
    }
}

/// Handles one request entry. `raw_single` carries the original body for
/// lone requests so pass-through traffic is forwarded byte-identically.
/// Returns `None` for notifications and for replies that must be dropped.
async fn process_entry(
    app: &Arc<ProxyApp>,
    entry: JsonValue,
    raw_single: Option<&[u8]>,
) -> Option<JsonValue> {
    if !entry.is_object() {
        return Some(error_response(
            JsonValue::Null,
            INVALID_REQUEST,
            "Invalid Request",
        ));
    }
    let request: RpcRequest = match serde_json::from_value(entry.clone()) {
        Ok(request) => request,
        Err(_) => {
            return Some(error_response(
                entry.get("id").cloned().unwrap_or(JsonValue::Null),
                INVALID_REQUEST,
                "Invalid Request",
            ));
        }
    };

    if !request.is_mutating() {
        return forward_passthrough(app, &request, &entry, raw_single).await;
    }
    intercept(app, request, entry, raw_single).await
}

async fn forward_passthrough(
    app: &Arc<ProxyApp>,
    request: &RpcRequest,
    entry: &JsonValue,
    raw_single: Option<&[u8]>,
) -> Option<JsonValue> {
    if request.is_notification() {
        app.upstream.forward_notification(entry).await;
        return None;
    }
    let forwarded = match raw_single {
        Some(raw) => app.upstream.forward_raw(raw.to_vec()).await,
        None => app.upstream.forward_entry(entry).await,
    };
    match forwarded {
        Ok(reply) => Some(reply),
        Err(error) => {
            tracing::warn!(%error, method = %request.method, "upstream forward failed");
            Some(error_response(
                request.id.clone().unwrap_or(JsonValue::Null),
                -32603,
                "Upstream request failed",
            ))
        }
    }
}

async fn intercept(
    app: &Arc<ProxyApp>,
    request: RpcRequest,
    entry: JsonValue,
    raw_single: Option<&[u8]>,
) -> Option<JsonValue> {
    let notification = request.is_notification();
    let id = request.id.clone().unwrap_or(JsonValue::Null);

    let input = match extract_input(&request) {
        Ok(input) => input,
        Err(message) => {
            // Invalid notifications are dropped without a reply.
            if notification {
                return None;
            }
            return Some(error_response(id, INVALID_PARAMS, &message));
        }
    };

    let chain = match resolve_chain(app, &input).await {
        Some(chain) => chain,
        None => {
            if notification {
                return None;
            }
            return Some(error_response(
                id,
                INVALID_PARAMS,
                "Could not resolve the target chain",
            ));
        }
    };

    // Spawned so a wallet disconnect does not cancel the scan; its result
    // may still be recorded.
    let outcome = {
        let app = app.clone();
        let scan_input = input.clone();
        let handle =
            tokio::spawn(async move { app.queue.scan(scan_input, chain).await });
        match handle.await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(%error, "scan task failed");
                if notification {
                    return None;
                }
                return Some(error_response(id, -32603, "Scan failed"));
            }
        }
    };

    let mut action = app
        .policy
        .decide(outcome.recommendation, outcome.simulation_success);
    if action == PolicyAction::Prompt {
        action = if app.prompter.confirm(&outcome.rendered).await {
            PolicyAction::Forward
        } else {
            PolicyAction::Block
        };
    }

    record(app, &request, &entry, &input, chain, &outcome, action).await;

    match action {
        PolicyAction::Forward => {
            let forwarded = match raw_single {
                Some(raw) => app.upstream.forward_raw(raw.to_vec()).await,
                None => app.upstream.forward_entry(&entry).await,
            };
            match forwarded {
                Ok(reply) => {
                    if notification {
                        None
                    } else {
                        Some(reply)
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "forward after scan failed");
                    if notification {
                        None
                    } else {
                        Some(error_response(id, -32603, "Upstream request failed"))
                    }
                }
            }
        }
        PolicyAction::Block | PolicyAction::Prompt => {
            if notification {
                return None;
            }
            Some(error_response_with_data(
                id,
                TRANSACTION_BLOCKED,
                "Transaction blocked",
                json!({
                    "recommendation": outcome.recommendation,
                    "simulationSuccess": outcome.simulation_success,
                }),
            ))
        }
    }
}

fn extract_input(request: &RpcRequest) -> Result<CalldataInput, String> {
    match request.method.as_str() {
        "eth_sendTransaction" => {
            let params = request
                .first_param()
                .ok_or_else(|| "missing transaction object".to_string())?;
            extract::from_transaction_object(params).map_err(|e| e.to_string())
        }
        "eth_sendRawTransaction" => {
            let raw = request
                .first_param()
                .and_then(JsonValue::as_str)
                .ok_or_else(|| "missing raw transaction".to_string())?;
            extract::from_raw_transaction(raw).map_err(|e| e.to_string())
        }
        other => Err(format!("unexpected method {other}")),
    }
}

/// Chain precedence: the payload's own chain id, then the CLI flag, then
/// the upstream probe.
async fn resolve_chain(app: &Arc<ProxyApp>, input: &CalldataInput) -> Option<Chain> {
    if let Some(chain) = input.chain {
        return Some(chain);
    }
    if let Some(chain) = app.chain_flag {
        return Some(chain);
    }
    app.upstream.chain().await
}

async fn record(
    app: &Arc<ProxyApp>,
    request: &RpcRequest,
    entry: &JsonValue,
    input: &CalldataInput,
    chain: Chain,
    outcome: &ScanOutcome,
    action: PolicyAction,
) {
    let Some(recorder) = &app.recorder else {
        return;
    };
    let action_name = match action {
        PolicyAction::Forward => "forward",
        PolicyAction::Block => "block",
        PolicyAction::Prompt => "prompt",
    };
    let record_entry = RecordEntry {
        method: &request.method,
        chain,
        rpc: entry,
        calldata: input,
        analyze_response: &outcome.response,
        rendered: &outcome.rendered,
        action: action_name,
    };
    if app.once {
        // The process is about to exit; write synchronously.
        if let Err(error) = recorder.record(record_entry).await {
            tracing::error!(%error, "failed to write record");
        }
    } else {
        let recorder = recorder.clone();
        let method = request.method.clone();
        let entry = entry.clone();
        let input = input.clone();
        let response = outcome.response.clone();
        let rendered = outcome.rendered.clone();
        tokio::spawn(async move {
            let detached = RecordEntry {
                method: &method,
                chain,
                rpc: &entry,
                calldata: &input,
                analyze_response: &response,
                rendered: &rendered,
                action: action_name,
            };
            if let Err(error) = recorder.record(detached).await {
                tracing::warn!(%error, "failed to write record");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanService;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::net::SocketAddr;
    use std::sync::Mutex as StdMutex;
    use tower::ServiceExt;
    use txshield_analyzer::HttpClient;
    use txshield_types::Recommendation;
    use url::Url;

    /// A mock upstream that records every body it receives and answers a
    /// fixed result.
    async fn spawn_upstream() -> (Url, Arc<StdMutex<Vec<JsonValue>>>) {
        let received: Arc<StdMutex<Vec<JsonValue>>> = Arc::default();
        let state = received.clone();
        let app = Router::new().fallback(any(
            move |body: Bytes| {
                let state = state.clone();
                async move {
                    let value: JsonValue = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
                    let id = value.get("id").cloned().unwrap_or(JsonValue::Null);
                    state.lock().unwrap().push(value);
                    Json(json!({"jsonrpc": "2.0", "id": id, "result": "0x10d4f"}))
                }
            },
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (Url::parse(&format!("http://{addr}/")).unwrap(), received)
    }

    struct StubScan {
        recommendation: Recommendation,
        simulation_success: bool,
    }

    #[async_trait]
    impl ScanService for StubScan {
        async fn scan(&self, _input: CalldataInput, _chain: Chain) -> ScanOutcome {
            ScanOutcome {
                recommendation: self.recommendation,
                simulation_success: self.simulation_success,
                response: json!({"recommendation": self.recommendation}),
                rendered: format!("{} verdict", self.recommendation),
            }
        }
    }

    struct YesPrompter;

    #[async_trait]
    impl Prompter for YesPrompter {
        async fn confirm(&self, _rendered: &str) -> bool {
            true
        }
    }

    struct NoPrompter;

    #[async_trait]
    impl Prompter for NoPrompter {
        async fn confirm(&self, _rendered: &str) -> bool {
            false
        }
    }

    async fn build_app(
        upstream_url: Url,
        recommendation: Recommendation,
        policy: ProxyPolicy,
        prompter: Arc<dyn Prompter>,
    ) -> Arc<ProxyApp> {
        let upstream = Upstream::new(HttpClient::new(), upstream_url);
        let queue = ScanQueue::new(Arc::new(StubScan {
            recommendation,
            simulation_success: true,
        }));
        Arc::new(ProxyApp::new(
            upstream,
            queue,
            policy,
            Some(Chain::Ethereum),
            None,
            prompter,
            false,
            CancellationToken::new(),
        ))
    }

    async fn post(router: &Router, body: &str) -> (StatusCode, Option<JsonValue>) {
        let response = router
            .clone()
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, value)
    }

    fn send_tx_entry(id: u64) -> JsonValue {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_sendTransaction",
            "params": [{
                "to": "0x00000000000000000000000000000000000000aa",
                "data": "0x",
                "value": "0x0",
            }]
        })
    }

    #[tokio::test]
    async fn test_passthrough_matches_upstream_reply() {
        let (url, received) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let body = r#"{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}"#;
        let (status, reply) = post(&router, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            reply.unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x10d4f"})
        );
        // The upstream saw the request byte-for-byte.
        let seen = received.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], serde_json::from_str::<JsonValue>(body).unwrap());
    }

    #[tokio::test]
    async fn test_danger_scan_blocks_without_upstream_contact() {
        let (url, received) = spawn_upstream().await;
        let app = build_app(
            url,
            Recommendation::Danger,
            ProxyPolicy::default(),
            Arc::new(YesPrompter),
        )
        .await;
        let router = router(app);

        let (status, reply) = post(&router, &send_tx_entry(1).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        let reply = reply.unwrap();
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["error"]["code"], 4001);
        assert_eq!(reply["error"]["message"], "Transaction blocked");
        assert_eq!(reply["error"]["data"]["recommendation"], "danger");
        assert_eq!(reply["error"]["data"]["simulationSuccess"], true);
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ok_scan_forwards() {
        let (url, received) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let (_, reply) = post(&router, &send_tx_entry(5).to_string()).await;
        assert_eq!(reply.unwrap()["result"], "0x10d4f");
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_no_blocks_prompt_yes_forwards() {
        let (url, _) = spawn_upstream().await;
        let policy = ProxyPolicy {
            on_risk: crate::policy::OnRisk::Prompt,
            interactive: true,
            ..ProxyPolicy::default()
        };
        let blocked = build_app(url.clone(), Recommendation::Danger, policy, Arc::new(NoPrompter)).await;
        let (_, reply) = post(&router(blocked), &send_tx_entry(2).to_string()).await;
        assert_eq!(reply.unwrap()["error"]["code"], 4001);

        let allowed = build_app(url, Recommendation::Danger, policy, Arc::new(YesPrompter)).await;
        let (_, reply) = post(&router(allowed), &send_tx_entry(3).to_string()).await;
        assert_eq!(reply.unwrap()["result"], "0x10d4f");
    }

    #[tokio::test]
    async fn test_batch_mixed_order_and_notification() {
        let (url, _) = spawn_upstream().await;
        let app = build_app(
            url,
            Recommendation::Danger,
            ProxyPolicy::default(),
            Arc::new(YesPrompter),
        )
        .await;
        let router = router(app);

        let batch = json!([
            {"jsonrpc": "2.0", "id": 10, "method": "eth_blockNumber", "params": []},
            send_tx_entry(11),
            {"jsonrpc": "2.0", "method": "eth_blockNumber", "params": []},
        ]);
        let (status, reply) = post(&router, &batch.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        let replies = reply.unwrap();
        let replies = replies.as_array().unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 10);
        assert!(replies[0].get("result").is_some());
        assert_eq!(replies[1]["id"], 11);
        assert_eq!(replies[1]["error"]["code"], 4001);
    }

    #[tokio::test]
    async fn test_all_notification_batch_is_204() {
        let (url, _) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let batch = json!([
            {"jsonrpc": "2.0", "method": "eth_blockNumber", "params": []},
            {"jsonrpc": "2.0", "method": "eth_chainId", "params": []},
        ]);
        let (status, reply) = post(&router, &batch.to_string()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_parse_error_and_invalid_request() {
        let (url, _) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let (_, reply) = post(&router, "{not json").await;
        assert_eq!(reply.unwrap()["error"]["code"], -32700);

        let (_, reply) = post(&router, "\"just a string\"").await;
        assert_eq!(reply.unwrap()["error"]["code"], -32600);

        let (_, reply) = post(&router, "[]").await;
        assert_eq!(reply.unwrap()["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_invalid_send_transaction_params() {
        let (url, _) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let body = json!({
            "jsonrpc": "2.0", "id": 9, "method": "eth_sendTransaction",
            "params": [{"data": "0x"}]
        });
        let (_, reply) = post(&router, &body.to_string()).await;
        let reply = reply.unwrap();
        assert_eq!(reply["error"]["code"], -32602);
        assert_eq!(reply["id"], 9);
    }

    #[tokio::test]
    async fn test_invalid_raw_transaction_notification_dropped() {
        let (url, received) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let body = json!({
            "jsonrpc": "2.0", "method": "eth_sendRawTransaction", "params": ["0xzz"]
        });
        let (status, reply) = post(&router, &body.to_string()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(reply.is_none());
        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_options_and_health() {
        let (url, _) = spawn_upstream().await;
        let app = build_app(url, Recommendation::Ok, ProxyPolicy::default(), Arc::new(YesPrompter)).await;
        let router = router(app);

        let response = router
            .clone()
            .oneshot(Request::options("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );

        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let health: JsonValue = serde_json::from_slice(&bytes).unwrap();
        assert!(health["upstream"].as_str().unwrap().starts_with("http://"));
    }

    #[tokio::test]
    async fn test_once_cancels_after_first_request() {
        let (url, _) = spawn_upstream().await;
        let upstream = Upstream::new(HttpClient::new(), url);
        let queue = ScanQueue::new(Arc::new(StubScan {
            recommendation: Recommendation::Ok,
            simulation_success: true,
        }));
        let token = CancellationToken::new();
        let app = Arc::new(ProxyApp::new(
            upstream,
            queue,
            ProxyPolicy::default(),
            Some(Chain::Ethereum),
            None,
            Arc::new(YesPrompter),
            true,
            token.clone(),
        ));
        let router = router(app);
        assert!(!token.is_cancelled());
        post(&router, r#"{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}"#).await;
        assert!(token.is_cancelled());
    }
}
