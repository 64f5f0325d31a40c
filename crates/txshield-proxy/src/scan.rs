//! The serialized scan queue and the analyzer-backed scan service.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::Mutex;
use txshield_analyzer::{AnalyzeOptions, Analyzer};
use txshield_types::{CalldataInput, Chain, Recommendation, Severity};

/// What the proxy needs back from a scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub recommendation: Recommendation,
    pub simulation_success: bool,
    /// The full serialized [`AnalysisResult`](txshield_types::AnalysisResult).
    pub response: JsonValue,
    pub rendered: String,
}

#[async_trait]
pub trait ScanService: Send + Sync {
    async fn scan(&self, input: CalldataInput, chain: Chain) -> ScanOutcome;
}

/// Wraps a service in a one-slot lock: scans run strictly one at a time
/// even when many interceptions are in flight, so interactive prompts
/// never interleave and provider rate limits hold.
pub struct ScanQueue {
    service: Arc<dyn ScanService>,
    slot: Mutex<()>,
}

impl ScanQueue {
    pub fn new(service: Arc<dyn ScanService>) -> Self {
        ScanQueue {
            service,
            slot: Mutex::new(()),
        }
    }

    pub async fn scan(&self, input: CalldataInput, chain: Chain) -> ScanOutcome {
        let _guard = self.slot.lock().await;
        self.service.scan(input, chain).await
    }
}

/// The production service: a full analyzer pass plus a compact text
/// rendering for prompts and recordings.
pub struct AnalyzerScanService {
    analyzer: Arc<Analyzer>,
    options: AnalyzeOptions,
}

impl AnalyzerScanService {
    pub fn new(analyzer: Arc<Analyzer>, options: AnalyzeOptions) -> Self {
        AnalyzerScanService { analyzer, options }
    }
}

#[async_trait]
impl ScanService for AnalyzerScanService {
    async fn scan(&self, input: CalldataInput, chain: Chain) -> ScanOutcome {
        let result = self.analyzer.analyze(&input, chain, self.options, None).await;
        let simulation_success = result
            .simulation
            .as_ref()
            .map(|sim| sim.success)
            .unwrap_or(true);

        let mut rendered = format!(
            "{} {:#x} on {chain}\n",
            result.recommendation.as_str().to_ascii_uppercase(),
            input.to
        );
        if let Some(intent) = &result.intent {
            rendered.push_str(&format!("intent: {intent}\n"));
        }
        for finding in &result.findings {
            let marker = match finding.level {
                Severity::Danger => "!!",
                Severity::Warning => " !",
                Severity::Info => " i",
                Severity::Safe => " +",
            };
            rendered.push_str(&format!("{marker} {}: {}\n", finding.code, finding.message));
        }

        ScanOutcome {
            recommendation: result.recommendation,
            simulation_success,
            response: serde_json::to_value(&result).unwrap_or(JsonValue::Null),
            rendered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowService {
        concurrent: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ScanService for SlowService {
        async fn scan(&self, _input: CalldataInput, _chain: Chain) -> ScanOutcome {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            ScanOutcome {
                recommendation: Recommendation::Ok,
                simulation_success: true,
                response: JsonValue::Null,
                rendered: String::new(),
            }
        }
    }

    #[tokio::test]
    async fn test_queue_serializes_scans() {
        let service = Arc::new(SlowService {
            concurrent: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let queue = Arc::new(ScanQueue::new(service.clone()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .scan(
                        CalldataInput::address_only(Address::ZERO, Some(Chain::Ethereum)),
                        Chain::Ethereum,
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(service.peak.load(Ordering::SeqCst), 1);
    }
}
