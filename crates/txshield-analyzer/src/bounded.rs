//! Bounded concurrency: run N task factories with at most K in flight.
//!
//! Results come back in factory order regardless of completion order. Used
//! by the Safe ingest path (K=3) and anywhere else a burst of similar work
//! must not stampede a rate-limited backend.

use futures_util::StreamExt;
use futures_util::stream;
use std::future::Future;

pub async fn run_bounded<T, F, Fut>(factories: Vec<F>, limit: usize) -> Vec<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let limit = limit.max(1);
    stream::iter(factories)
        .map(|factory| factory())
        .buffered(limit)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_preserve_order() {
        // Later tasks finish sooner; order must still match input order.
        let factories: Vec<_> = (0..5u64)
            .map(|i| {
                move || async move {
                    tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
                    i
                }
            })
            .collect();
        let results = run_bounded(factories, 5).await;
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let factories: Vec<_> = (0..10)
            .map(|_| {
                let current = current.clone();
                let peak = peak.clone();
                move || async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();
        run_bounded(factories, 3).await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_zero_limit_clamps_to_one() {
        let results = run_bounded(vec![|| async { 7 }], 0).await;
        assert_eq!(results, vec![7]);
    }
}
