// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Parallel Stage Executor
 * Bounded-concurrency fan-out for per-target stage work
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `work` over every item with at most `max_parallel` futures in flight.
/// Results come back in completion order, one per item, failures included;
/// a single failing item never aborts the batch.
pub async fn run_parallel<I, T, F, Fut, R>(
    items: I,
    max_parallel: usize,
    work: F,
) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(work)
        .buffer_unordered(max_parallel.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{PipelineError, PipelineResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_all_items_complete_despite_one_failure() {
        let results: Vec<PipelineResult<usize>> = run_parallel(0..10usize, 3, |n| async move {
            if n == 7 {
                Err(PipelineError::ToolFailure {
                    tool: "gobuster".to_string(),
                    reason: "exit 1".to_string(),
                })
            } else {
                Ok(n * 2)
            }
        })
        .await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 9);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let _: Vec<()> = run_parallel(0..20usize, 5, |_| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn test_zero_parallelism_clamped_to_one() {
        let results: Vec<usize> = run_parallel(vec![1, 2, 3], 0, |n| async move { n }).await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty() {
        let results: Vec<usize> =
            run_parallel(Vec::<usize>::new(), 4, |n| async move { n }).await;
        assert!(results.is_empty());
    }
}
