//! Bounded fan-out for independent vendor calls
//!
//! A producer feeds items into a bounded channel; a fixed number of workers pull from it
//! and run the job. All workers are polled by the calling task, so dropping the returned
//! future cancels every in-flight job. The first hard failure ends the run and drops
//! the remaining workers.

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use crate::error::{ProviderError, Result};

/// Worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerPoolConfig {
    /// Concurrent workers.
    pub workers: usize,
    /// Items buffered between the producer and the workers.
    pub queue_capacity: usize,
    /// Attempts per item for retryable errors (1 = no retry).
    pub max_attempts: u32,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 16,
            max_attempts: 3,
        }
    }
}

/// Run `job` over `items` with at most `config.workers` jobs in flight.
///
/// Results are returned in input order. A job failing with a retryable error is retried by
/// the same worker up to `config.max_attempts` times in total.
pub async fn run_bounded<T, R, F, Fut>(
    provider: &str,
    items: Vec<T>,
    config: &WorkerPoolConfig,
    job: F,
) -> Result<Vec<R>>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    if config.workers == 0 || config.queue_capacity == 0 {
        return Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "pool".to_string(),
            detail: "workers and queue capacity must be greater than zero".to_string(),
        });
    }

    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let workers = config.workers.min(total);
    let max_attempts = config.max_attempts.max(1);

    let (tx, rx) = mpsc::channel::<(usize, T)>(config.queue_capacity);
    let rx = Arc::new(Mutex::new(rx));

    let producer = async move {
        for entry in items.into_iter().enumerate() {
            if tx.send(entry).await.is_err() {
                // workers are gone, the run already failed
                break;
            }
        }
        Ok::<_, ProviderError>(())
    };

    let job = &job;
    let worker_futures = (0..workers).map(|worker| {
        let rx = Arc::clone(&rx);
        async move {
            let mut done = Vec::new();
            loop {
                let next = rx.lock().await.recv().await;
                let Some((index, item)) = next else {
                    break;
                };
                let mut attempt = 1;
                let result = loop {
                    match job(item.clone()).await {
                        Err(e) if e.is_retryable() && attempt < max_attempts => {
                            log::warn!(
                                "[{provider}] Worker {worker}: item {index} failed (attempt {attempt}/{max_attempts}): {e}"
                            );
                            attempt += 1;
                        }
                        other => break other,
                    }
                };
                done.push((index, result?));
            }
            Ok::<_, ProviderError>(done)
        }
    });

    let ((), per_worker) = futures::try_join!(producer, try_join_all(worker_futures))?;

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    for (index, value) in per_worker.into_iter().flatten() {
        slots[index] = Some(value);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| ProviderError::Unknown {
                provider: provider.to_string(),
                raw_code: None,
                raw_message: format!("worker pool lost item {index}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn config(workers: usize) -> WorkerPoolConfig {
        WorkerPoolConfig {
            workers,
            queue_capacity: 2,
            max_attempts: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_input_order() {
        let items: Vec<u64> = (1..=8).collect();
        let out = run_bounded("test", items, &config(3), |n| async move {
            // later items finish first
            tokio::time::sleep(Duration::from_millis(100 * (10 - n))).await;
            Ok(n * 10)
        })
        .await
        .unwrap();
        assert_eq!(out, vec![10, 20, 30, 40, 50, 60, 70, 80]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_worker_count() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<u32> = (0..20).collect();

        run_bounded("test", items, &config(4), |_| {
            let active = &active;
            let peak = &peak;
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn retryable_errors_are_retried_per_item() {
        let calls = AtomicUsize::new(0);
        let out = run_bounded("test", vec!["a"], &config(1), |item| {
            let calls = &calls;
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProviderError::NetworkError {
                        provider: "test".into(),
                        detail: "reset".into(),
                    })
                } else {
                    Ok(item.len())
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_hard_failure_stops_the_run() {
        let calls = AtomicUsize::new(0);
        let items: Vec<u32> = (0..50).collect();
        let result = run_bounded("test", items, &config(2), |n| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if n == 3 {
                    Err(ProviderError::InvalidParameter {
                        provider: "test".into(),
                        param: "n".into(),
                        detail: "three".into(),
                    })
                } else {
                    tokio::task::yield_now().await;
                    Ok(n)
                }
            }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::InvalidParameter { .. })));
        assert!(calls.load(Ordering::SeqCst) < 50);
    }

    #[tokio::test]
    async fn empty_input_and_zero_workers() {
        let out: Vec<u8> = run_bounded("test", Vec::<u8>::new(), &config(2), |n| async move { Ok(n) })
            .await
            .unwrap();
        assert!(out.is_empty());

        let err = run_bounded("test", vec![1u8], &config(0), |n| async move { Ok(n) }).await;
        assert!(matches!(err, Err(ProviderError::InvalidParameter { .. })));
    }
}
