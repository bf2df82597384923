//! Bounded fan-out for batch operations.
//!
//! Each item runs on its own task; a shared semaphore caps how many are in
//! flight. Outcomes come back in input order no matter which task finishes
//! first, and a failing or panicking item only affects its own slot.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Success { data: Value },
    Error { error: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One row of a batch response: the input position, the fields identifying
/// the sub-request, and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow<K> {
    pub index: usize,
    #[serde(flatten)]
    pub key: K,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl<K> BatchRow<K> {
    pub fn new(index: usize, key: K, outcome: BatchOutcome) -> Self {
        Self {
            index,
            key,
            outcome,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    concurrency: usize,
}

impl BatchExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<T, E, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<BatchOutcome>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
    {
        let gate = Arc::new(Semaphore::new(self.concurrency));
        let task = Arc::new(task);

        let handles = items
            .into_iter()
            .map(|item| {
                let gate = Arc::clone(&gate);
                let task = Arc::clone(&task);
                tokio::spawn(async move {
                    let _permit = gate
                        .acquire_owned()
                        .await
                        .map_err(|_| "batch admission gate closed".to_string())?;
                    task(item).await.map_err(|err| err.to_string())
                })
            })
            .collect::<Vec<_>>();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = match handle.await {
                Ok(Ok(data)) => BatchOutcome::Success { data },
                Ok(Err(error)) => BatchOutcome::Error { error },
                Err(join) => BatchOutcome::Error {
                    error: format!("batch worker failed: {join}"),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
