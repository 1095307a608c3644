//! Bounded-concurrency batch execution.
//!
//! [`run_batch`] fans a list of independent operations out as tasks,
//! caps how many run at once with a semaphore, and collects one result
//! per input item. A failing item never affects its siblings; callers
//! correlate results by key since completion order is not guaranteed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::DifyError;

/// Outcome of one item in a batch operation.
#[derive(Debug)]
pub struct BatchItemResult<T> {
    /// Caller-supplied key identifying the item (app ID, filename, ...).
    pub key: String,
    /// The item's success value or its error.
    pub outcome: Result<T, DifyError>,
}

impl<T> BatchItemResult<T> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DifyError> {
        self.outcome.as_ref().err()
    }
}

/// Run `operation` over every `(key, item)` pair with at most
/// `max_concurrency` in flight at once.
///
/// All items are scheduled up front; the semaphore gates execution, not
/// queuing. Returns exactly one result per input item, in completion
/// order. An empty item list returns an empty result list.
pub async fn run_batch<I, T, F, Fut>(
    items: Vec<(String, I)>,
    operation: F,
    max_concurrency: usize,
) -> Vec<BatchItemResult<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(String, I) -> Fut,
    Fut: Future<Output = Result<T, DifyError>> + Send + 'static,
{
    // A zero-permit gate would never admit anything.
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (key, item) in items {
        let semaphore = Arc::clone(&semaphore);
        let future = operation(key.clone(), item);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.unwrap();
            tracing::debug!(%key, "batch item admitted");
            let outcome = future.await;
            BatchItemResult { key, outcome }
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            // Per-item failures come back as `Err` outcomes above; a
            // panicking operation is a bug, not a batch result.
            Err(err) => {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
    results
}
