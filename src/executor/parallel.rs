//! Concurrent request fan-out
//!
//! Scatter-gather over a bounded set of request specs: every spec is spawned,
//! at most `max_concurrent` are in flight, and every result is joined and
//! returned in issue order.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::http::HttpClient;
use crate::spec::{PreparedSpec, SpecError, SpecOutcome};
use crate::utils::Timer;

/// Bounded fan-out executor
pub struct ParallelExecutor {
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Dispatch all specs concurrently and wait for every one of them
    pub async fn scatter_gather(
        &self,
        client: &HttpClient,
        specs: Vec<PreparedSpec>,
    ) -> Vec<Result<SpecOutcome, SpecError>> {
        info!(
            "Dispatching {} requests (max {} concurrent)",
            specs.len(),
            self.max_concurrent()
        );

        let timer = Timer::start("fan-out");
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let handles: Vec<_> = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| {
                let semaphore = Arc::clone(&semaphore);
                let client = client.clone();

                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| SpecError::Dispatch(e.to_string()))?;

                    debug!("Starting fan-out request {}: {}", index, spec.description());
                    spec.execute(&client).await
                })
            })
            .collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or_else(|e| Err(SpecError::Dispatch(e.to_string()))))
            .collect();

        debug!("Fan-out joined in {}ms", timer.stop());
        results
    }
}

/// Index of the first failed dispatch, if any
pub fn first_failure(results: &[Result<SpecOutcome, SpecError>]) -> Option<usize> {
    results.iter().position(|r| r.is_err())
}
