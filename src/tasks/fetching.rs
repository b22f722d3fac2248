//! Bounded-concurrency fetch stage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, warn};

pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw payload for one fetch target.
///
/// Implementations must return an error on network failure, a non-success
/// status, or a malformed response.
#[async_trait]
pub trait ForecastSource: Send + Sync + 'static {
    type Payload: Send + 'static;

    async fn fetch(&self, target: &str, timeout: Duration) -> Result<Self::Payload>;
}

/// Issues one fetch per city, at most `max_workers` at a time.
pub struct Fetcher<S> {
    source: Arc<S>,
    max_workers: usize,
    timeout: Duration,
}

impl<S: ForecastSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            max_workers: DEFAULT_MAX_WORKERS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Caps the number of in-flight fetches. Zero is treated as one.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches every target and returns the successful payloads keyed by city.
    ///
    /// A failed or timed out fetch is logged and its city left out of the
    /// result; it never aborts the other fetches.
    #[tracing::instrument(skip(self, targets), fields(cities = targets.len(), max_workers = self.max_workers))]
    pub async fn fetch_all(&self, targets: HashMap<String, String>) -> HashMap<String, S::Payload> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();

        for (city, target) in targets {
            let sem = semaphore.clone();
            let source = self.source.clone();
            let timeout = self.timeout;
            let span = tracing::info_span!("fetch_city", city = %city);

            tasks.spawn(
                async move {
                    // The semaphore is never closed, so acquire only fails if it is dropped.
                    let _permit = match sem.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return (city, Err(anyhow::anyhow!(e))),
                    };

                    debug!(url = %target, "Fetching forecast");
                    let outcome = match tokio::time::timeout(timeout, source.fetch(&target, timeout)).await {
                        Ok(result) => result,
                        Err(_) => Err(anyhow::anyhow!("timed out after {}s", timeout.as_secs_f64())),
                    };
                    (city, outcome)
                }
                .instrument(span),
            );
        }

        let mut results = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((city, Ok(payload))) => {
                    debug!(city = %city, "Forecast fetched");
                    results.insert(city, payload);
                }
                Ok((city, Err(e))) => {
                    error!(city = %city, error = %e, "Fetching data generated an error");
                }
                Err(e) => {
                    warn!(error = %e, "Fetch task did not complete");
                }
            }
        }

        info!(fetched = results.len(), "Fetch stage finished");
        results
    }
}
