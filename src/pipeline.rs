//! Composition of the fetch, statistics, aggregation and report stages.
//!
//! Stages run one after another and each hands its output to the next by
//! value. The worker pool blocks, so it runs on tokio's blocking threads.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::analyzers::analyzer::summarize_and_rank;
use crate::analyzers::rank::favorable_cities;
use crate::output::{build_rows, write_report};
use crate::stats::analyze_forecast;
use crate::tasks::fetching::{Fetcher, ForecastSource};
use crate::tasks::pool::WorkerPool;

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub requested: usize,
    pub fetched: usize,
    pub analyzed: usize,
    pub summarized: usize,
    pub ranking: Vec<String>,
    pub favorable: Vec<String>,
    pub rows: usize,
}

pub struct Pipeline<S> {
    fetcher: Fetcher<S>,
    pool: WorkerPool,
}

impl<S> Pipeline<S>
where
    S: ForecastSource<Payload = Value>,
{
    pub fn new(fetcher: Fetcher<S>, pool: WorkerPool) -> Self {
        Self { fetcher, pool }
    }

    /// Runs every stage for `targets` (city to forecast URL) and writes the
    /// report to `output`.
    ///
    /// # Errors
    ///
    /// Cities that fail along the way are dropped, not reported as errors.
    /// Errors come from worker pool failures or from writing the report.
    #[tracing::instrument(skip(self, targets), fields(cities = targets.len(), output = %output.display()))]
    pub async fn run(&self, targets: HashMap<String, String>, output: &Path) -> Result<PipelineReport> {
        let requested = targets.len();
        let pool = self.pool;

        let payloads = self.fetcher.fetch_all(targets).await;
        let fetched = payloads.len();

        let stats = tokio::task::spawn_blocking(move || pool.execute(payloads, analyze_forecast))
            .await
            .context("Statistics stage did not complete")??;
        let analyzed = stats.len();
        info!(analyzed, "Daily statistics calculated");

        let aggregate_input = stats.clone();
        let (summaries, ranking) =
            tokio::task::spawn_blocking(move || summarize_and_rank(&pool, aggregate_input))
                .await
                .context("Aggregation stage did not complete")??;

        let rows = build_rows(&stats, &summaries, &ranking);
        write_report(output, &rows)?;
        info!(rows = rows.len(), "Report written");

        let favorable = favorable_cities(&ranking, &summaries);

        Ok(PipelineReport {
            requested,
            fetched,
            analyzed,
            summarized: summaries.len(),
            favorable,
            ranking,
            rows: rows.len(),
        })
    }
}
