use std::collections::HashMap;

use tracing::info;

use crate::analyzers::aggregate::aggregate_city;
use crate::analyzers::rank::rank;
use crate::analyzers::types::CitySummary;
use crate::error::PoolError;
use crate::stats::CityStats;
use crate::tasks::pool::WorkerPool;

/// Aggregates every city on the worker pool, then ranks the summaries.
///
/// # Errors
///
/// Only pool infrastructure failures are returned; a city whose aggregation
/// fails is simply missing from both outputs.
pub fn summarize_and_rank(
    pool: &WorkerPool,
    stats: HashMap<String, CityStats>,
) -> Result<(HashMap<String, CitySummary>, Vec<String>), PoolError> {
    let summaries = pool.execute(stats, aggregate_city)?;
    let ranking = rank(&summaries);

    info!(
        summarized = summaries.len(),
        ranked = ranking.len(),
        "Cities summarized and ranked"
    );
    Ok((summaries, ranking))
}
