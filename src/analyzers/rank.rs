//! Favorability ranking of cities.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::error;

use crate::analyzers::types::CitySummary;

/// Ranks cities by descending `(average temperature, condition hours)`.
///
/// Ties keep the order of `entries`. A missing summary or a NaN temperature
/// makes a ranking impossible, and an empty list is returned instead.
pub fn rank_entries<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a CitySummary>)>,
{
    let mut keyed = Vec::new();

    for (city, summary) in entries {
        let Some(summary) = summary else {
            error!(city, "Summary missing, cannot rank cities");
            return Vec::new();
        };
        let (temp, hours) = summary.rank_key();
        if temp.is_nan() {
            error!(city, "Average temperature is NaN, cannot rank cities");
            return Vec::new();
        }
        keyed.push((city, temp, hours));
    }

    keyed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(b.2.cmp(&a.2))
    });

    keyed.into_iter().map(|(city, ..)| city.to_string()).collect()
}

/// Ranks every city in `summaries`; ties fall back to the city name.
pub fn rank(summaries: &HashMap<String, CitySummary>) -> Vec<String> {
    let mut entries: Vec<_> = summaries
        .iter()
        .map(|(city, summary)| (city.as_str(), Some(summary)))
        .collect();
    entries.sort_by_key(|(city, _)| *city);

    rank_entries(entries)
}

/// Returns the leading cities of `ranking` that share the best ranking key.
pub fn favorable_cities(ranking: &[String], summaries: &HashMap<String, CitySummary>) -> Vec<String> {
    let Some(best) = ranking.first().and_then(|city| summaries.get(city)) else {
        return Vec::new();
    };
    let best = best.rank_key();

    ranking
        .iter()
        .take_while(|city| summaries.get(*city).map(CitySummary::rank_key) == Some(best))
        .cloned()
        .collect()
}
