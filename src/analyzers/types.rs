//! Data types produced by the aggregation and ranking stages.

use serde::Serialize;

/// Favorability summary of one city over the whole forecast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct CitySummary {
    pub average_temperature: Option<f64>,
    pub total_relevant_condition_hours: u32,
}

impl CitySummary {
    pub fn new(average_temperature: Option<f64>, total_relevant_condition_hours: u32) -> Self {
        Self {
            average_temperature,
            total_relevant_condition_hours,
        }
    }

    /// Sort key for ranking; an absent average counts as 0.
    pub fn rank_key(&self) -> (f64, u32) {
        (
            self.average_temperature.unwrap_or(0.0),
            self.total_relevant_condition_hours,
        )
    }
}
