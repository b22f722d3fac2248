use crate::analyzers::types::CitySummary;
use crate::analyzers::utility::{mean, round3};
use crate::stats::CityStats;

impl CitySummary {
    /// Aggregates a city's daily statistics.
    ///
    /// Days without a temperature do not count towards the average; the
    /// average is absent when no day has one.
    pub fn from_stats(stats: &CityStats) -> Self {
        let temps: Vec<f64> = stats.days.iter().filter_map(|d| d.temp_avg).collect();
        let average_temperature = (!temps.is_empty()).then(|| round3(mean(&temps)));

        let total_relevant_condition_hours = stats.days.iter().map(|d| d.relevant_cond_hours).sum();

        CitySummary::new(average_temperature, total_relevant_condition_hours)
    }
}

/// Aggregation calculation for the worker pool: [`CityStats`] to [`CitySummary`].
pub fn aggregate_city(stats: CityStats) -> anyhow::Result<Option<CitySummary>> {
    Ok(Some(CitySummary::from_stats(&stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DayStats;

    fn day(temp_avg: Option<f64>, relevant_cond_hours: u32) -> DayStats {
        DayStats {
            temp_avg,
            relevant_cond_hours,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_stats_averages_days() {
        let stats = CityStats {
            days: vec![day(Some(20.0), 5), day(Some(22.0), 4)],
        };

        let summary = CitySummary::from_stats(&stats);

        assert_eq!(summary, CitySummary::new(Some(21.0), 9));
    }

    #[test]
    fn test_from_stats_skips_days_without_temperature() {
        let stats = CityStats {
            days: vec![day(Some(25.0), 3), day(None, 2), day(Some(23.0), 6)],
        };

        let summary = CitySummary::from_stats(&stats);

        assert_eq!(summary, CitySummary::new(Some(24.0), 11));
    }

    #[test]
    fn test_from_stats_no_days() {
        let summary = CitySummary::from_stats(&CityStats::default());
        assert_eq!(summary, CitySummary::new(None, 0));
    }
}
