//! Report rows and CSV persistence.
//!
//! Each ranked city contributes one row per forecast day, repeating the
//! city's summary next to that day's statistics.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::types::CitySummary;
use crate::stats::CityStats;

/// One `(city, day)` line of the report. Absent values are written as 0.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub city: String,
    pub avg_temperature: f64,
    pub total_cond_hours: u32,
    pub date: String,
    pub hour_start: u32,
    pub hour_end: u32,
    pub hour_count: u32,
    pub daily_avg_temp: f64,
    pub daily_cond_hours: u32,
}

/// Joins daily statistics and summaries into report rows in `ranking` order.
///
/// Cities absent from `ranking` are left out. A ranked city without a summary
/// gets zeroed summary columns; one without statistics contributes no rows.
pub fn build_rows(
    stats: &HashMap<String, CityStats>,
    summaries: &HashMap<String, CitySummary>,
    ranking: &[String],
) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for city in ranking {
        let summary = summaries.get(city).copied().unwrap_or_else(|| {
            warn!(city = %city, "No summary for ranked city, using zeros");
            CitySummary::default()
        });
        let Some(city_stats) = stats.get(city) else {
            warn!(city = %city, "No daily statistics for ranked city");
            continue;
        };

        for day in &city_stats.days {
            rows.push(ReportRow {
                city: city.clone(),
                avg_temperature: summary.average_temperature.unwrap_or(0.0),
                total_cond_hours: summary.total_relevant_condition_hours,
                date: day.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                hour_start: day.hour_start.unwrap_or(0),
                hour_end: day.hour_end.unwrap_or(0),
                hour_count: day.hours_count,
                daily_avg_temp: day.temp_avg.unwrap_or(0.0),
                daily_cond_hours: day.relevant_cond_hours,
            });
        }
    }

    rows
}

/// Writes `rows` as CSV to `path`, replacing any previous report.
///
/// The header is written even when there are no rows.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    }
    debug!(path = %path.display(), rows = rows.len(), "Writing report");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open report {}", path.display()))?;

    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

const HEADER: [&str; 9] = [
    "City",
    "Avg Temperature",
    "Total Cond Hours",
    "Date",
    "Hour Start",
    "Hour End",
    "Hour Count",
    "Daily Avg Temp",
    "Daily Cond Hours",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DayStats;
    use chrono::NaiveDate;
    use std::env;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn day(date: &str, temp_avg: Option<f64>, hours: u32) -> DayStats {
        DayStats {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            hour_start: Some(9),
            hour_end: Some(19),
            hours_count: 11,
            temp_avg,
            relevant_cond_hours: hours,
        }
    }

    fn sample() -> (HashMap<String, CityStats>, HashMap<String, CitySummary>) {
        let stats = HashMap::from([
            (
                "City1".to_string(),
                CityStats {
                    days: vec![day("2023-01-01", Some(20.0), 5)],
                },
            ),
            (
                "City2".to_string(),
                CityStats {
                    days: vec![day("2023-01-02", Some(25.0), 3), day("2023-01-03", None, 0)],
                },
            ),
        ]);
        let summaries = HashMap::from([
            ("City1".to_string(), CitySummary::new(Some(20.0), 5)),
            ("City2".to_string(), CitySummary::new(Some(25.0), 3)),
        ]);
        (stats, summaries)
    }

    #[test]
    fn test_build_rows_follows_ranking() {
        let (stats, summaries) = sample();
        let ranking = vec!["City2".to_string(), "City1".to_string()];

        let rows = build_rows(&stats, &summaries, &ranking);

        let cities: Vec<_> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["City2", "City2", "City1"]);
        assert_eq!(rows[0].avg_temperature, 25.0);
        assert_eq!(rows[0].date, "2023-01-02");
        assert_eq!(rows[1].daily_avg_temp, 0.0);
        assert_eq!(rows[1].total_cond_hours, 3);
    }

    #[test]
    fn test_build_rows_skips_unranked_cities() {
        let (stats, summaries) = sample();
        let rows = build_rows(&stats, &summaries, &["City1".to_string()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city, "City1");
    }

    #[test]
    fn test_build_rows_zero_fills_missing_summary() {
        let (stats, _) = sample();
        let rows = build_rows(&stats, &HashMap::new(), &["City1".to_string()]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].avg_temperature, 0.0);
        assert_eq!(rows[0].total_cond_hours, 0);
        assert_eq!(rows[0].daily_cond_hours, 5);
    }

    #[test]
    fn test_build_rows_ranked_city_without_stats() {
        let (stats, summaries) = sample();
        let rows = build_rows(&stats, &summaries, &["Nowhere".to_string()]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_report_header_and_rows() {
        let path = temp_path("forecast_rater_test_report.csv");
        let _ = fs::remove_file(&path);
        let (stats, summaries) = sample();
        let ranking = vec!["City1".to_string(), "City2".to_string()];

        write_report(&path, &build_rows(&stats, &summaries, &ranking)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "City,Avg Temperature,Total Cond Hours,Date,Hour Start,Hour End,Hour Count,Daily Avg Temp,Daily Cond Hours"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("City1,20.0,5,2023-01-01,9,19,11,20.0,5"));
        assert!(lines[2].starts_with("City2"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_replaces_previous_file() {
        let path = temp_path("forecast_rater_test_replace.csv");
        let (stats, summaries) = sample();
        let ranking = vec!["City2".to_string()];
        let rows = build_rows(&stats, &summaries, &ranking);

        write_report(&path, &rows).unwrap();
        write_report(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_empty_rows_has_header() {
        let path = temp_path("forecast_rater_test_empty.csv");
        write_report(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        fs::remove_file(&path).unwrap();
    }
}
