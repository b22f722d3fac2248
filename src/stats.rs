use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::analyzers::utility::{mean, round3};
use crate::parser::{Forecast, ForecastDay, parse_forecast};

/// First hour of the daytime window, inclusive.
pub const DAY_HOURS_START: u32 = 9;
/// Last hour of the daytime window, inclusive.
pub const DAY_HOURS_END: u32 = 19;
/// Conditions that count as favorable weather.
pub const SUITABLE_CONDITIONS: &[&str] = &["clear", "partly-cloudy", "cloudy", "overcast"];

/// Weather statistics for the daytime window of one day.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub date: Option<NaiveDate>,
    pub hour_start: Option<u32>,
    pub hour_end: Option<u32>,
    pub hours_count: u32,
    pub temp_avg: Option<f64>,
    pub relevant_cond_hours: u32,
}

/// Daily statistics for one city, in forecast order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CityStats {
    pub days: Vec<DayStats>,
}

impl DayStats {
    pub fn from_day(day: &ForecastDay) -> Self {
        let mut s = DayStats {
            date: day.date,
            ..Default::default()
        };
        let mut temps = Vec::new();

        for h in &day.hours {
            let Some(hour) = h.hour() else {
                continue;
            };
            if !(DAY_HOURS_START..=DAY_HOURS_END).contains(&hour) {
                continue;
            }

            s.hour_start.get_or_insert(hour);
            s.hour_end = Some(hour);
            s.hours_count += 1;

            if let Some(temp) = h.temp() {
                temps.push(temp);
            }

            if h
                .condition
                .as_deref()
                .is_some_and(|c| SUITABLE_CONDITIONS.contains(&c))
            {
                s.relevant_cond_hours += 1;
            }
        }

        if !temps.is_empty() {
            s.temp_avg = Some(round3(mean(&temps)));
        }

        s
    }
}

impl CityStats {
    pub fn from_forecast(forecast: &Forecast) -> Self {
        CityStats {
            days: forecast.forecasts.iter().map(DayStats::from_day).collect(),
        }
    }
}

/// Statistics calculation for the worker pool: raw payload to [`CityStats`].
///
/// Empty payloads produce no result.
pub fn analyze_forecast(payload: Value) -> Result<Option<CityStats>> {
    Ok(parse_forecast(payload)?.map(|forecast| CityStats::from_forecast(&forecast)))
}
