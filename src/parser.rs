//! JSON decoding of raw forecast payloads.
//!
//! Decoding is lenient below the top level: a field with an unusable value
//! reads as absent and an entry that is not an object is skipped, so one bad
//! hour or day never costs the whole forecast.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// A multi-day forecast for one city.
#[derive(Debug, Default, Deserialize)]
pub struct Forecast {
    #[serde(deserialize_with = "lenient_list")]
    pub forecasts: Vec<ForecastDay>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastDay {
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub hours: Vec<ForecastHour>,
}

/// One forecast hour. `hour` and `temp` keep their raw JSON form because the
/// API sends them as strings (`"13"`) as often as numbers.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastHour {
    #[serde(default)]
    hour: Option<Value>,
    #[serde(default)]
    temp: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub condition: Option<String>,
}

impl ForecastHour {
    /// Hour of day, or `None` unless it is a non-negative integer or a string
    /// holding one.
    pub fn hour(&self) -> Option<u32> {
        match self.hour.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|h| u32::try_from(h).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Temperature, from a number or a numeric string.
    pub fn temp(&self) -> Option<f64> {
        let temp = match self.temp.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        temp.filter(|t: &f64| t.is_finite())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Decodes a raw payload into a [`Forecast`].
///
/// An empty object or `null` yields `Ok(None)`: there is nothing to analyze.
///
/// # Errors
///
/// Returns an error if the payload is not an object or has no `forecasts`.
pub fn parse_forecast(payload: Value) -> Result<Option<Forecast>> {
    let is_empty = match &payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Ok(None);
    }

    let forecast = serde_json::from_value(payload).context("Malformed forecast payload")?;
    Ok(Some(forecast))
}
