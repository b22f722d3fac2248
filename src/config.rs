//! Run configuration: the city list and environment settings.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;

const FORECAST_BASE_URL: &str = "https://code.s3.yandex.net/async-module";

const DEFAULT_CITIES: &[(&str, &str)] = &[
    ("MOSCOW", "moscow"),
    ("PARIS", "paris"),
    ("LONDON", "london"),
    ("BERLIN", "berlin"),
    ("BEIJING", "beijing"),
    ("KAZAN", "kazan"),
    ("SPETERSBURG", "spetersburg"),
    ("VOLGOGRAD", "volgograd"),
    ("NOVOSIBIRSK", "novosibirsk"),
    ("KALININGRAD", "kaliningrad"),
    ("ABUDHABI", "abudhabi"),
    ("WARSZAWA", "warszawa"),
    ("BUCHAREST", "bucharest"),
    ("ROMA", "roma"),
    ("CAIRO", "cairo"),
];

/// Maps city names to the URL of their forecast.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "MOSCOW": "https://code.s3.yandex.net/async-module/moscow-response.json",
///   "PARIS": "https://code.s3.yandex.net/async-module/paris-response.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    entries: HashMap<String, String>,
}

impl CityConfig {
    /// Loads the city list from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read city list {}", path.display()))?;
        let entries: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("City list {} is not a JSON object of URLs", path.display()))?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_targets(self) -> HashMap<String, String> {
        self.entries
    }
}

impl Default for CityConfig {
    fn default() -> Self {
        let entries = DEFAULT_CITIES
            .iter()
            .map(|(city, slug)| {
                (
                    city.to_string(),
                    format!("{FORECAST_BASE_URL}/{slug}-response.json"),
                )
            })
            .collect();
        Self { entries }
    }
}

/// Settings read from the environment (and `.env`, once loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base log level, e.g. `INFO` or `debug`.
    pub app_debug_level: String,
    pub log_file_path: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            app_debug_level: lookup("APP_DEBUG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            log_file_path: lookup("LOG_FILE_PATH")
                .unwrap_or_else(|| "logs/forecast_rater.log".to_string()),
        }
    }

    /// The base log level. Accepts tracing level names and the Python-style
    /// `WARNING`, `CRITICAL` and `FATAL`.
    pub fn log_level(&self) -> Result<LevelFilter> {
        let level = self.app_debug_level.trim().to_lowercase();
        let level = match level.as_str() {
            "warning" => "warn",
            "critical" | "fatal" => "error",
            other => other,
        };
        level
            .parse()
            .with_context(|| format!("Unknown APP_DEBUG_LEVEL {:?}", self.app_debug_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_default_cities() {
        let config = CityConfig::default();
        assert_eq!(config.len(), 15);
        assert_eq!(
            config.into_targets()["MOSCOW"],
            "https://code.s3.yandex.net/async-module/moscow-response.json"
        );
    }

    #[test]
    fn test_load_city_list() {
        let path = env::temp_dir().join("forecast_rater_test_cities.json");
        fs::write(&path, r#"{"CITY1": "http://example.com/city1"}"#).unwrap();

        let config = CityConfig::load(&path).unwrap();

        assert_eq!(config.len(), 1);
        assert_eq!(config.into_targets()["CITY1"], "http://example.com/city1");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_non_object() {
        let path = env::temp_dir().join("forecast_rater_test_bad_cities.json");
        fs::write(&path, r#"["http://example.com/city1"]"#).unwrap();

        assert!(CityConfig::load(&path).is_err());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.log_level().unwrap(), LevelFilter::INFO);
        assert_eq!(settings.log_file_path, "logs/forecast_rater.log");
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = Settings::from_lookup(|key| match key {
            "APP_DEBUG_LEVEL" => Some("DEBUG".to_string()),
            _ => None,
        });
        assert_eq!(settings.log_level().unwrap(), LevelFilter::DEBUG);
    }

    fn level_of(name: &str) -> Result<LevelFilter> {
        let name = name.to_string();
        Settings::from_lookup(move |key| (key == "APP_DEBUG_LEVEL").then(|| name.clone())).log_level()
    }

    #[test]
    fn test_settings_python_level_names() {
        assert_eq!(level_of("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(level_of("warn").unwrap(), LevelFilter::WARN);
        assert_eq!(level_of("CRITICAL").unwrap(), LevelFilter::ERROR);
        assert_eq!(level_of(" fatal ").unwrap(), LevelFilter::ERROR);
        assert_eq!(level_of("Trace").unwrap(), LevelFilter::TRACE);
    }

    #[test]
    fn test_settings_unknown_level_is_rejected() {
        let err = level_of("loud").unwrap_err();
        assert!(err.to_string().contains("APP_DEBUG_LEVEL"));
    }
}
