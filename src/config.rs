//! Runtime configuration for the level calculator

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{America::New_York, Tz};
use std::path::PathBuf;

use crate::polygon::{PolygonClient, DEFAULT_BASE_URL};
use crate::store::{JsonFileStore, DEFAULT_DATA_FILE};

/// Accepted formats for an explicit invocation time (Eastern Time)
const INVOCATION_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Polygon.io API key; required only when fetching
    pub api_key: Option<String>,

    /// Polygon.io base URL
    pub base_url: String,

    /// JSON state file
    pub data_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl AppConfig {
    /// API key, or an error if it was not provided
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("POLYGON_API_KEY environment variable not set"))
    }

    pub fn polygon_client(&self) -> Result<PolygonClient> {
        let api_key = self.require_api_key()?;
        PolygonClient::new(api_key.to_string(), self.base_url.clone())
    }

    pub fn state_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.data_file)
    }
}

/// Current wall-clock time in Eastern Time
pub fn now_eastern() -> DateTime<Tz> {
    Utc::now().with_timezone(&New_York)
}

/// Parse "YYYY-MM-DD HH:MM[:SS]" as Eastern Time
pub fn parse_eastern_time(input: &str) -> Result<DateTime<Tz>> {
    let naive = INVOCATION_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input.trim(), fmt).ok())
        .with_context(|| format!("Invalid time '{}', expected YYYY-MM-DD HH:MM", input))?;

    New_York
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("'{}' does not exist in US/Eastern", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_missing_api_key() {
        let config = AppConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("POLYGON_API_KEY"));
        assert!(config.polygon_client().is_err());

        let blank = AppConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.require_api_key().is_err());
    }

    #[test]
    fn test_api_key_present() {
        let config = AppConfig {
            api_key: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "abc123");
        assert!(config.polygon_client().is_ok());
        assert_eq!(config.state_store().path(), std::path::Path::new(DEFAULT_DATA_FILE));
    }

    #[test]
    fn test_parse_eastern_time() {
        let t = parse_eastern_time("2025-03-20 13:05").unwrap();
        assert_eq!(t.hour(), 13);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.with_timezone(&Utc).hour(), 17); // EDT

        let t = parse_eastern_time("2025-01-02 16:00:30").unwrap();
        assert_eq!(t.with_timezone(&Utc).hour(), 21); // EST

        assert!(parse_eastern_time("tomorrow").is_err());
        // Skipped by the spring-forward transition
        assert!(parse_eastern_time("2025-03-09 02:30").is_err());
    }
}
