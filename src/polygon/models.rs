//! Polygon.io Aggregates Data Models

use chrono::DateTime;
use chrono_tz::America::New_York;
use serde::Deserialize;
use tracing::warn;

use crate::types::{Bar, BarSeries};

/// Response statuses carrying usable results ("DELAYED" is normal on the free tier)
pub const ACCEPTED_STATUSES: [&str; 2] = ["OK", "DELAYED"];

/// Response from `GET /v2/aggs/ticker/{ticker}/range/{mult}/{span}/{from}/{to}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub results_count: Option<u64>,
    #[serde(default)]
    pub results: Vec<AggregateBar>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AggregatesResponse {
    pub fn is_accepted(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| ACCEPTED_STATUSES.contains(&s))
    }

    /// Best available description of a rejected response
    pub fn error_text(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| format!("Unexpected status: {}", self.status.as_deref().unwrap_or("None")))
    }

    /// Convert results to bars keyed by Eastern wall-clock time
    pub fn to_bar_series(&self) -> BarSeries {
        let mut bars = BarSeries::new();
        for result in &self.results {
            let Some(utc) = DateTime::from_timestamp_millis(result.timestamp_ms) else {
                warn!("Skipping bar with invalid timestamp {}", result.timestamp_ms);
                continue;
            };
            let Some(bar) = result.to_bar() else {
                warn!("Skipping malformed bar at {}", utc);
                continue;
            };
            bars.insert(utc.with_timezone(&New_York).naive_local(), bar);
        }
        bars
    }
}

/// A single aggregate bar
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateBar {
    /// Bar start, Unix milliseconds
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    /// Volume weighted average price
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    /// Number of transactions
    #[serde(rename = "n", default)]
    pub transactions: Option<u64>,
}

impl AggregateBar {
    /// None if any price is non-finite or negative
    pub fn to_bar(&self) -> Option<Bar> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return None;
        }

        Some(Bar {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: if self.volume.is_finite() && self.volume > 0.0 {
                self.volume as u64
            } else {
                0
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "ticker": "SPY",
        "queryCount": 2,
        "resultsCount": 3,
        "adjusted": true,
        "status": "DELAYED",
        "request_id": "abc",
        "results": [
            {"v": 1200345.0, "vw": 590.1, "o": 590.0, "c": 590.5, "h": 591.0, "l": 589.5, "t": 1735828200000, "n": 9000},
            {"v": 800000, "o": 590.5, "c": 589.9, "h": 590.8, "l": 589.0, "t": 1735828500000},
            {"v": 10, "o": -1.0, "c": 1.0, "h": 1.0, "l": 1.0, "t": 1735828800000}
        ]
    }"#;

    #[test]
    fn test_parse_and_convert() {
        let response: AggregatesResponse = serde_json::from_str(SAMPLE).unwrap();
        assert!(response.is_accepted());
        assert_eq!(response.results_count, Some(3));
        assert_eq!(response.results.len(), 3);

        let bars = response.to_bar_series();
        // Negative open is dropped
        assert_eq!(bars.len(), 2);

        // 2025-01-02 14:30 UTC is 09:30 EST
        let first = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let bar = bars[&first];
        assert_eq!(bar.open, 590.0);
        assert_eq!(bar.volume, 1_200_345);
    }

    #[test]
    fn test_daylight_saving_conversion() {
        let json = r#"{"status": "OK", "results": [
            {"v": 1, "o": 1.0, "c": 1.0, "h": 1.0, "l": 1.0, "t": 1751463000000}
        ]}"#;
        let response: AggregatesResponse = serde_json::from_str(json).unwrap();
        let bars = response.to_bar_series();

        // 2025-07-02 13:30 UTC is 09:30 EDT
        let key = NaiveDate::from_ymd_opt(2025, 7, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert!(bars.contains_key(&key));
    }

    #[test]
    fn test_rejected_status() {
        let json = r#"{"status": "ERROR", "request_id": "x", "error": "Unknown API Key"}"#;
        let response: AggregatesResponse = serde_json::from_str(json).unwrap();
        assert!(!response.is_accepted());
        assert_eq!(response.error_text(), "Unknown API Key");
        assert!(response.to_bar_series().is_empty());

        let json = r#"{"status": "NOT_AUTHORIZED"}"#;
        let response: AggregatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error_text(), "Unexpected status: NOT_AUTHORIZED");
    }

    #[test]
    fn test_missing_results_is_empty() {
        let json = r#"{"status": "OK", "resultsCount": 0}"#;
        let response: AggregatesResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_accepted());
        assert!(response.to_bar_series().is_empty());
    }
}
