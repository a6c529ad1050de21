//! Polygon.io API Client
//!
//! Fetches 5-minute SPY aggregates (SPY tracks SPX closely).

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use super::models::AggregatesResponse;
use crate::types::{BarSeries, BarSource, FetchWindow};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Index proxy whose bars are fetched
pub const PROXY_TICKER: &str = "SPY";

/// Bar size in minutes
pub const BAR_MINUTES: u32 = 5;

/// Maximum results per aggregates request
const RESULT_LIMIT: u32 = 50_000;

/// Polygon.io REST client
pub struct PolygonClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PolygonClient {
    /// Create a new client from environment variables
    ///
    /// Expects:
    /// - `POLYGON_API_KEY` - Your Polygon.io API key
    /// - `POLYGON_BASE_URL` (optional) - API base URL
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .context("POLYGON_API_KEY environment variable not set")?;
        let base_url = std::env::var("POLYGON_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::new(api_key, base_url)
    }

    /// Create a new client with explicit configuration
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn aggregates_url(&self, window: &FetchWindow) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/minute/{}/{}",
            self.base_url,
            PROXY_TICKER,
            BAR_MINUTES,
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d"),
        )
    }

    /// Fetch aggregates for the window, failing on any unusable response
    pub async fn fetch_aggregates(&self, window: &FetchWindow) -> Result<AggregatesResponse> {
        let limit = RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(self.aggregates_url(window))
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", limit.as_str()),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send aggregates request")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!("API Response Status Code: {}", status.as_u16());

        let aggregates: AggregatesResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse aggregates response (HTTP {})", status))?;

        info!(
            "API Response Status: {}",
            aggregates.status.as_deref().unwrap_or("No status")
        );
        info!("Result count: {}", aggregates.results_count.unwrap_or(0));

        if !aggregates.is_accepted() {
            return Err(anyhow!("API Error: {}", aggregates.error_text()));
        }

        Ok(aggregates)
    }
}

impl BarSource for PolygonClient {
    async fn fetch_bars(&self, window: &FetchWindow) -> BarSeries {
        info!(
            "Fetching {} {}-minute bars {} to {}",
            PROXY_TICKER, BAR_MINUTES, window.start, window.end
        );

        match self.fetch_aggregates(window).await {
            Ok(aggregates) => {
                let bars = aggregates.to_bar_series();
                if bars.is_empty() {
                    warn!("No results in API response");
                } else {
                    info!("Successfully fetched {} data points", bars.len());
                }
                bars
            }
            Err(e) => {
                warn!("Error fetching data: {:#}", e);
                BarSeries::new()
            }
        }
    }
}
