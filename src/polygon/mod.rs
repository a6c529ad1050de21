//! Polygon.io Market Data Integration
//!
//! Supplies the historical 5-minute bars the level calculator aggregates.
//!
//! # Components
//!
//! - [`client`] - HTTP client for the aggregates endpoint
//! - [`models`] - Response data types and conversion to bars
//!
//! # Environment Variables
//!
//! - `POLYGON_API_KEY` - Your Polygon.io API key
//! - `POLYGON_BASE_URL` (optional) - API base URL
//!
//! # API Endpoints Used
//!
//! - `GET /v2/aggs/ticker/SPY/range/5/minute/{from}/{to}` - Historical bars

pub mod client;
pub mod models;

// Re-export commonly used types
pub use client::{PolygonClient, DEFAULT_BASE_URL, PROXY_TICKER};
pub use models::{AggregateBar, AggregatesResponse};
