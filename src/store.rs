//! Persisted level state
//!
//! The whole record is read once at the start of a run and rewritten once
//! at the end of a successful run. On disk it is a single pretty-printed JSON
//! document:
//!
//! ```json
//! { "4h_candles": [...], "atr_values": [...], "current_levels": {...} }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::trading_core::volatility::AtrSample;
use crate::types::{SessionCandle, UpdateType};

/// Default state file, relative to the working directory
pub const DEFAULT_DATA_FILE: &str = "spy_levels_data.json";

/// Latest computed ladder with its computation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub update_type: UpdateType,
    pub timestamp: DateTime<FixedOffset>,
    pub prior_4h_close: f64,
    pub current_atr: f64,
    pub levels: BTreeMap<String, f64>,
}

/// Everything carried between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(rename = "4h_candles", default)]
    pub candles: Vec<SessionCandle>,
    #[serde(default)]
    pub atr_values: Vec<AtrSample>,
    #[serde(
        default,
        serialize_with = "serialize_levels",
        deserialize_with = "deserialize_levels"
    )]
    pub current_levels: Option<LevelRecord>,
}

/// Missing levels are written as an empty object
fn serialize_levels<S: Serializer>(levels: &Option<LevelRecord>, serializer: S) -> Result<S::Ok, S::Error> {
    match levels {
        Some(record) => record.serialize(serializer),
        None => BTreeMap::<String, f64>::new().serialize(serializer),
    }
}

/// Accepts a record, `{}` or `null`
fn deserialize_levels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<LevelRecord>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Durable home of the persisted state
pub trait StateStore {
    /// Load the state, or an empty default if none was saved yet
    fn load(&self) -> Result<PersistedState>;

    /// Replace the stored state wholesale
    fn save(&self, state: &PersistedState) -> Result<()>;
}

/// State kept in a JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<PersistedState> {
        if !self.path.exists() {
            info!("No state file at {:?}, starting fresh", self.path);
            return Ok(PersistedState::default());
        }

        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {:?}", self.path))?;
        let state: PersistedState = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse state file {:?}", self.path))?;

        debug!(
            "Loaded {} candles, {} ATR values from {:?}",
            state.candles.len(),
            state.atr_values.len(),
            self.path
        );
        Ok(state)
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        // Write beside the target, then swap it in
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file {:?}", self.path))?;

        debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}
