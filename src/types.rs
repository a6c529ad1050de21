use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

/// RTH window used for aggregation (Eastern Time, whole hours)
pub const RTH_START_HOUR: u32 = 9;
pub const RTH_END_HOUR: u32 = 16;

/// Hour splitting the trading day into the morning and afternoon blocks
pub const BLOCK_BOUNDARY_HOUR: u32 = 13;

/// Hour (ET) at which a run is treated as the 1PM update
pub const MIDDAY_UPDATE_HOUR: u32 = 13;

/// A single fine-grained OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars keyed by exchange-local (US/Eastern) wall-clock time
pub type BarSeries = BTreeMap<NaiveDateTime, Bar>;

/// One of the two fixed session blocks of a trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBlock {
    /// 09:00 - 13:00 ET
    Morning,
    /// 13:00 - 16:00 ET
    Afternoon,
}

impl SessionBlock {
    /// Block containing the given ET hour, or None outside RTH
    pub fn for_hour(hour: u32) -> Option<Self> {
        match hour {
            h if (RTH_START_HOUR..BLOCK_BOUNDARY_HOUR).contains(&h) => Some(Self::Morning),
            h if (BLOCK_BOUNDARY_HOUR..RTH_END_HOUR).contains(&h) => Some(Self::Afternoon),
            _ => None,
        }
    }

    /// Time range label, e.g. "09:00-13:00"
    pub fn range_label(&self) -> String {
        let (start, end) = match self {
            Self::Morning => (RTH_START_HOUR, BLOCK_BOUNDARY_HOUR),
            Self::Afternoon => (BLOCK_BOUNDARY_HOUR, RTH_END_HOUR),
        };
        format!("{:02}:00-{:02}:00", start, end)
    }
}

impl std::fmt::Display for SessionBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
        }
    }
}

/// Identity of a session candle: ordered by date, then block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub block: SessionBlock,
}

impl SessionKey {
    pub fn new(date: NaiveDate, block: SessionBlock) -> Self {
        Self { date, block }
    }

    /// Persisted label, e.g. "2025-01-02 09:00-13:00"
    pub fn label(&self) -> String {
        format!("{} {}", self.date, self.block.range_label())
    }
}

/// OHLCV candle covering one session block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCandle {
    pub timestamp: String,
    pub date: NaiveDate,
    #[serde(rename = "period")]
    pub block: SessionBlock,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl SessionCandle {
    /// Start a candle from the first bar of a block
    pub fn open_with(key: SessionKey, bar: &Bar) -> Self {
        Self {
            timestamp: key.label(),
            date: key.date,
            block: key.block,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    /// Fold a later bar of the same block into the candle
    pub fn absorb(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume = self.volume.saturating_add(bar.volume);
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.date, self.block)
    }
}

/// Which scheduled update a run represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    /// Midday run, levels off the morning block close
    #[serde(rename = "1PM_update")]
    OnePm,
    /// Close (or manual) run, levels off the afternoon block close
    #[serde(rename = "4PM_update")]
    FourPm,
}

impl UpdateType {
    pub fn for_hour(hour: u32) -> Self {
        if hour == MIDDAY_UPDATE_HOUR {
            Self::OnePm
        } else {
            Self::FourPm
        }
    }

    /// Select the update type from an ET invocation time
    pub fn for_time<T: Timelike>(time: &T) -> Self {
        Self::for_hour(time.hour())
    }

    /// Block whose close anchors the level ladder
    pub fn reference_block(&self) -> SessionBlock {
        match self {
            Self::OnePm => SessionBlock::Morning,
            Self::FourPm => SessionBlock::Afternoon,
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnePm => write!(f, "1PM_update"),
            Self::FourPm => write!(f, "4PM_update"),
        }
    }
}

/// Inclusive calendar-date range of bars to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// Window ending today and reaching `days` calendar days back
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }
}

/// Supplier of historical bars
///
/// Implementations swallow their own failures: an empty series means no data
/// was available for this run.
pub trait BarSource {
    fn fetch_bars(&self, window: &FetchWindow) -> impl Future<Output = BarSeries>;
}
