//! Average True Range over session candles
//!
//! True range per adjacent candle pair, smoothed with Wilder's method:
//! the first value is the simple mean of the first `period` true ranges,
//! every later value is `((period - 1) * prev + tr) / period`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{SessionBlock, SessionCandle, SessionKey};

/// ATR lookback in session candles
pub const ATR_PERIOD: usize = 14;

/// True range of one candle against the previous candle's close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrueRangeSample {
    pub key: SessionKey,
    pub true_range: f64,
    pub close: f64,
}

/// Smoothed ATR value tagged with the candle it was computed at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrSample {
    pub timestamp: String,
    pub date: NaiveDate,
    #[serde(rename = "period")]
    pub block: SessionBlock,
    pub atr: f64,
    pub close: f64,
}

impl AtrSample {
    fn at(sample: &TrueRangeSample, atr: f64) -> Self {
        Self {
            timestamp: sample.key.label(),
            date: sample.key.date,
            block: sample.key.block,
            atr,
            close: sample.close,
        }
    }
}

/// max(H - L, |H - prev close|, |L - prev close|)
pub fn true_range(current: &SessionCandle, previous_close: f64) -> f64 {
    (current.high - current.low)
        .max((current.high - previous_close).abs())
        .max((current.low - previous_close).abs())
}

/// True range for every candle after the first
pub fn true_ranges(candles: &[SessionCandle]) -> Vec<TrueRangeSample> {
    candles
        .windows(2)
        .map(|pair| {
            let (previous, current) = (&pair[0], &pair[1]);
            TrueRangeSample {
                key: current.key(),
                true_range: true_range(current, previous.close),
                close: current.close,
            }
        })
        .collect()
}

/// Incremental Wilder smoother
#[derive(Debug, Clone)]
pub struct WilderSmoother {
    period: usize,
    warmup_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl WilderSmoother {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            warmup_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    /// Feed the next observation; returns the smoothed value once warm
    pub fn update(&mut self, observation: f64) -> Option<f64> {
        let n = self.period as f64;
        match self.value {
            Some(prev) => {
                self.value = Some(((n - 1.0) * prev + observation) / n);
            }
            None => {
                self.warmup_sum += observation;
                self.count += 1;
                if self.count == self.period {
                    self.value = Some(self.warmup_sum / n);
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_warm(&self) -> bool {
        self.value.is_some()
    }
}

/// Wilder ATR series; empty when fewer than `period` true ranges exist
pub fn wilder_atr(samples: &[TrueRangeSample], period: usize) -> Vec<AtrSample> {
    if period == 0 || samples.len() < period {
        return Vec::new();
    }

    let mut smoother = WilderSmoother::new(period);
    samples
        .iter()
        .filter_map(|sample| {
            smoother
                .update(sample.true_range)
                .map(|atr| AtrSample::at(sample, atr))
        })
        .collect()
}
