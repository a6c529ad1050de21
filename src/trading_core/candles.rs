//! Session Candle Aggregation
//!
//! Rolls 5-minute bars up into two candles per trading day:
//! - Morning: 9:00am-1:00pm ET
//! - Afternoon: 1:00pm-4:00pm ET
//!
//! Bars outside 9:00am-4:00pm ET are ignored. A block with no bars produces
//! no candle.

use std::collections::BTreeMap;

use chrono::Timelike;

use crate::types::{BarSeries, SessionBlock, SessionCandle, SessionKey};

/// Aggregate bars into session candles ordered by (date, block)
pub fn aggregate_session_candles(bars: &BarSeries) -> Vec<SessionCandle> {
    let mut candles: BTreeMap<SessionKey, SessionCandle> = BTreeMap::new();

    // BarSeries iterates chronologically, so the first bar seen opens the candle
    for (ts, bar) in bars {
        let Some(block) = SessionBlock::for_hour(ts.hour()) else {
            continue;
        };
        let key = SessionKey::new(ts.date(), block);

        candles
            .entry(key)
            .and_modify(|candle| candle.absorb(bar))
            .or_insert_with(|| SessionCandle::open_with(key, bar));
    }

    candles.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn bar(open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
        Bar { open, high, low, close, volume }
    }

    fn sample_series() -> BarSeries {
        let mut bars = BarSeries::new();
        // Pre-market, ignored
        bars.insert(ts(2, 8, 55), bar(500.0, 520.0, 480.0, 510.0, 999));
        // Morning block
        bars.insert(ts(2, 9, 30), bar(590.0, 591.0, 589.5, 590.5, 100));
        bars.insert(ts(2, 10, 0), bar(590.5, 593.0, 590.0, 592.0, 200));
        bars.insert(ts(2, 12, 55), bar(592.0, 592.5, 588.0, 589.0, 300));
        // Afternoon block
        bars.insert(ts(2, 13, 0), bar(589.0, 589.5, 587.0, 588.0, 50));
        bars.insert(ts(2, 15, 55), bar(588.0, 595.0, 587.5, 594.0, 70));
        // After hours, ignored
        bars.insert(ts(2, 16, 0), bar(594.0, 600.0, 580.0, 599.0, 999));
        bars
    }

    #[test]
    fn test_two_blocks_per_day() {
        let candles = aggregate_session_candles(&sample_series());
        assert_eq!(candles.len(), 2);

        let morning = &candles[0];
        assert_eq!(morning.block, SessionBlock::Morning);
        assert_eq!(morning.timestamp, "2025-01-02 09:00-13:00");
        assert_eq!(morning.open, 590.0);
        assert_eq!(morning.high, 593.0);
        assert_eq!(morning.low, 588.0);
        assert_eq!(morning.close, 589.0);
        assert_eq!(morning.volume, 600);

        let afternoon = &candles[1];
        assert_eq!(afternoon.block, SessionBlock::Afternoon);
        assert_eq!(afternoon.open, 589.0);
        assert_eq!(afternoon.high, 595.0);
        assert_eq!(afternoon.low, 587.0);
        assert_eq!(afternoon.close, 594.0);
        assert_eq!(afternoon.volume, 120);
    }

    #[test]
    fn test_single_block_day() {
        let mut bars = BarSeries::new();
        bars.insert(ts(3, 9, 0), bar(10.0, 11.0, 9.0, 10.5, 1));
        bars.insert(ts(3, 11, 0), bar(10.5, 12.0, 10.0, 11.5, 1));

        let candles = aggregate_session_candles(&bars);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].block, SessionBlock::Morning);
    }

    #[test]
    fn test_empty_and_out_of_hours() {
        assert!(aggregate_session_candles(&BarSeries::new()).is_empty());

        let mut bars = BarSeries::new();
        bars.insert(ts(3, 7, 0), bar(10.0, 11.0, 9.0, 10.5, 1));
        bars.insert(ts(3, 18, 0), bar(10.0, 11.0, 9.0, 10.5, 1));
        assert!(aggregate_session_candles(&bars).is_empty());
    }

    #[test]
    fn test_ordered_across_days() {
        let mut bars = sample_series();
        bars.insert(ts(6, 14, 0), bar(600.0, 601.0, 599.0, 600.5, 10));
        bars.insert(ts(3, 9, 5), bar(595.0, 596.0, 594.0, 595.5, 10));

        let candles = aggregate_session_candles(&bars);
        let keys: Vec<_> = candles.iter().map(|c| c.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(candles.len(), 4);
    }

    #[test]
    fn test_ohlc_invariant_holds() {
        for candle in aggregate_session_candles(&sample_series()) {
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.open.max(candle.close) <= candle.high);
        }
    }

    #[test]
    fn test_reaggregation_is_deterministic() {
        let bars = sample_series();
        assert_eq!(
            aggregate_session_candles(&bars),
            aggregate_session_candles(&bars)
        );
    }
}
