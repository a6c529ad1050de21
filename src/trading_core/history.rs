//! Bounded candle history keyed by session identity

use std::collections::BTreeMap;

use crate::types::{SessionBlock, SessionCandle, SessionKey};

/// Number of session candles kept between runs
pub const HISTORY_WINDOW: usize = 30;

/// Session candles sorted by (date, block), one per key
#[derive(Debug, Clone, Default)]
pub struct CandleHistory {
    candles: BTreeMap<SessionKey, SessionCandle>,
}

impl CandleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored candles; later duplicates of a key are dropped
    pub fn from_candles(candles: impl IntoIterator<Item = SessionCandle>) -> Self {
        let mut history = Self::new();
        history.merge(candles);
        history
    }

    /// Insert candles whose key is not yet present. Returns the number added.
    pub fn merge(&mut self, candles: impl IntoIterator<Item = SessionCandle>) -> usize {
        let mut added = 0;
        for candle in candles {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.candles.entry(candle.key()) {
                slot.insert(candle);
                added += 1;
            }
        }
        added
    }

    /// Drop the oldest candles until at most `window` remain
    pub fn truncate(&mut self, window: usize) {
        while self.candles.len() > window {
            self.candles.pop_first();
        }
    }

    /// Most recent candle of the given block
    pub fn latest_in_block(&self, block: SessionBlock) -> Option<&SessionCandle> {
        self.candles.values().rev().find(|c| c.block == block)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionCandle> {
        self.candles.values()
    }

    pub fn into_vec(self) -> Vec<SessionCandle> {
        self.candles.into_values().collect()
    }
}
