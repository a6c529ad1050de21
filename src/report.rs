//! Console reporting of computed levels

use crate::store::{LevelRecord, PersistedState};
use crate::trading_core::projector::LevelLadder;
use crate::types::UpdateType;

/// Summary of a level update for presentation
#[derive(Debug, Clone, PartialEq)]
pub struct LevelReport {
    pub update_type: UpdateType,
    pub reference_close: f64,
    pub atr: f64,
    /// (label, price), highest price first
    pub levels: Vec<(String, f64)>,
    pub candle_count: usize,
    pub atr_count: usize,
}

impl LevelReport {
    pub fn new(
        update_type: UpdateType,
        ladder: &LevelLadder,
        candle_count: usize,
        atr_count: usize,
    ) -> Self {
        Self {
            update_type,
            reference_close: ladder.reference_close,
            atr: ladder.volatility,
            levels: ladder
                .descending()
                .into_iter()
                .map(|l| (l.label.clone(), l.price))
                .collect(),
            candle_count,
            atr_count,
        }
    }

    /// Rebuild a report from the last saved run, if any
    pub fn from_state(state: &PersistedState) -> Option<Self> {
        let record: &LevelRecord = state.current_levels.as_ref()?;
        let mut levels: Vec<(String, f64)> = record
            .levels
            .iter()
            .map(|(label, price)| (label.clone(), *price))
            .collect();
        levels.sort_by(|a, b| b.1.total_cmp(&a.1));

        Some(Self {
            update_type: record.update_type,
            reference_close: record.prior_4h_close,
            atr: record.current_atr,
            levels,
            candle_count: state.candles.len(),
            atr_count: state.atr_values.len(),
        })
    }
}

/// Presentation sink for level reports
pub trait Reporter {
    fn emit(&self, report: &LevelReport);
}

/// Prints reports to stdout
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn emit(&self, report: &LevelReport) {
        let block = report.update_type.reference_block();

        println!("\n=== SPY {} LEVELS UPDATE ===", report.update_type);
        println!("Prior 4H Close ({}): {:.2}", block, report.reference_close);
        println!("Current ATR(14): {:.2}", report.atr);
        println!("\nCalculated Levels:");
        for (label, price) in &report.levels {
            println!("{}: {:.2}", label, price);
        }
        println!("\nTotal 4H candles stored: {}", report.candle_count);
        println!("ATR calculation periods: {}", report.atr_count);
    }
}
