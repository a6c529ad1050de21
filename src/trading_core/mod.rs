//! Trading Core - Session-block ATR level pipeline
//!
//! This module contains the level computation components:
//! - Session candle aggregation from 5-minute bars
//! - True range and Wilder ATR(14)
//! - Fibonacci level projection
//! - Bounded candle history
//! - Update orchestration

pub mod candles;
pub mod volatility;
pub mod projector;
pub mod history;
pub mod updater;

// Re-export commonly used types
pub use candles::aggregate_session_candles;
pub use volatility::{true_range, true_ranges, wilder_atr, AtrSample, TrueRangeSample, WilderSmoother, ATR_PERIOD};
pub use projector::{LevelLadder, ProjectedLevel, FIB_RATIOS};
pub use history::{CandleHistory, HISTORY_WINDOW};
pub use updater::{compute_update, LevelUpdate, LevelUpdater, SkipReason, UpdateOutcome, FETCH_LOOKBACK_DAYS};
