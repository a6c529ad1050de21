//! Level Update Orchestration
//!
//! One run of the calculator:
//! 1. Pick the update type (1PM or 4PM) from the invocation time
//! 2. Fetch the trailing window of 5-minute bars
//! 3. Aggregate into session candles and merge into stored history
//! 4. Compute ATR(14) over the bounded history
//! 5. Project the level ladder off the latest reference-block close
//! 6. Save the new state and report
//!
//! Missing data at any step ends the run without touching stored state.

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use super::candles::aggregate_session_candles;
use super::history::{CandleHistory, HISTORY_WINDOW};
use super::projector::LevelLadder;
use super::volatility::{true_ranges, wilder_atr, AtrSample, ATR_PERIOD};
use crate::report::{LevelReport, Reporter};
use crate::store::{LevelRecord, PersistedState, StateStore};
use crate::types::{BarSource, FetchWindow, SessionBlock, SessionCandle, UpdateType};

/// Calendar days of bars requested per run (enough for 14+ session candles)
pub const FETCH_LOOKBACK_DAYS: i64 = 15;

/// Why a run ended without updating levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The bar source returned nothing
    NoData,
    /// Not enough true-range samples for the ATR lookback
    InsufficientHistory { true_ranges: usize, required: usize },
    /// No stored candle belongs to the reference block
    ReferenceBlockMissing(SessionBlock),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "No new data fetched"),
            Self::InsufficientHistory { true_ranges, required } => write!(
                f,
                "Not enough data for ATR calculation ({} true ranges, need at least {})",
                true_ranges, required
            ),
            Self::ReferenceBlockMissing(block) => {
                write!(f, "Could not find recent {} candle for level calculation", block)
            }
        }
    }
}

/// Result of a single run
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(LevelReport),
    Skipped(SkipReason),
}

/// Everything computed by a successful update
#[derive(Debug, Clone)]
pub struct LevelUpdate {
    pub update_type: UpdateType,
    pub ladder: LevelLadder,
    pub candles: Vec<SessionCandle>,
    pub atr_values: Vec<AtrSample>,
    /// Fresh candles that were not already stored
    pub added: usize,
}

impl LevelUpdate {
    pub fn report(&self) -> LevelReport {
        LevelReport::new(
            self.update_type,
            &self.ladder,
            self.candles.len(),
            self.atr_values.len(),
        )
    }

    /// State to persist, stamped with the run time
    pub fn into_state(self, now: &DateTime<Tz>) -> PersistedState {
        let record = LevelRecord {
            update_type: self.update_type,
            timestamp: now.fixed_offset(),
            prior_4h_close: self.ladder.reference_close,
            current_atr: self.ladder.volatility,
            levels: self.ladder.to_map(),
        };

        PersistedState {
            candles: self.candles,
            atr_values: self.atr_values,
            current_levels: Some(record),
        }
    }
}

/// Merge fresh candles into stored history and compute the new ladder
pub fn compute_update(
    stored: &PersistedState,
    fresh: Vec<SessionCandle>,
    update_type: UpdateType,
) -> Result<LevelUpdate, SkipReason> {
    let mut history = CandleHistory::from_candles(stored.candles.iter().cloned());
    let added = history.merge(fresh);
    history.truncate(HISTORY_WINDOW);
    debug!("History: {} candles ({} new)", history.len(), added);

    let block = update_type.reference_block();
    let reference_close = history.latest_in_block(block).map(|c| c.close);

    let candles = history.into_vec();
    let trs = true_ranges(&candles);
    let atr_values = wilder_atr(&trs, ATR_PERIOD);

    let Some(current_atr) = atr_values.last().map(|s| s.atr) else {
        return Err(SkipReason::InsufficientHistory {
            true_ranges: trs.len(),
            required: ATR_PERIOD,
        });
    };

    let Some(reference_close) = reference_close else {
        return Err(SkipReason::ReferenceBlockMissing(block));
    };
    info!("Using {} close: {}", block, reference_close);

    let ladder = LevelLadder::project(reference_close, current_atr);

    Ok(LevelUpdate {
        update_type,
        ladder,
        candles,
        atr_values,
        added,
    })
}

/// Drives one update run against its collaborators
pub struct LevelUpdater<B, S, R> {
    source: B,
    store: S,
    reporter: R,
}

impl<B: BarSource, S: StateStore, R: Reporter> LevelUpdater<B, S, R> {
    pub fn new(source: B, store: S, reporter: R) -> Self {
        Self {
            source,
            store,
            reporter,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run one update as of `now` (Eastern Time)
    pub async fn run(&self, now: DateTime<Tz>) -> Result<UpdateOutcome> {
        info!("Starting levels update at {}", now);

        let update_type = UpdateType::for_time(&now);
        info!(
            "Update type: {}, Target period: {}",
            update_type,
            update_type.reference_block()
        );

        let window = FetchWindow::trailing(now.date_naive(), FETCH_LOOKBACK_DAYS);
        let bars = self.source.fetch_bars(&window).await;
        if bars.is_empty() {
            warn!("{}", SkipReason::NoData);
            return Ok(UpdateOutcome::Skipped(SkipReason::NoData));
        }

        let stored = self.store.load()?;
        let fresh = aggregate_session_candles(&bars);
        info!("Aggregated {} bars into {} session candles", bars.len(), fresh.len());

        let update = match compute_update(&stored, fresh, update_type) {
            Ok(update) => update,
            Err(reason) => {
                warn!("{}", reason);
                return Ok(UpdateOutcome::Skipped(reason));
            }
        };

        let report = update.report();
        self.store.save(&update.into_state(&now))?;
        self.reporter.emit(&report);

        Ok(UpdateOutcome::Updated(report))
    }
}
