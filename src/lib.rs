// Library crate - exports shared types and level computation logic

pub mod types;
pub mod trading_core;
pub mod polygon;
pub mod store;
pub mod report;
pub mod config;

// Re-export commonly used types
pub use types::*;
pub use trading_core::{LevelUpdater, UpdateOutcome};
