//! Loaders for reference data: bracket schedules and inflation series.

pub mod bracket_loader;
pub mod inflation_history;

pub use bracket_loader::{BracketLoader, BracketLoaderError, BracketRecord};
pub use inflation_history::FileInflationHistory;
