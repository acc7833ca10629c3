//! Core data structures: frequencies, wide tables and long-form records.

mod frequency;
mod records;
mod table;

pub use frequency::{Frequency, LevelFrequency};
pub use records::{BaseForecast, LevelStep, ReconciledForecast, Residual};
pub use table::PeriodTable;
