//! Temporal hierarchy forecasting (THieF) orchestration.

mod folds;
mod orchestrator;
mod selection;

pub use folds::{FoldContext, FoldPlan, FoldWindow, LevelTable, LevelTables};
pub use orchestrator::{FitMode, FitState, Thief};
pub use selection::ModelSelection;
