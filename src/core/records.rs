//! Long-form records exchanged between the orchestrator, forecasters and the reconciler.

use std::fmt;

/// Position of a forecast inside the temporal hierarchy.
///
/// Ordering is numeric: by aggregation factor, then by step. Level 12 sorts
/// after level 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelStep {
    /// Aggregation factor of the level.
    pub level: usize,
    /// One-based forecast step within the level.
    pub step: usize,
}

impl LevelStep {
    pub fn new(level: usize, step: usize) -> Self {
        Self { level, step }
    }
}

impl fmt::Display for LevelStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.level, self.step)
    }
}

/// A base forecast for one series, level, step and model.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseForecast {
    pub unique_id: String,
    pub temporal_level: usize,
    pub fh: usize,
    pub model: String,
    pub y: f64,
    /// Held-out actual value, when forecasting inside a cross-validation fold.
    pub y_true: Option<f64>,
    /// Cross-validation fold id (one-based).
    pub cv: Option<usize>,
}

impl BaseForecast {
    pub fn new(
        unique_id: impl Into<String>,
        temporal_level: usize,
        fh: usize,
        model: impl Into<String>,
        y: f64,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            temporal_level,
            fh,
            model: model.into(),
            y,
            y_true: None,
            cv: None,
        }
    }

    /// Attach a fold id.
    pub fn with_cv(mut self, cv: usize) -> Self {
        self.cv = Some(cv);
        self
    }

    pub fn level_step(&self) -> LevelStep {
        LevelStep::new(self.temporal_level, self.fh)
    }
}

/// A held-out forecast error.
#[derive(Debug, Clone, PartialEq)]
pub struct Residual {
    pub temporal_level: usize,
    pub unique_id: String,
    pub cv: Option<usize>,
    pub fh: usize,
    pub model: String,
    pub residual: f64,
}

impl Residual {
    pub fn level_step(&self) -> LevelStep {
        LevelStep::new(self.temporal_level, self.fh)
    }
}

/// A coherent forecast with the base value it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledForecast {
    pub unique_id: String,
    pub temporal_level: usize,
    pub fh: usize,
    /// `TR-{method}-{base model}`.
    pub model: String,
    pub y: f64,
    pub y_base: f64,
    pub cv: Option<usize>,
}

impl ReconciledForecast {
    pub fn level_step(&self) -> LevelStep {
        LevelStep::new(self.temporal_level, self.fh)
    }
}
