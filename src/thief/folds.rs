//! Temporal levels and rolling-origin holdout folds.

use crate::core::{LevelFrequency, PeriodTable};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::{resample, TemporalHierarchy};
use std::ops::Range;
use tracing::debug;

/// One aggregated level of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    pub factor: usize,
    pub frequency: LevelFrequency,
    /// Periods to forecast at this level.
    pub horizon: usize,
    pub table: PeriodTable,
}

/// A bottom-level table aggregated to every level of a hierarchy,
/// in ascending factor order.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTables {
    levels: Vec<LevelTable>,
}

impl LevelTables {
    /// Aggregate `table` to every level of `hierarchy`.
    ///
    /// The oldest periods are dropped so that every top-level window is
    /// complete and the last window ends with the table.
    pub fn build(table: &PeriodTable, hierarchy: &TemporalHierarchy) -> Result<Self> {
        let frequencies = hierarchy.level_frequencies().ok_or_else(|| {
            ReconcileError::Configuration(
                "a bottom frequency is required to build temporal levels".to_string(),
            )
        })?;

        let block = hierarchy.max_factor();
        if table.len() < block {
            return Err(ReconcileError::InsufficientData {
                needed: block,
                got: table.len(),
            });
        }
        let aligned = table.align_to(block)?;

        let levels = hierarchy
            .factors()
            .iter()
            .zip(hierarchy.fhs())
            .zip(frequencies)
            .map(|((&factor, &horizon), frequency)| {
                Ok(LevelTable {
                    factor,
                    frequency,
                    horizon,
                    table: resample(&aligned, factor)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            levels = levels.len(),
            periods = aligned.len(),
            trimmed = table.len() - aligned.len(),
            "built temporal levels"
        );
        Ok(Self { levels })
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelTable> {
        self.levels.iter()
    }

    /// Level with the given aggregation factor.
    pub fn get(&self, factor: usize) -> Option<&LevelTable> {
        self.levels.iter().find(|l| l.factor == factor)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Bottom-level period ranges of one holdout fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldWindow {
    /// Fold id, starting at 1.
    pub id: usize,
    pub train_start: usize,
    /// First test period; training data ends just before it.
    pub origin: usize,
    pub test_end: usize,
}

impl FoldWindow {
    pub fn train(&self) -> Range<usize> {
        self.train_start..self.origin
    }

    pub fn test(&self) -> Range<usize> {
        self.origin..self.test_end
    }
}

/// Rolling-origin split of a table into `folds` train/test windows.
///
/// Fold `z` (0-based) tests on `horizon` periods starting at
/// `n - (horizon + folds - 1) + z`, so origins advance one period per fold
/// and the last test window ends at `n`. Training data is everything before
/// the origin, trimmed at the front to a multiple of `block`. The first fold
/// gets at least one block of training data, or more with
/// [`with_min_train`](Self::with_min_train).
///
/// # Example
/// ```
/// use temporal_reconcile::thief::FoldPlan;
///
/// let plan = FoldPlan::new(30, 12, 2, 12).unwrap();
/// let windows = plan.windows();
/// assert_eq!(windows[0].test(), 17..29);
/// assert_eq!(windows[1].test(), 18..30);
/// assert_eq!(windows[1].train(), 6..18);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPlan {
    n_periods: usize,
    horizon: usize,
    block: usize,
    windows: Vec<FoldWindow>,
}

impl FoldPlan {
    pub fn new(n_periods: usize, horizon: usize, folds: usize, block: usize) -> Result<Self> {
        Self::with_min_train(n_periods, horizon, folds, block, block)
    }

    /// Like [`new`](Self::new), but every fold trains on at least `min_train`
    /// periods, rounded up to whole blocks.
    pub fn with_min_train(
        n_periods: usize,
        horizon: usize,
        folds: usize,
        block: usize,
        min_train: usize,
    ) -> Result<Self> {
        if folds == 0 {
            return Err(ReconcileError::InvalidParameter(
                "holdout requires at least one fold".to_string(),
            ));
        }
        if horizon == 0 || block == 0 {
            return Err(ReconcileError::InvalidParameter(
                "fold horizon and block must be positive".to_string(),
            ));
        }

        let min_train = min_train.max(1).div_ceil(block) * block;
        let needed = horizon + folds - 1 + min_train;
        if n_periods < needed {
            return Err(ReconcileError::InsufficientData {
                needed,
                got: n_periods,
            });
        }

        let first_origin = n_periods - (horizon + folds - 1);
        let windows = (0..folds)
            .map(|z| {
                let origin = first_origin + z;
                FoldWindow {
                    id: z + 1,
                    train_start: origin % block,
                    origin,
                    test_end: origin + horizon,
                }
            })
            .collect();

        Ok(Self {
            n_periods,
            horizon,
            block,
            windows,
        })
    }

    pub fn windows(&self) -> &[FoldWindow] {
        &self.windows
    }

    pub fn n_folds(&self) -> usize {
        self.windows.len()
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn block(&self) -> usize {
        self.block
    }
}

/// Train and test levels of one fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldContext {
    pub id: usize,
    pub window: FoldWindow,
    pub train: LevelTables,
    pub test: LevelTables,
}

impl FoldContext {
    pub fn build(
        table: &PeriodTable,
        window: FoldWindow,
        hierarchy: &TemporalHierarchy,
    ) -> Result<Self> {
        let train = table.slice(window.train_start, window.origin)?;
        let test = table.slice(window.origin, window.test_end)?;

        Ok(Self {
            id: window.id,
            window,
            train: LevelTables::build(&train, hierarchy)?,
            test: LevelTables::build(&test, hierarchy)?,
        })
    }
}
