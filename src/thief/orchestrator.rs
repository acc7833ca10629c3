//! THieF: temporal hierarchy forecasting.
//!
//! Aggregate a bottom-level table to every temporal level, forecast each
//! level independently, then reconcile the base forecasts into a coherent
//! set.

use crate::core::{BaseForecast, LevelFrequency, PeriodTable, ReconciledForecast, Residual};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::{HierarchyConfig, TemporalHierarchy};
use crate::models::{
    LevelForecaster, LevelForecasterFactory, ModelRegistry, StatisticalForecaster,
};
use crate::reconciliation::{ReconciliationMethod, TemporalReconciler};
use crate::thief::{FoldContext, FoldPlan, LevelTables, ModelSelection};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How training data is split when fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Forecast past the end of the table.
    #[default]
    NoHoldout,
    /// Rolling-origin evaluation on the last periods of the table.
    Holdout { folds: usize },
}

impl FitMode {
    pub fn holdout(folds: usize) -> Self {
        Self::Holdout { folds }
    }
}

/// Aggregated training data produced by [`Thief::fit`].
#[derive(Debug, Clone, PartialEq)]
pub enum FitState {
    Full(LevelTables),
    Folds(Vec<FoldContext>),
}

/// Temporal hierarchy forecaster.
///
/// # Example
/// ```
/// use temporal_reconcile::core::{Frequency, PeriodTable};
/// use temporal_reconcile::hierarchy::HierarchyConfig;
/// use temporal_reconcile::reconciliation::ReconciliationMethod;
/// use temporal_reconcile::thief::{FitMode, ModelSelection, Thief};
///
/// let values: Vec<f64> = (0..24).map(|i| 10.0 + (i % 4) as f64).collect();
/// let table = PeriodTable::from_rows(vec!["store_1".into()], vec![values]).unwrap();
///
/// let mut thief = Thief::new(HierarchyConfig::from_frequency(Frequency::Quarterly)).unwrap();
/// thief.fit(&table, FitMode::NoHoldout).unwrap();
/// thief.predict(&ModelSelection::uniform("SeasonalNaive")).unwrap();
///
/// let coherent = thief.reconcile(ReconciliationMethod::Structural).unwrap();
/// assert_eq!(coherent.len(), 7);
/// ```
pub struct Thief {
    hierarchy: TemporalHierarchy,
    registry: Arc<ModelRegistry>,
    residual_windows: usize,
    forecaster: Option<LevelForecasterFactory>,
    state: Option<FitState>,
    base: Option<Vec<BaseForecast>>,
    residuals: Option<Vec<Residual>>,
}

impl Thief {
    /// Create an orchestrator. The configuration must name a bottom frequency.
    pub fn new(config: HierarchyConfig) -> Result<Self> {
        let hierarchy = TemporalHierarchy::new(config)?;
        if hierarchy.bottom_frequency().is_none() {
            return Err(ReconcileError::Configuration(
                "a bottom frequency is required".to_string(),
            ));
        }

        Ok(Self {
            hierarchy,
            registry: Arc::new(ModelRegistry::standard()),
            residual_windows: 1,
            forecaster: None,
            state: None,
            base: None,
            residuals: None,
        })
    }

    /// Models available to the built-in [`StatisticalForecaster`].
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Rolling-origin windows used for residuals by the built-in forecaster.
    ///
    /// Zero windows is rejected by [`fit`](Self::fit).
    pub fn with_residual_windows(mut self, windows: usize) -> Self {
        self.residual_windows = windows;
        self
    }

    /// Replace the built-in forecaster.
    ///
    /// The factory is called once per level (and fold) with the level's model
    /// names and frequency.
    pub fn with_forecaster<F>(mut self, factory: F) -> Self
    where
        F: Fn(&[String], LevelFrequency) -> Result<Box<dyn LevelForecaster>>
            + Send
            + Sync
            + 'static,
    {
        self.forecaster = Some(Arc::new(factory));
        self
    }

    pub fn hierarchy(&self) -> &TemporalHierarchy {
        &self.hierarchy
    }

    pub fn fit_state(&self) -> Option<&FitState> {
        self.state.as_ref()
    }

    /// Base forecasts from the last [`predict`](Self::predict).
    pub fn base_forecasts(&self) -> Option<&[BaseForecast]> {
        self.base.as_deref()
    }

    /// Residuals from the last [`predict`](Self::predict).
    pub fn residuals(&self) -> Option<&[Residual]> {
        self.residuals.as_deref()
    }

    /// Bottom periods each level forecaster must be trained on.
    ///
    /// The built-in forecaster holds out the level horizon plus one period
    /// per residual window at every level; the top level is the tightest.
    /// Custom forecasters only need one complete top-level period.
    fn min_train_periods(&self) -> usize {
        let block = self.hierarchy.max_factor();
        match self.forecaster {
            Some(_) => block,
            None => self.hierarchy.max_freq() + block * self.residual_windows,
        }
    }

    /// Aggregate `table` to every temporal level.
    ///
    /// Fails with insufficient data when the training window is too short
    /// for [`predict`](Self::predict). Discards forecasts from a previous fit.
    pub fn fit(&mut self, table: &PeriodTable, mode: FitMode) -> Result<()> {
        if table.n_series() == 0 || table.is_empty() {
            return Err(ReconcileError::EmptyData);
        }
        if self.forecaster.is_none() && self.residual_windows == 0 {
            return Err(ReconcileError::InvalidParameter(
                "at least one residual window is required".to_string(),
            ));
        }

        let min_train = self.min_train_periods();
        let state = match mode {
            FitMode::NoHoldout => {
                if table.len() < min_train {
                    return Err(ReconcileError::InsufficientData {
                        needed: min_train,
                        got: table.len(),
                    });
                }
                FitState::Full(LevelTables::build(table, &self.hierarchy)?)
            }
            FitMode::Holdout { folds } => {
                let plan = FoldPlan::with_min_train(
                    table.len(),
                    self.hierarchy.max_freq(),
                    folds,
                    self.hierarchy.max_factor(),
                    min_train,
                )?;
                debug!(
                    folds = plan.n_folds(),
                    horizon = plan.horizon(),
                    "planned holdout folds"
                );
                let contexts = plan
                    .windows()
                    .iter()
                    .map(|window| FoldContext::build(table, *window, &self.hierarchy))
                    .collect::<Result<Vec<_>>>()?;
                FitState::Folds(contexts)
            }
        };

        info!(
            series = table.n_series(),
            periods = table.len(),
            levels = self.hierarchy.total_levels(),
            ?mode,
            "fitted temporal hierarchy"
        );
        self.state = Some(state);
        self.base = None;
        self.residuals = None;
        Ok(())
    }

    /// Produce base forecasts for every level (and fold).
    ///
    /// In holdout mode each forecast carries its fold id and, where the test
    /// window covers it, the true aggregated value.
    pub fn predict(&mut self, selection: &ModelSelection) -> Result<Vec<BaseForecast>> {
        let state = self.state.as_ref().ok_or(ReconcileError::FitRequired)?;
        let models = selection.resolve(self.hierarchy.factors())?;

        let (base, residuals) = match state {
            FitState::Full(levels) => self.forecast_levels(levels, &models, None)?,
            FitState::Folds(folds) => {
                #[cfg(feature = "parallel")]
                let per_fold = folds
                    .par_iter()
                    .map(|fold| self.forecast_fold(fold, &models))
                    .collect::<Result<Vec<_>>>()?;

                #[cfg(not(feature = "parallel"))]
                let per_fold = folds
                    .iter()
                    .map(|fold| self.forecast_fold(fold, &models))
                    .collect::<Result<Vec<_>>>()?;

                let mut base = Vec::new();
                let mut residuals = Vec::new();
                for (b, r) in per_fold {
                    base.extend(b);
                    residuals.extend(r);
                }
                (base, residuals)
            }
        };

        info!(
            forecasts = base.len(),
            residuals = residuals.len(),
            "produced base forecasts"
        );
        self.base = Some(base.clone());
        self.residuals = Some(residuals);
        Ok(base)
    }

    /// Reconcile the last base forecasts.
    pub fn reconcile(&self, method: ReconciliationMethod) -> Result<Vec<ReconciledForecast>> {
        let base = self.base.as_deref().ok_or(ReconcileError::FitRequired)?;

        let mut reconciler = TemporalReconciler::new(self.hierarchy.clone());
        reconciler.fit(base)?;

        let residuals = match method {
            ReconciliationMethod::Mse => self.residuals.as_deref(),
            _ => None,
        };
        reconciler.reconcile(method, residuals)
    }

    fn build_forecaster(
        &self,
        models: &[String],
        frequency: LevelFrequency,
    ) -> Result<Box<dyn LevelForecaster>> {
        match &self.forecaster {
            Some(factory) => factory(models, frequency),
            None => Ok(Box::new(
                StatisticalForecaster::new(models.to_vec(), frequency, Arc::clone(&self.registry))?
                    .with_residual_windows(self.residual_windows),
            )),
        }
    }

    /// Fit a fresh forecaster on every level and collect forecasts and
    /// residuals. `fold` replaces the residual window ids when set.
    fn forecast_levels(
        &self,
        levels: &LevelTables,
        models: &[Vec<String>],
        fold: Option<usize>,
    ) -> Result<(Vec<BaseForecast>, Vec<Residual>)> {
        let mut base = Vec::new();
        let mut residuals = Vec::new();

        for (level, level_models) in levels.iter().zip(models) {
            let mut forecaster = self.build_forecaster(level_models, level.frequency)?;
            forecaster.fit(&level.table)?;

            base.extend(forecaster.predict(level.horizon)?.into_iter().map(|fc| {
                BaseForecast {
                    unique_id: fc.unique_id,
                    temporal_level: level.factor,
                    fh: fc.fh,
                    model: fc.model,
                    y: fc.y,
                    y_true: None,
                    cv: fold,
                }
            }));
            residuals.extend(forecaster.residuals(level.horizon)?.into_iter().map(|r| {
                Residual {
                    temporal_level: level.factor,
                    unique_id: r.unique_id,
                    cv: Some(fold.unwrap_or(r.cv)),
                    fh: r.fh,
                    model: r.model,
                    residual: r.residual,
                }
            }));

            debug!(
                level = level.factor,
                frequency = %level.frequency,
                horizon = level.horizon,
                fold = ?fold,
                "forecast temporal level"
            );
        }

        Ok((base, residuals))
    }

    fn forecast_fold(
        &self,
        fold: &FoldContext,
        models: &[Vec<String>],
    ) -> Result<(Vec<BaseForecast>, Vec<Residual>)> {
        let (mut base, residuals) = self.forecast_levels(&fold.train, models, Some(fold.id))?;

        let mut truth: HashMap<(&str, usize, usize), f64> = HashMap::new();
        for level in fold.test.iter() {
            for (id, row) in level.table.rows() {
                for (i, &y) in row.iter().enumerate() {
                    truth.insert((id, level.factor, i + 1), y);
                }
            }
        }
        for fc in &mut base {
            fc.y_true = truth
                .get(&(fc.unique_id.as_str(), fc.temporal_level, fc.fh))
                .copied();
        }

        Ok((base, residuals))
    }
}

impl std::fmt::Debug for Thief {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thief")
            .field("hierarchy", &self.hierarchy)
            .field("residual_windows", &self.residual_windows)
            .field("custom_forecaster", &self.forecaster.is_some())
            .field("fitted", &self.state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;
    use crate::models::{LevelForecast, LevelResidual};
    use approx::assert_relative_eq;

    fn seasonal_table(n: usize) -> PeriodTable {
        let season = |i: usize| 100.0 + 10.0 * ((i % 12) as f64);
        PeriodTable::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![
                (0..n).map(season).collect(),
                (0..n).map(|i| season(i) * 2.0 + i as f64).collect(),
            ],
        )
        .unwrap()
    }

    fn quarterly_thief() -> Thief {
        Thief::new(HierarchyConfig::from_frequency(Frequency::Quarterly)).unwrap()
    }

    #[test]
    fn new_requires_frequency() {
        let result = Thief::new(HierarchyConfig::from_factors(vec![1, 2, 4]));
        assert!(matches!(result, Err(ReconcileError::Configuration(_))));
    }

    #[test]
    fn predict_and_reconcile_require_fit() {
        let mut thief = quarterly_thief();
        assert!(matches!(
            thief.predict(&ModelSelection::uniform("Naive")),
            Err(ReconcileError::FitRequired)
        ));
        assert!(matches!(
            thief.reconcile(ReconciliationMethod::Structural),
            Err(ReconcileError::FitRequired)
        ));
    }

    #[test]
    fn no_holdout_forecasts_every_node() {
        let mut thief = Thief::new(HierarchyConfig::from_frequency(Frequency::Monthly)).unwrap();
        thief.fit(&seasonal_table(36), FitMode::NoHoldout).unwrap();
        assert!(matches!(thief.fit_state(), Some(FitState::Full(_))));

        let base = thief.predict(&ModelSelection::uniform("Naive")).unwrap();
        // 28 nodes per series
        assert_eq!(base.len(), 56);
        assert!(base.iter().all(|fc| fc.cv.is_none() && fc.y_true.is_none()));

        let top_a = base
            .iter()
            .find(|fc| fc.unique_id == "a" && fc.temporal_level == 12)
            .unwrap();
        assert_relative_eq!(top_a.y, 12.0 * 100.0 + 10.0 * 66.0);
        assert!(thief.residuals().is_some_and(|r| !r.is_empty()));
    }

    #[test]
    fn selection_mismatch_fails_before_fitting() {
        let mut thief = quarterly_thief();
        thief.fit(&seasonal_table(16), FitMode::NoHoldout).unwrap();

        let selection = ModelSelection::per_level([(1, vec!["Naive"]), (2, vec!["Naive"])]);
        assert!(matches!(
            thief.predict(&selection),
            Err(ReconcileError::Configuration(_))
        ));
        assert!(thief.base_forecasts().is_none());
    }

    #[test]
    fn holdout_attaches_fold_ids_and_truth() {
        let mut thief = quarterly_thief();
        thief.fit(&seasonal_table(20), FitMode::holdout(2)).unwrap();
        match thief.fit_state() {
            Some(FitState::Folds(folds)) => assert_eq!(folds.len(), 2),
            other => panic!("unexpected fit state {other:?}"),
        }

        let base = thief.predict(&ModelSelection::uniform("Naive")).unwrap();
        // 7 nodes x 2 series x 2 folds
        assert_eq!(base.len(), 28);
        assert!(base.iter().all(|fc| fc.y_true.is_some()));
        for cv in [1, 2] {
            assert_eq!(base.iter().filter(|fc| fc.cv == Some(cv)).count(), 14);
        }
        assert!(thief
            .residuals()
            .unwrap()
            .iter()
            .all(|r| matches!(r.cv, Some(1) | Some(2))));
    }

    #[test]
    fn holdout_reconciliation_keeps_folds_apart() {
        let mut thief = quarterly_thief();
        thief.fit(&seasonal_table(24), FitMode::holdout(3)).unwrap();
        thief
            .predict(&ModelSelection::per_level([
                (1, vec!["Naive", "HistoricAverage"]),
                (2, vec!["Naive", "HistoricAverage"]),
                (4, vec!["Naive", "HistoricAverage"]),
            ]))
            .unwrap();

        let out = thief.reconcile(ReconciliationMethod::Mse).unwrap();
        // 7 nodes x 2 series x 2 models x 3 folds
        assert_eq!(out.len(), 84);
        assert!(out.iter().all(|r| r.model.starts_with("TR-mse-")));

        for cv in 1..=3 {
            let top: f64 = out
                .iter()
                .filter(|r| r.unique_id == "a" && r.cv == Some(cv) && r.model == "TR-mse-Naive")
                .filter(|r| r.temporal_level == 4)
                .map(|r| r.y)
                .sum();
            let bottom: f64 = out
                .iter()
                .filter(|r| r.unique_id == "a" && r.cv == Some(cv) && r.model == "TR-mse-Naive")
                .filter(|r| r.temporal_level == 1)
                .map(|r| r.y)
                .sum();
            assert_relative_eq!(top, bottom, epsilon = 1e-8);
        }
    }

    #[test]
    fn holdout_needs_enough_periods() {
        let mut thief = quarterly_thief();
        assert!(matches!(
            thief.fit(&seasonal_table(12), FitMode::holdout(2)),
            Err(ReconcileError::InsufficientData { needed: 13, got: 12 })
        ));
        assert!(matches!(
            thief.fit(&seasonal_table(20), FitMode::holdout(0)),
            Err(ReconcileError::InvalidParameter(_))
        ));
    }

    #[test]
    fn shortest_accepted_table_can_be_predicted() {
        // quarterly, one residual window: 4 test + 1 extra fold + 2 training years
        let mut thief = quarterly_thief();
        assert!(matches!(
            thief.fit(&seasonal_table(12), FitMode::holdout(2)),
            Err(ReconcileError::InsufficientData { .. })
        ));
        thief.fit(&seasonal_table(13), FitMode::holdout(2)).unwrap();
        let selection = ModelSelection::per_level([
            (1, vec!["Naive", "SeasonalNaive", "SES"]),
            (2, vec!["Naive", "SeasonalNaive", "SES"]),
            (4, vec!["Naive", "SeasonalNaive", "SES"]),
        ]);
        assert_eq!(thief.predict(&selection).unwrap().len(), 7 * 2 * 3 * 2);

        let mut thief = quarterly_thief();
        assert!(matches!(
            thief.fit(&seasonal_table(7), FitMode::NoHoldout),
            Err(ReconcileError::InsufficientData { needed: 8, got: 7 })
        ));
        thief.fit(&seasonal_table(8), FitMode::NoHoldout).unwrap();
        assert!(thief.predict(&selection).is_ok());
    }

    #[test]
    fn more_residual_windows_need_more_history() {
        let mut thief = quarterly_thief().with_residual_windows(3);
        assert!(matches!(
            thief.fit(&seasonal_table(16), FitMode::holdout(2)),
            Err(ReconcileError::InsufficientData { needed: 21, got: 16 })
        ));
        thief.fit(&seasonal_table(21), FitMode::holdout(2)).unwrap();

        thief.predict(&ModelSelection::uniform("SeasonalNaive")).unwrap();
        let residuals = thief.residuals().unwrap();
        // every fold and window still yields one residual per node
        assert_eq!(residuals.len(), 7 * 2 * 3 * 2);
    }

    #[test]
    fn zero_residual_windows_is_invalid() {
        let mut thief = quarterly_thief().with_residual_windows(0);
        assert!(matches!(
            thief.fit(&seasonal_table(20), FitMode::NoHoldout),
            Err(ReconcileError::InvalidParameter(_))
        ));
    }

    struct ConstantForecaster {
        ids: Vec<String>,
        value: f64,
    }

    impl LevelForecaster for ConstantForecaster {
        fn fit(&mut self, table: &PeriodTable) -> Result<()> {
            self.ids = table.ids().to_vec();
            Ok(())
        }

        fn predict(&self, horizon: usize) -> Result<Vec<LevelForecast>> {
            Ok(self
                .ids
                .iter()
                .flat_map(|id| {
                    (1..=horizon).map(move |fh| LevelForecast {
                        unique_id: id.clone(),
                        fh,
                        model: "Constant".to_string(),
                        y: self.value,
                    })
                })
                .collect())
        }

        fn residuals(&self, horizon: usize) -> Result<Vec<LevelResidual>> {
            Ok(self
                .ids
                .iter()
                .flat_map(|id| {
                    (1..=horizon).map(move |fh| LevelResidual {
                        unique_id: id.clone(),
                        fh,
                        model: "Constant".to_string(),
                        cv: 1,
                        residual: 1.0,
                    })
                })
                .collect())
        }
    }

    #[test]
    fn custom_forecaster_is_used_per_level() {
        let mut thief = quarterly_thief().with_forecaster(|_models, frequency| {
            Ok(Box::new(ConstantForecaster {
                ids: Vec::new(),
                value: frequency.factor() as f64,
            }) as Box<dyn LevelForecaster>)
        });
        thief.fit(&seasonal_table(8), FitMode::NoHoldout).unwrap();

        let base = thief.predict(&ModelSelection::uniform("anything")).unwrap();
        assert!(base
            .iter()
            .all(|fc| fc.y == fc.temporal_level as f64 && fc.model == "Constant"));

        // base y = [4, 2, 2, 1, 1, 1, 1] is incoherent
        let out = thief.reconcile(ReconciliationMethod::Structural).unwrap();
        let top = out
            .iter()
            .find(|r| r.unique_id == "a" && r.temporal_level == 4)
            .unwrap();
        let bottom: f64 = out
            .iter()
            .filter(|r| r.unique_id == "a" && r.temporal_level == 1)
            .map(|r| r.y)
            .sum();
        assert_relative_eq!(top.y, bottom, epsilon = 1e-9);
    }
}
