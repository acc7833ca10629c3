//! Forecasting one temporal level of a hierarchy.

use crate::core::{LevelFrequency, PeriodTable};
use crate::error::{ReconcileError, Result};
use crate::models::{BoxedForecaster, ModelRegistry};
use std::sync::Arc;
use tracing::debug;

/// Point forecast for one series, model and step of a level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelForecast {
    pub unique_id: String,
    /// 1-based step within the level's horizon.
    pub fh: usize,
    pub model: String,
    pub y: f64,
}

/// Held-out forecast error for one series, model and step of a level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelResidual {
    pub unique_id: String,
    pub fh: usize,
    pub model: String,
    /// Rolling-origin window the residual comes from, 1-based.
    pub cv: usize,
    pub residual: f64,
}

/// Produces base forecasts for every series of one temporal level.
///
/// Implementations are built fresh for each level (and each fold), so they
/// only ever see one level's aggregated table.
pub trait LevelForecaster {
    /// Fit on a level's training table.
    fn fit(&mut self, table: &PeriodTable) -> Result<()>;

    /// Forecast `horizon` periods of the level.
    fn predict(&self, horizon: usize) -> Result<Vec<LevelForecast>>;

    /// Held-out residuals for steps `1..=horizon`.
    fn residuals(&self, horizon: usize) -> Result<Vec<LevelResidual>>;
}

/// Builds a level forecaster from the model names assigned to a level and
/// the level's frequency.
pub type LevelForecasterFactory =
    Arc<dyn Fn(&[String], LevelFrequency) -> Result<Box<dyn LevelForecaster>> + Send + Sync>;

struct FittedSeries {
    unique_id: String,
    history: Vec<f64>,
    models: Vec<BoxedForecaster>,
}

/// [`LevelForecaster`] backed by univariate models from a [`ModelRegistry`].
///
/// Residuals come from rolling-origin windows inside the training data: for
/// window `w` of `W` the model is refitted on all but the last
/// `horizon + W - w` periods and scored on the following `horizon` periods.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use temporal_reconcile::core::{Frequency, PeriodTable};
/// use temporal_reconcile::models::{LevelForecaster, ModelRegistry, StatisticalForecaster};
///
/// let registry = Arc::new(ModelRegistry::standard());
/// let mut forecaster = StatisticalForecaster::new(
///     vec!["Naive".to_string()],
///     Frequency::Quarterly.resampled(1),
///     registry,
/// )
/// .unwrap();
///
/// let table = PeriodTable::from_rows(vec!["a".into()], vec![vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
/// forecaster.fit(&table).unwrap();
/// let forecasts = forecaster.predict(2).unwrap();
/// assert_eq!(forecasts.len(), 2);
/// assert_eq!(forecasts[1].y, 4.0);
/// ```
pub struct StatisticalForecaster {
    models: Vec<String>,
    frequency: LevelFrequency,
    registry: Arc<ModelRegistry>,
    residual_windows: usize,
    fitted: Option<Vec<FittedSeries>>,
}

impl StatisticalForecaster {
    pub fn new(
        models: Vec<String>,
        frequency: LevelFrequency,
        registry: Arc<ModelRegistry>,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(ReconcileError::Configuration(
                "at least one model is required per level".to_string(),
            ));
        }
        if let Some(unknown) = models.iter().find(|m| registry.get(m).is_none()) {
            return Err(ReconcileError::Configuration(format!(
                "unknown model '{unknown}'"
            )));
        }

        Ok(Self {
            models,
            frequency,
            registry,
            residual_windows: 1,
            fitted: None,
        })
    }

    /// Number of rolling-origin windows used for residuals.
    ///
    /// Must be at least 1; [`fit`](LevelForecaster::fit) rejects zero.
    pub fn with_residual_windows(mut self, windows: usize) -> Self {
        self.residual_windows = windows;
        self
    }

    pub fn residual_windows(&self) -> usize {
        self.residual_windows
    }

    pub fn frequency(&self) -> LevelFrequency {
        self.frequency
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn create(&self, name: &str) -> Result<BoxedForecaster> {
        self.registry
            .get(name)
            .map(|spec| spec.create(self.frequency.seasonal_period()))
            .ok_or_else(|| ReconcileError::Configuration(format!("unknown model '{name}'")))
    }

    fn fitted(&self) -> Result<&[FittedSeries]> {
        self.fitted.as_deref().ok_or(ReconcileError::FitRequired)
    }
}

impl std::fmt::Debug for StatisticalForecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticalForecaster")
            .field("models", &self.models)
            .field("frequency", &self.frequency)
            .field("residual_windows", &self.residual_windows)
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl LevelForecaster for StatisticalForecaster {
    fn fit(&mut self, table: &PeriodTable) -> Result<()> {
        if table.n_series() == 0 || table.is_empty() {
            return Err(ReconcileError::EmptyData);
        }
        if self.residual_windows == 0 {
            return Err(ReconcileError::InvalidParameter(
                "at least one residual window is required".to_string(),
            ));
        }

        let mut fitted = Vec::with_capacity(table.n_series());
        for (id, row) in table.rows() {
            let mut models = Vec::with_capacity(self.models.len());
            for name in &self.models {
                let mut model = self.create(name)?;
                model.fit(row)?;
                models.push(model);
            }
            fitted.push(FittedSeries {
                unique_id: id.to_string(),
                history: row.to_vec(),
                models,
            });
        }

        debug!(
            frequency = %self.frequency,
            series = fitted.len(),
            models = self.models.len(),
            "fitted level forecaster"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<LevelForecast>> {
        let fitted = self.fitted()?;

        let mut out = Vec::with_capacity(fitted.len() * self.models.len() * horizon);
        for series in fitted {
            for (name, model) in self.models.iter().zip(&series.models) {
                let y = model.predict(horizon)?;
                out.extend(y.into_iter().enumerate().map(|(i, y)| LevelForecast {
                    unique_id: series.unique_id.clone(),
                    fh: i + 1,
                    model: name.clone(),
                    y,
                }));
            }
        }
        Ok(out)
    }

    fn residuals(&self, horizon: usize) -> Result<Vec<LevelResidual>> {
        let fitted = self.fitted()?;
        let windows = self.residual_windows;

        let mut out = Vec::new();
        for series in fitted {
            let n = series.history.len();
            // Every window needs at least one training period.
            if n < horizon + windows {
                return Err(ReconcileError::InsufficientData {
                    needed: horizon + windows,
                    got: n,
                });
            }

            for w in 0..windows {
                let origin = n - horizon - (windows - 1 - w);
                let (train, test) = series.history.split_at(origin);

                for name in &self.models {
                    let mut model = self.create(name)?;
                    model.fit(train)?;
                    let y_hat = model.predict(horizon)?;

                    out.extend(test.iter().zip(y_hat).enumerate().take(horizon).map(
                        |(i, (actual, pred))| LevelResidual {
                            unique_id: series.unique_id.clone(),
                            fh: i + 1,
                            model: name.clone(),
                            cv: w + 1,
                            residual: actual - pred,
                        },
                    ));
                }
            }
        }
        Ok(out)
    }
}
