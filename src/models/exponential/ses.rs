//! Simple Exponential Smoothing (SES) forecasting model.
//!
//! SES is suitable for forecasting data with no clear trend or seasonality.

use crate::error::{ReconcileError, Result};
use crate::models::Forecaster;

/// Simple Exponential Smoothing forecaster.
///
/// The model equation is:
/// `level_t = α × y_t + (1-α) × level_{t-1}`
///
/// where α (alpha) is the smoothing parameter (0 < α < 1).
///
/// # Example
/// ```
/// use temporal_reconcile::models::exponential::SimpleExponentialSmoothing;
/// use temporal_reconcile::models::Forecaster;
///
/// let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0];
///
/// let mut model = SimpleExponentialSmoothing::new(0.3);
/// model.fit(&values).unwrap();
///
/// let forecast = model.predict(3).unwrap();
/// assert_eq!(forecast.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleExponentialSmoothing {
    /// Smoothing parameter (0 < alpha < 1).
    alpha: Option<f64>,
    /// Whether to choose alpha from the data.
    optimize: bool,
    /// Current level state.
    level: Option<f64>,
}

impl SimpleExponentialSmoothing {
    /// Create a new SES model with a fixed smoothing parameter.
    ///
    /// # Arguments
    /// * `alpha` - Smoothing parameter (0 < alpha < 1)
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: Some(alpha.clamp(0.0001, 0.9999)),
            optimize: false,
            level: None,
        }
    }

    /// Create a new SES model that picks alpha by minimising the in-sample SSE.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            optimize: true,
            level: None,
        }
    }

    /// Get the smoothing parameter.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Get the current level.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    fn calculate_sse(values: &[f64], alpha: f64) -> f64 {
        let Some((&first, rest)) = values.split_first() else {
            return f64::MAX;
        };

        let mut level = first;
        let mut sse = 0.0;
        for &y in rest {
            let error = y - level;
            sse += error * error;
            level = alpha * y + (1.0 - alpha) * level;
        }
        sse
    }

    /// Grid search over (0, 1) in steps of 0.01.
    fn optimize_alpha(values: &[f64]) -> f64 {
        (1..100)
            .map(|i| i as f64 / 100.0)
            .map(|alpha| (alpha, Self::calculate_sse(values, alpha)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(alpha, _)| alpha)
            .unwrap_or(0.5)
    }
}

impl Default for SimpleExponentialSmoothing {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for SimpleExponentialSmoothing {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        let Some((&first, rest)) = values.split_first() else {
            return Err(ReconcileError::EmptyData);
        };

        if self.optimize {
            self.alpha = Some(Self::optimize_alpha(values));
        }
        let alpha = self.alpha.ok_or(ReconcileError::FitRequired)?;

        let level = rest
            .iter()
            .fold(first, |level, &y| alpha * y + (1.0 - alpha) * level);
        self.level = Some(level);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let level = self.level.ok_or(ReconcileError::FitRequired)?;
        Ok(vec![level; horizon])
    }

    fn name(&self) -> &str {
        "SES"
    }
}
