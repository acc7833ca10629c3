//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the previous cycle.

use crate::error::{ReconcileError, Result};
use crate::models::Forecaster;

/// Seasonal Naive forecaster.
///
/// Each forecast is equal to the observation from the same season
/// in the last complete seasonal cycle. A period of 1 degrades to [`Naive`].
///
/// [`Naive`]: crate::models::baseline::Naive
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    last_cycle: Option<Vec<f64>>,
}

impl SeasonalNaive {
    /// Create a new SeasonalNaive model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            last_cycle: None,
        }
    }

    /// Get the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ReconcileError::EmptyData);
        }
        if values.len() < self.period {
            return Err(ReconcileError::InsufficientData {
                needed: self.period,
                got: values.len(),
            });
        }

        self.last_cycle = Some(values[values.len() - self.period..].to_vec());
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let last_cycle = self.last_cycle.as_ref().ok_or(ReconcileError::FitRequired)?;
        Ok((0..horizon).map(|h| last_cycle[h % self.period]).collect())
    }

    fn name(&self) -> &str {
        "SeasonalNaive"
    }
}
