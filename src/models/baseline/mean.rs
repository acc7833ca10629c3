//! Historic average forecasting model.

use crate::error::{ReconcileError, Result};
use crate::models::Forecaster;

/// Forecasts the mean of the whole training history.
#[derive(Debug, Clone, Default)]
pub struct HistoricAverage {
    mean: Option<f64>,
}

impl HistoricAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the training data, once fitted.
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}

impl Forecaster for HistoricAverage {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ReconcileError::EmptyData);
        }

        self.mean = Some(values.iter().sum::<f64>() / values.len() as f64);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let mean = self.mean.ok_or(ReconcileError::FitRequired)?;
        Ok(vec![mean; horizon])
    }

    fn name(&self) -> &str {
        "HistoricAverage"
    }
}
