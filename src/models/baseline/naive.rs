//! Naive forecasting model.
//!
//! The naive method simply forecasts the last observed value for all future periods.

use crate::error::{ReconcileError, Result};
use crate::models::Forecaster;

/// Naive forecaster that repeats the last value.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    last_value: Option<f64>,
}

impl Naive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for Naive {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        let Some(&last) = values.last() else {
            return Err(ReconcileError::EmptyData);
        };
        self.last_value = Some(last);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let last = self.last_value.ok_or(ReconcileError::FitRequired)?;
        Ok(vec![last; horizon])
    }

    fn name(&self) -> &str {
        "Naive"
    }
}
