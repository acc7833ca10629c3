//! Aggregation matrix of a temporal hierarchy.
//!
//! A temporal hierarchy satisfies $y = S \cdot b$, where $b$ holds the
//! bottom-level periods of the forecast window and $y$ stacks every node of
//! every level. Rows are ordered coarsest level first and by step inside a
//! level, so the bottom block sits last and is the identity.

use crate::core::LevelStep;
use crate::error::{ReconcileError, Result};
use faer::{Mat, MatRef};

/// Summing matrix $S$ for a temporal hierarchy.
#[derive(Debug, Clone)]
pub struct SummingMatrix {
    inner: Mat<f64>,
    row_keys: Vec<LevelStep>,
}

impl SummingMatrix {
    /// Build $S$ for ascending `factors` over `top_fh` top-level periods.
    ///
    /// The bottom window has `max(factors) * top_fh` periods; the node
    /// `(k, s)` sums bottom periods `(s-1)k .. sk`.
    pub fn temporal(factors: &[usize], top_fh: usize) -> Result<Self> {
        let max_factor = *factors.iter().max().ok_or(ReconcileError::EmptyData)?;
        if factors.contains(&0) || top_fh == 0 {
            return Err(ReconcileError::InvalidParameter(
                "factors and top_fh must be positive".to_string(),
            ));
        }
        let n = max_factor * top_fh;

        let mut row_keys = Vec::new();
        for &factor in factors.iter().rev() {
            if n % factor != 0 {
                return Err(ReconcileError::InvalidParameter(format!(
                    "factor {factor} does not divide the bottom window of {n} periods"
                )));
            }
            row_keys.extend((1..=n / factor).map(|step| LevelStep::new(factor, step)));
        }

        let mut inner = Mat::<f64>::zeros(row_keys.len(), n);
        for (row, key) in row_keys.iter().enumerate() {
            let start = (key.step - 1) * key.level;
            for col in start..start + key.level {
                inner[(row, col)] = 1.0;
            }
        }

        Ok(Self { inner, row_keys })
    }

    /// Number of nodes (rows).
    pub fn m(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of bottom periods (columns).
    pub fn n(&self) -> usize {
        self.inner.ncols()
    }

    pub fn view(&self) -> MatRef<'_, f64> {
        self.inner.as_ref()
    }

    pub(crate) fn as_mat(&self) -> &Mat<f64> {
        &self.inner
    }

    /// Level and step of every row, in row order.
    pub fn row_keys(&self) -> &[LevelStep] {
        &self.row_keys
    }

    /// Stack every node of the hierarchy from bottom-level values.
    pub fn aggregate(&self, bottom: &[f64]) -> Result<Vec<f64>> {
        if bottom.len() != self.n() {
            return Err(ReconcileError::DimensionMismatch {
                expected: self.n(),
                got: bottom.len(),
            });
        }
        Ok((0..self.m())
            .map(|i| (0..self.n()).map(|j| self.inner[(i, j)] * bottom[j]).sum())
            .collect())
    }

    /// Whether a stacked vector already satisfies $y = S \cdot b$ within `tol`.
    pub fn is_coherent(&self, stacked: &[f64], tol: f64) -> Result<bool> {
        if stacked.len() != self.m() {
            return Err(ReconcileError::DimensionMismatch {
                expected: self.m(),
                got: stacked.len(),
            });
        }
        let bottom = &stacked[self.m() - self.n()..];
        let implied = self.aggregate(bottom)?;
        Ok(implied
            .iter()
            .zip(stacked)
            .all(|(a, b)| (a - b).abs() <= tol))
    }
}
