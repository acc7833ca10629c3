//! Generalised least squares projection onto the coherent subspace.
//!
//! Reconciled forecasts are $\tilde{y} = S (S^T W^{-1} S)^{-1} S^T W^{-1} \hat{y}$.
//! The projection matrix only depends on $S$ and $W$, so it is factored once
//! and applied to every row that shares the same weights.

use crate::error::{ReconcileError, Result};
use crate::hierarchy::SummingMatrix;
use crate::reconciliation::WeightMatrix;
use faer::prelude::*;
use faer::{Mat, Side};

/// Projection $P = S (S^T W^{-1} S)^{-1} S^T W^{-1}$ for a fixed $S$ and $W$.
#[derive(Debug, Clone)]
pub struct Projection {
    inner: Mat<f64>,
}

impl Projection {
    pub fn new(s: &SummingMatrix, w: &WeightMatrix) -> Result<Self> {
        let m = s.m();
        let n = s.n();

        if w.dim() != m {
            return Err(ReconcileError::DimensionMismatch {
                expected: m,
                got: w.dim(),
            });
        }
        if let Some(bad) = w.diagonal().iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(ReconcileError::SingularMatrix(format!(
                "weight matrix is not invertible (diagonal entry {bad})"
            )));
        }

        let s_mat = s.as_mat();

        // W^-1 S
        let winv_s = Mat::<f64>::from_fn(m, n, |i, j| s_mat[(i, j)] / w.diagonal()[i]);

        // S^T W^-1 S is symmetric; positive definite unless the system is degenerate.
        let st = s_mat.transpose().to_owned();
        let st_winv_s = &st * &winv_s;
        let llt = st_winv_s.cholesky(Side::Lower).map_err(|_| {
            ReconcileError::SingularMatrix(
                "S^T W^-1 S is not positive definite".to_string(),
            )
        })?;

        // G = (S^T W^-1 S)^-1 S^T W^-1, using (W^-1 S)^T = S^T W^-1 for diagonal W.
        let g = llt.solve(&winv_s.transpose().to_owned());
        let inner = s_mat * &g;

        for i in 0..m {
            for j in 0..m {
                if !inner[(i, j)].is_finite() {
                    return Err(ReconcileError::SingularMatrix(
                        "projection contains non-finite entries".to_string(),
                    ));
                }
            }
        }

        Ok(Self { inner })
    }

    /// Number of nodes the projection acts on.
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// Reconcile one stacked vector of base forecasts.
    pub fn apply(&self, y: &[f64]) -> Result<Vec<f64>> {
        let m = self.dim();
        if y.len() != m {
            return Err(ReconcileError::DimensionMismatch {
                expected: m,
                got: y.len(),
            });
        }
        Ok((0..m)
            .map(|i| (0..m).map(|j| self.inner[(i, j)] * y[j]).sum())
            .collect())
    }
}

/// Reconcile a single vector: $\tilde{y} = S (S^T W^{-1} S)^{-1} S^T W^{-1} y$.
pub fn compute_y_tilde(y: &[f64], s: &SummingMatrix, w: &WeightMatrix) -> Result<Vec<f64>> {
    Projection::new(s, w)?.apply(y)
}
