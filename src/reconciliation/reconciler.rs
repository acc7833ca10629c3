//! Temporal reconciler: pivot, weight, project, melt.

use crate::core::{BaseForecast, ReconciledForecast, Residual};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::{HierarchyConfig, SummingMatrix, TemporalHierarchy};
use crate::reconciliation::{
    compute_weights, prepare, unprepare, Projection, ReconciliationFrame, ReconciliationMethod,
    Weights,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Reconciles base forecasts of a single temporal hierarchy.
///
/// # Example
/// ```
/// use temporal_reconcile::core::BaseForecast;
/// use temporal_reconcile::hierarchy::HierarchyConfig;
/// use temporal_reconcile::reconciliation::{ReconciliationMethod, TemporalReconciler};
///
/// let mut reconciler = TemporalReconciler::from_config(HierarchyConfig::from_factors(vec![1, 2])).unwrap();
/// let base = vec![
///     BaseForecast::new("a", 2, 1, "Naive", 10.0),
///     BaseForecast::new("a", 1, 1, "Naive", 4.0),
///     BaseForecast::new("a", 1, 2, "Naive", 5.0),
/// ];
/// reconciler.fit(&base).unwrap();
///
/// let coherent = reconciler.reconcile(ReconciliationMethod::Structural, None).unwrap();
/// let top = coherent.iter().find(|r| r.temporal_level == 2).unwrap().y;
/// let bottom: f64 = coherent.iter().filter(|r| r.temporal_level == 1).map(|r| r.y).sum();
/// assert!((top - bottom).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct TemporalReconciler {
    hierarchy: TemporalHierarchy,
    base: Vec<BaseForecast>,
    frame: Option<ReconciliationFrame>,
}

impl TemporalReconciler {
    pub fn new(hierarchy: TemporalHierarchy) -> Self {
        Self {
            hierarchy,
            base: Vec::new(),
            frame: None,
        }
    }

    pub fn from_config(config: HierarchyConfig) -> Result<Self> {
        Ok(Self::new(TemporalHierarchy::new(config)?))
    }

    pub fn hierarchy(&self) -> &TemporalHierarchy {
        &self.hierarchy
    }

    /// Store base forecasts and pivot them into reconciliation format.
    pub fn fit(&mut self, base: &[BaseForecast]) -> Result<()> {
        let frame = prepare(base, &self.hierarchy)?;
        debug!(
            rows = frame.n_rows(),
            nodes = frame.columns().len(),
            "prepared base forecasts"
        );
        self.base = base.to_vec();
        self.frame = Some(frame);
        Ok(())
    }

    /// Pivoted base forecasts, once fitted.
    pub fn reconciliation_frame(&self) -> Option<&ReconciliationFrame> {
        self.frame.as_ref()
    }

    /// Reconcile the fitted base forecasts.
    ///
    /// `residuals` are only used by [`ReconciliationMethod::Mse`]. A numerical
    /// failure for any series fails the whole call.
    pub fn reconcile(
        &self,
        method: ReconciliationMethod,
        residuals: Option<&[Residual]>,
    ) -> Result<Vec<ReconciledForecast>> {
        let frame = self.frame.as_ref().ok_or(ReconcileError::FitRequired)?;

        let weights = compute_weights(&self.hierarchy, method, residuals)?;
        let reconciled = reconcile_frame(frame, self.hierarchy.summing_matrix(), &weights)?;
        let out = unprepare(&reconciled, &self.base, method)?;

        info!(
            %method,
            rows = frame.n_rows(),
            records = out.len(),
            "reconciled temporal hierarchy"
        );
        Ok(out)
    }
}

/// Apply the GLS projection to every row of a frame.
///
/// Rows that share a weight matrix share one factorisation.
pub fn reconcile_frame(
    frame: &ReconciliationFrame,
    s: &SummingMatrix,
    weights: &Weights,
) -> Result<ReconciliationFrame> {
    let values = match weights {
        Weights::Shared(w) => {
            let projection = Projection::new(s, w)?;
            frame
                .values()
                .iter()
                .map(|y| projection.apply(y))
                .collect::<Result<Vec<_>>>()?
        }
        Weights::PerSeries(_) => {
            let mut projections: HashMap<&str, Projection> = HashMap::new();
            let mut values = Vec::with_capacity(frame.n_rows());
            for (key, y) in frame.rows().iter().zip(frame.values()) {
                let id = key.unique_id.as_str();
                if !projections.contains_key(id) {
                    let projection = Projection::new(s, weights.for_series(id)?)?;
                    projections.insert(id, projection);
                }
                values.push(projections[id].apply(y)?);
            }
            values
        }
    };

    frame.with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;
    use approx::assert_relative_eq;

    fn two_level() -> TemporalReconciler {
        TemporalReconciler::from_config(HierarchyConfig::from_factors(vec![1, 2])).unwrap()
    }

    fn toy_base() -> Vec<BaseForecast> {
        vec![
            BaseForecast::new("a", 2, 1, "Naive", 12.0),
            BaseForecast::new("a", 1, 1, "Naive", 4.0),
            BaseForecast::new("a", 1, 2, "Naive", 5.0),
            BaseForecast::new("b", 2, 1, "Naive", 20.0),
            BaseForecast::new("b", 1, 1, "Naive", 10.0),
            BaseForecast::new("b", 1, 2, "Naive", 12.0),
        ]
    }

    fn residual(id: &str, level: usize, fh: usize, value: f64) -> Residual {
        Residual {
            temporal_level: level,
            unique_id: id.to_string(),
            cv: Some(1),
            fh,
            model: "Naive".to_string(),
            residual: value,
        }
    }

    fn value(out: &[ReconciledForecast], id: &str, level: usize, fh: usize) -> f64 {
        out.iter()
            .find(|r| r.unique_id == id && r.temporal_level == level && r.fh == fh)
            .map(|r| r.y)
            .unwrap()
    }

    #[test]
    fn reconcile_requires_fit() {
        let reconciler = two_level();
        assert!(matches!(
            reconciler.reconcile(ReconciliationMethod::Structural, None),
            Err(ReconcileError::FitRequired)
        ));
    }

    #[test]
    fn structural_reconciliation_is_coherent() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();
        let out = reconciler
            .reconcile(ReconciliationMethod::Structural, None)
            .unwrap();

        assert_eq!(out.len(), 6);
        for id in ["a", "b"] {
            let top = value(&out, id, 2, 1);
            let bottom = value(&out, id, 1, 1) + value(&out, id, 1, 2);
            assert_relative_eq!(top, bottom, epsilon = 1e-9);
        }

        // W = diag(2, 1, 1): bottom_i = y_i + (top - sum) / 4
        assert_relative_eq!(value(&out, "a", 1, 1), 4.75, epsilon = 1e-9);
        assert_relative_eq!(value(&out, "a", 1, 2), 5.75, epsilon = 1e-9);
        assert_relative_eq!(value(&out, "a", 2, 1), 10.5, epsilon = 1e-9);
    }

    #[test]
    fn reconciled_records_keep_base_values() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();
        let out = reconciler
            .reconcile(ReconciliationMethod::Structural, None)
            .unwrap();

        let top_a = out
            .iter()
            .find(|r| r.unique_id == "a" && r.temporal_level == 2)
            .unwrap();
        assert_eq!(top_a.y_base, 12.0);
        assert_eq!(top_a.model, "TR-struc-Naive");
    }

    #[test]
    fn mse_reconciliation_uses_per_series_weights() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();

        let residuals = vec![
            // a: top level very noisy, bottom reliable
            residual("a", 2, 1, 100.0),
            residual("a", 1, 1, 0.1),
            residual("a", 1, 2, 0.1),
            // b: every node equally reliable
            residual("b", 2, 1, 1.0),
            residual("b", 1, 1, 1.0),
            residual("b", 1, 2, 1.0),
        ];
        let out = reconciler
            .reconcile(ReconciliationMethod::Mse, Some(&residuals))
            .unwrap();

        assert!((value(&out, "a", 1, 1) - 4.0).abs() < 1e-3);
        assert!((value(&out, "a", 2, 1) - 9.0).abs() < 1e-3);
        // W = I for b: bottom_i = y_i + (top - sum) / 3
        assert_relative_eq!(value(&out, "b", 1, 1), 10.0 - 2.0 / 3.0, epsilon = 1e-9);
        assert!(out.iter().all(|r| r.model == "TR-mse-Naive"));
    }

    #[test]
    fn mse_without_residuals_fails() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();
        assert!(matches!(
            reconciler.reconcile(ReconciliationMethod::Mse, None),
            Err(ReconcileError::Configuration(_))
        ));
    }

    #[test]
    fn mse_with_perfect_residuals_is_singular() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();
        let residuals: Vec<Residual> = ["a", "b"]
            .iter()
            .flat_map(|id| {
                vec![
                    residual(id, 2, 1, 0.0),
                    residual(id, 1, 1, 1.0),
                    residual(id, 1, 2, 1.0),
                ]
            })
            .collect();

        assert!(matches!(
            reconciler.reconcile(ReconciliationMethod::Mse, Some(&residuals)),
            Err(ReconcileError::SingularMatrix(_))
        ));
    }

    #[test]
    fn variance_method_is_rejected() {
        let mut reconciler = two_level();
        reconciler.fit(&toy_base()).unwrap();
        assert!(matches!(
            reconciler.reconcile(ReconciliationMethod::Variance, None),
            Err(ReconcileError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn monthly_hierarchy_reconciles_every_level() {
        let mut reconciler =
            TemporalReconciler::from_config(HierarchyConfig::from_frequency(Frequency::Monthly))
                .unwrap();
        let s = reconciler.hierarchy().summing_matrix().clone();
        let base: Vec<BaseForecast> = s
            .row_keys()
            .iter()
            .map(|k| {
                // incoherent on purpose
                BaseForecast::new("m", k.level, k.step, "ETS", 10.0 * k.level as f64 + k.step as f64)
            })
            .collect();
        reconciler.fit(&base).unwrap();

        let out = reconciler
            .reconcile(ReconciliationMethod::Structural, None)
            .unwrap();
        assert_eq!(out.len(), 28);

        let frame = reconciler.reconciliation_frame().unwrap();
        let stacked: Vec<f64> = frame
            .columns()
            .iter()
            .map(|c| value(&out, "m", c.level, c.step))
            .collect();
        assert!(s.is_coherent(&stacked, 1e-8).unwrap());
    }
}
