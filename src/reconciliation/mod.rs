//! Reconciliation of temporal hierarchy forecasts.
//!
//! Base forecasts are pivoted into the row layout of the summing matrix,
//! projected onto the coherent subspace with a weighted least squares
//! projection, and melted back to long form.

mod format;
mod reconciler;
mod solver;
mod weights;

pub use format::{prepare, structural_order, unprepare, ReconciliationFrame, RowKey};
pub use reconciler::{reconcile_frame, TemporalReconciler};
pub use solver::{compute_y_tilde, Projection};
pub use weights::{
    compute_weights, mse_weights, structural_weights, ReconciliationMethod, WeightMatrix, Weights,
};
