//! # temporal-reconcile
//!
//! Temporal hierarchy forecasting and reconciliation.
//!
//! A bottom-level series (monthly, say) is summed into every coarser level
//! whose period divides the seasonal cycle (bi-monthly, quarterly, ...,
//! yearly). Each level is forecast independently, then the base forecasts
//! are projected onto the coherent subspace so that every coarse forecast
//! equals the sum of the finer forecasts it covers.
//!
//! ```
//! use temporal_reconcile::prelude::*;
//!
//! let values: Vec<f64> = (0..48).map(|i| 100.0 + i as f64 + (i % 12) as f64).collect();
//! let table = PeriodTable::from_rows(vec!["sku".into()], vec![values]).unwrap();
//!
//! let mut thief = Thief::new(HierarchyConfig::from_frequency(Frequency::Monthly)).unwrap();
//! thief.fit(&table, FitMode::NoHoldout).unwrap();
//! thief.predict(&ModelSelection::uniform("SES")).unwrap();
//! let coherent = thief.reconcile(ReconciliationMethod::Mse).unwrap();
//! assert_eq!(coherent.len(), 28);
//! ```

#![allow(clippy::needless_range_loop)]
#![allow(clippy::type_complexity)]

pub mod core;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod reconciliation;
pub mod thief;

pub use error::{ReconcileError, Result};

pub mod prelude {
    pub use crate::core::{
        BaseForecast, Frequency, LevelFrequency, PeriodTable, ReconciledForecast, Residual,
    };
    pub use crate::error::{ReconcileError, Result};
    pub use crate::hierarchy::{HierarchyConfig, TemporalHierarchy};
    pub use crate::models::{LevelForecaster, ModelRegistry};
    pub use crate::reconciliation::{ReconciliationMethod, TemporalReconciler};
    pub use crate::thief::{FitMode, ModelSelection, Thief};
}
