//! Temporal hierarchy structure: factors, horizons, aggregation matrix and resampling.

mod descriptor;
mod resample;
mod summing;

pub use descriptor::{get_factors, HierarchyConfig, TemporalHierarchy};
pub use resample::{resample, resample_temporal_level};
pub use summing::SummingMatrix;
