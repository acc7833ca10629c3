//! Forecasting models.

mod level;
mod traits;

pub mod baseline;
pub mod exponential;

pub use level::{
    LevelForecast, LevelForecaster, LevelForecasterFactory, LevelResidual,
    StatisticalForecaster,
};
pub use traits::{BoxedForecaster, Forecaster, ModelRegistry, ModelSpec};
