//! Forecaster trait and model registry used to build per-level base forecasts.

use crate::error::Result;

/// Common interface for univariate forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a series of values.
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use temporal_reconcile::models::{BoxedForecaster, Forecaster};
/// use temporal_reconcile::models::baseline::Naive;
///
/// let model: BoxedForecaster = Box::new(Naive::new());
/// assert_eq!(model.name(), "Naive");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Named model factory.
///
/// The factory receives the seasonal period of the temporal level the model
/// is fitted on, so one spec serves every level of a hierarchy.
///
/// # Example
///
/// ```
/// use temporal_reconcile::models::ModelSpec;
/// use temporal_reconcile::models::baseline::{Naive, SeasonalNaive};
///
/// let specs = vec![
///     ModelSpec::new("Naive", || Box::new(Naive::new())),
///     ModelSpec::seasonal("SeasonalNaive", |p| Box::new(SeasonalNaive::new(p))),
/// ];
///
/// for spec in &specs {
///     let model = spec.create(4);
///     assert!(model.predict(1).is_err());
/// }
/// ```
pub struct ModelSpec {
    /// Display name of the model
    pub name: &'static str,
    factory: Box<dyn Fn(usize) -> BoxedForecaster + Send + Sync>,
}

impl ModelSpec {
    /// Create a model spec that does not depend on the seasonal period.
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(move |_| factory()),
        }
    }

    /// Create a model spec parameterised by the level's seasonal period.
    pub fn seasonal<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn(usize) -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
        }
    }

    /// Create a new model instance for a level with the given seasonal period.
    pub fn create(&self, period: usize) -> BoxedForecaster {
        (self.factory)(period)
    }
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec").field("name", &self.name).finish()
    }
}

/// Collection of model specifications, looked up by name.
///
/// # Example
///
/// ```
/// use temporal_reconcile::models::{ModelRegistry, ModelSpec};
/// use temporal_reconcile::models::baseline::Naive;
///
/// let mut registry = ModelRegistry::new();
/// registry.register(ModelSpec::new("Naive", || Box::new(Naive::new())));
///
/// let spec = registry.get("Naive").unwrap();
/// assert_eq!(spec.create(1).name(), "Naive");
/// ```
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Registry with the built-in baseline and smoothing models.
    pub fn standard() -> Self {
        use crate::models::baseline::{HistoricAverage, Naive, SeasonalNaive};
        use crate::models::exponential::SimpleExponentialSmoothing;

        let mut registry = Self::new();
        registry.register(ModelSpec::new("Naive", || Box::new(Naive::new())));
        registry.register(ModelSpec::seasonal("SeasonalNaive", |p| {
            Box::new(SeasonalNaive::new(p))
        }));
        registry.register(ModelSpec::new("HistoricAverage", || {
            Box::new(HistoricAverage::new())
        }));
        registry.register(ModelSpec::new("SES", || {
            Box::new(SimpleExponentialSmoothing::auto())
        }));
        registry
    }

    /// Register a model specification. A later spec with the same name wins.
    pub fn register(&mut self, spec: ModelSpec) {
        self.models.retain(|m| m.name != spec.name);
        self.models.push(spec);
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Get the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Iterate over model specifications.
    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
