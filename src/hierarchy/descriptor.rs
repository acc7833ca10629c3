//! Temporal hierarchy descriptor: aggregation factors, level horizons and $S$.

use crate::core::{Frequency, LevelFrequency};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::SummingMatrix;

/// All divisors of `n`, ascending.
///
/// # Example
/// ```
/// use temporal_reconcile::hierarchy::get_factors;
///
/// assert_eq!(get_factors(12), vec![1, 2, 3, 4, 6, 12]);
/// ```
pub fn get_factors(n: usize) -> Vec<usize> {
    (1..=n).filter(|i| n % i == 0).collect()
}

/// Configuration for a [`TemporalHierarchy`].
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// Bottom-level frequency.
    pub frequency: Option<Frequency>,
    /// Explicit ascending aggregation factors.
    pub factors: Option<Vec<usize>>,
    /// Number of top-level periods to forecast.
    pub top_fh: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            frequency: None,
            factors: None,
            top_fh: 1,
        }
    }
}

impl HierarchyConfig {
    /// Derive factors from the divisors of the frequency's cycle length.
    pub fn from_frequency(frequency: Frequency) -> Self {
        Self {
            frequency: Some(frequency),
            ..Self::default()
        }
    }

    /// Use an explicit list of factors.
    pub fn from_factors(factors: Vec<usize>) -> Self {
        Self {
            factors: Some(factors),
            ..Self::default()
        }
    }

    /// Set the bottom-level frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Set explicit factors.
    pub fn with_factors(mut self, factors: Vec<usize>) -> Self {
        self.factors = Some(factors);
        self
    }

    /// Set the number of top-level periods to forecast.
    pub fn with_top_fh(mut self, top_fh: usize) -> Self {
        self.top_fh = top_fh;
        self
    }
}

/// Levels of a temporal hierarchy and their aggregation structure.
///
/// # Example
/// ```
/// use temporal_reconcile::core::Frequency;
/// use temporal_reconcile::hierarchy::{HierarchyConfig, TemporalHierarchy};
///
/// let hierarchy = TemporalHierarchy::new(HierarchyConfig::from_frequency(Frequency::Monthly)).unwrap();
/// assert_eq!(hierarchy.factors(), &[1, 2, 3, 4, 6, 12]);
/// assert_eq!(hierarchy.fhs(), &[12, 6, 4, 3, 2, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct TemporalHierarchy {
    frequency: Option<Frequency>,
    factors: Vec<usize>,
    fhs: Vec<usize>,
    top_fh: usize,
    summing: SummingMatrix,
}

impl TemporalHierarchy {
    pub fn new(config: HierarchyConfig) -> Result<Self> {
        if config.top_fh == 0 {
            return Err(ReconcileError::InvalidParameter(
                "top_fh must be positive".to_string(),
            ));
        }

        let factors = match (config.factors, config.frequency) {
            (Some(factors), _) => factors,
            (None, Some(frequency)) => get_factors(frequency.numeric()),
            (None, None) => {
                return Err(ReconcileError::Configuration(
                    "either factors or a bottom-level frequency must be given".to_string(),
                ))
            }
        };
        validate_factors(&factors, config.frequency)?;

        let max_factor = factors[factors.len() - 1];
        let fhs = factors
            .iter()
            .map(|&factor| (max_factor / factor) * config.top_fh)
            .collect();
        let summing = SummingMatrix::temporal(&factors, config.top_fh)?;

        Ok(Self {
            frequency: config.frequency,
            factors,
            fhs,
            top_fh: config.top_fh,
            summing,
        })
    }

    /// Aggregation factors, ascending.
    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    /// Forecast horizon per factor, aligned with [`factors`](Self::factors).
    pub fn fhs(&self) -> &[usize] {
        &self.fhs
    }

    /// Alias of [`fhs`](Self::fhs): number of nodes per level.
    pub fn frequencies(&self) -> &[usize] {
        &self.fhs
    }

    /// Level node counts in reverse factor order.
    pub fn m(&self) -> Vec<usize> {
        self.fhs.iter().rev().copied().collect()
    }

    /// Largest horizon, i.e. the bottom-level window length.
    pub fn max_freq(&self) -> usize {
        self.fhs.iter().copied().max().unwrap_or(0)
    }

    /// Largest aggregation factor (the top level).
    pub fn max_factor(&self) -> usize {
        self.factors.last().copied().unwrap_or(1)
    }

    pub fn total_levels(&self) -> usize {
        self.factors.len()
    }

    pub fn top_fh(&self) -> usize {
        self.top_fh
    }

    pub fn bottom_frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Horizon of the level with the given factor.
    pub fn horizon_for(&self, factor: usize) -> Option<usize> {
        self.factors
            .iter()
            .position(|&f| f == factor)
            .map(|i| self.fhs[i])
    }

    pub fn summing_matrix(&self) -> &SummingMatrix {
        &self.summing
    }

    /// Total number of nodes across all levels.
    pub fn n_nodes(&self) -> usize {
        self.summing.m()
    }

    /// Frequency tag of every level, when the bottom frequency is known.
    pub fn level_frequencies(&self) -> Option<Vec<LevelFrequency>> {
        let frequency = self.frequency?;
        Some(
            self.factors
                .iter()
                .map(|&factor| frequency.resampled(factor))
                .collect(),
        )
    }
}

fn validate_factors(factors: &[usize], frequency: Option<Frequency>) -> Result<()> {
    if factors.is_empty() {
        return Err(ReconcileError::Configuration(
            "factor list is empty".to_string(),
        ));
    }
    if factors[0] != 1 {
        return Err(ReconcileError::Configuration(
            "factors must start with the bottom level 1".to_string(),
        ));
    }
    if factors.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ReconcileError::Configuration(
            "factors must be strictly ascending".to_string(),
        ));
    }

    let max_factor = factors[factors.len() - 1];
    if let Some(bad) = factors.iter().find(|&&f| max_factor % f != 0) {
        return Err(ReconcileError::Configuration(format!(
            "factor {bad} does not divide the top factor {max_factor}"
        )));
    }

    if let Some(frequency) = frequency {
        let numeric = frequency.numeric();
        if let Some(bad) = factors.iter().find(|&&f| numeric % f != 0) {
            return Err(ReconcileError::Configuration(format!(
                "factor {bad} does not divide the {frequency} cycle of {numeric}"
            )));
        }
    }

    Ok(())
}
