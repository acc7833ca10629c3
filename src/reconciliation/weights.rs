//! Reconciliation weight matrices.
//!
//! Weights are diagonal: entry $i$ is the assumed error variance of node $i$
//! of the hierarchy, in the row order of the summing matrix.

use crate::core::{LevelStep, Residual};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::TemporalHierarchy;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How reconciliation weights are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconciliationMethod {
    /// Variance proportional to the number of bottom periods a node spans.
    Structural,
    /// Variance estimated from held-out mean squared errors per series.
    Mse,
    /// Full variance-covariance weighting. Reserved; always rejected.
    Variance,
}

impl ReconciliationMethod {
    /// Short tag used in reconciled model names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Structural => "struc",
            Self::Mse => "mse",
            Self::Variance => "variance",
        }
    }
}

impl fmt::Display for ReconciliationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ReconciliationMethod {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "struc" | "structural" => Ok(Self::Structural),
            "mse" => Ok(Self::Mse),
            "variance" => Ok(Self::Variance),
            other => Err(ReconcileError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Diagonal weight matrix over the nodes of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    diagonal: Vec<f64>,
}

impl WeightMatrix {
    pub fn from_diagonal(diagonal: Vec<f64>) -> Self {
        Self { diagonal }
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn dim(&self) -> usize {
        self.diagonal.len()
    }
}

/// Weights for a reconciliation call.
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// One matrix for every row.
    Shared(WeightMatrix),
    /// One matrix per series id.
    PerSeries(HashMap<String, WeightMatrix>),
}

impl Weights {
    /// Weight matrix that applies to a series.
    pub fn for_series(&self, unique_id: &str) -> Result<&WeightMatrix> {
        match self {
            Self::Shared(w) => Ok(w),
            Self::PerSeries(map) => map.get(unique_id).ok_or_else(|| {
                ReconcileError::DataIntegrity(format!(
                    "no residuals for series '{unique_id}'"
                ))
            }),
        }
    }
}

/// Build the weights for `method`.
///
/// `Mse` requires residuals; `Variance` is not supported.
pub fn compute_weights(
    hierarchy: &TemporalHierarchy,
    method: ReconciliationMethod,
    residuals: Option<&[Residual]>,
) -> Result<Weights> {
    let weights = match method {
        ReconciliationMethod::Structural => {
            Weights::Shared(structural_weights(hierarchy.frequencies()))
        }
        ReconciliationMethod::Mse => {
            let residuals = residuals.ok_or_else(|| {
                ReconcileError::Configuration(
                    "residuals are required for mse reconciliation".to_string(),
                )
            })?;
            Weights::PerSeries(mse_weights(
                hierarchy.summing_matrix().row_keys(),
                residuals,
            )?)
        }
        ReconciliationMethod::Variance => {
            return Err(ReconcileError::UnsupportedMethod(
                "variance weighting is not implemented".to_string(),
            ))
        }
    };

    debug!(%method, "computed reconciliation weights");
    Ok(weights)
}

/// Structural weights from the per-level node counts.
///
/// Each node is weighted by the number of bottom periods it spans,
/// `max(frequencies) / frequency`. Coarsest level first.
pub fn structural_weights(frequencies: &[usize]) -> WeightMatrix {
    let bottom = frequencies.iter().copied().max().unwrap_or(0);
    let diagonal = frequencies
        .iter()
        .rev()
        .flat_map(|&nodes| std::iter::repeat((bottom / nodes) as f64).take(nodes))
        .collect();
    WeightMatrix::from_diagonal(diagonal)
}

/// Per-series diagonal of mean squared residuals, ordered by `row_keys`.
///
/// Non-finite residuals are skipped.
pub fn mse_weights(
    row_keys: &[LevelStep],
    residuals: &[Residual],
) -> Result<HashMap<String, WeightMatrix>> {
    let mut sums: BTreeMap<(&str, LevelStep), (f64, usize)> = BTreeMap::new();
    for r in residuals.iter().filter(|r| r.residual.is_finite()) {
        let entry = sums
            .entry((r.unique_id.as_str(), r.level_step()))
            .or_insert((0.0, 0));
        entry.0 += r.residual * r.residual;
        entry.1 += 1;
    }

    let mut series: Vec<&str> = sums.keys().map(|(id, _)| *id).collect();
    series.dedup();

    let mut weights = HashMap::with_capacity(series.len());
    for id in series {
        let diagonal = row_keys
            .iter()
            .map(|key| {
                sums.get(&(id, *key))
                    .map(|(sum, count)| sum / *count as f64)
                    .ok_or_else(|| {
                        ReconcileError::DataIntegrity(format!(
                            "missing residuals for series '{id}' at level {} step {}",
                            key.level, key.step
                        ))
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        weights.insert(id.to_string(), WeightMatrix::from_diagonal(diagonal));
    }

    Ok(weights)
}
