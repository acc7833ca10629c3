//! Conversion between long-form base forecasts and the matrix layout of $S$.
//!
//! The column order of a [`ReconciliationFrame`] must match the row order of
//! the summing matrix exactly. [`prepare`] checks this rather than assuming it.

use crate::core::{BaseForecast, LevelStep, ReconciledForecast};
use crate::error::{ReconcileError, Result};
use crate::hierarchy::TemporalHierarchy;
use crate::reconciliation::ReconciliationMethod;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identity of one row of a reconciliation frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub unique_id: String,
    pub model: String,
    pub cv: Option<usize>,
}

impl RowKey {
    fn of(fc: &BaseForecast) -> Self {
        Self {
            unique_id: fc.unique_id.clone(),
            model: fc.model.clone(),
            cv: fc.cv,
        }
    }
}

/// Base forecasts pivoted to one row per (series, model, fold) and one
/// column per hierarchy node, in structural order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationFrame {
    rows: Vec<RowKey>,
    columns: Vec<LevelStep>,
    values: Vec<Vec<f64>>,
}

impl ReconciliationFrame {
    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    pub fn columns(&self) -> &[LevelStep] {
        &self.columns
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Same rows and columns with new values.
    pub fn with_values(&self, values: Vec<Vec<f64>>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(ReconcileError::DimensionMismatch {
                expected: self.rows.len(),
                got: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|row| row.len() != self.columns.len()) {
            return Err(ReconcileError::DimensionMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        Ok(Self {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values,
        })
    }
}

/// Reorder numerically sorted columns into hierarchy order.
///
/// `frequencies[i]` is the node count of the i-th level in ascending factor
/// order. Columns are sorted by `(level, step)`, split into one chunk per
/// level and the chunks reversed so the coarsest level comes first.
pub fn structural_order(
    mut columns: Vec<LevelStep>,
    frequencies: &[usize],
) -> Result<Vec<LevelStep>> {
    columns.sort();

    let expected: usize = frequencies.iter().sum();
    if columns.len() != expected {
        return Err(ReconcileError::DataIntegrity(format!(
            "expected {expected} level/step columns, found {}",
            columns.len()
        )));
    }

    let mut chunks = Vec::with_capacity(frequencies.len());
    let mut start = 0;
    for &nodes in frequencies {
        let chunk = &columns[start..start + nodes];
        let Some(first) = chunk.first() else {
            return Err(ReconcileError::DataIntegrity(
                "hierarchy level with no nodes".to_string(),
            ));
        };
        if chunk.iter().any(|c| c.level != first.level) {
            return Err(ReconcileError::DataIntegrity(format!(
                "level {} does not have {nodes} steps",
                first.level
            )));
        }
        chunks.push(chunk);
        start += nodes;
    }

    Ok(chunks.into_iter().rev().flatten().copied().collect())
}

/// Pivot base forecasts into a frame aligned with the hierarchy's $S$.
pub fn prepare(
    base: &[BaseForecast],
    hierarchy: &TemporalHierarchy,
) -> Result<ReconciliationFrame> {
    if base.is_empty() {
        return Err(ReconcileError::EmptyData);
    }

    let mut cells: BTreeMap<RowKey, HashMap<LevelStep, f64>> = BTreeMap::new();
    let mut seen_columns = BTreeSet::new();
    for fc in base {
        let key = fc.level_step();
        seen_columns.insert(key);
        let row = cells.entry(RowKey::of(fc)).or_default();
        if row.insert(key, fc.y).is_some() {
            return Err(ReconcileError::DataIntegrity(format!(
                "duplicate forecast for series '{}' model '{}' at {key}",
                fc.unique_id, fc.model
            )));
        }
    }

    let columns = structural_order(seen_columns.into_iter().collect(), hierarchy.frequencies())?;
    if columns.as_slice() != hierarchy.summing_matrix().row_keys() {
        return Err(ReconcileError::DataIntegrity(
            "forecast columns do not match the hierarchy structure".to_string(),
        ));
    }

    let mut rows = Vec::with_capacity(cells.len());
    let mut values = Vec::with_capacity(cells.len());
    for (row_key, row) in cells {
        let row_values = columns
            .iter()
            .map(|col| {
                row.get(col).copied().ok_or_else(|| {
                    ReconcileError::DataIntegrity(format!(
                        "series '{}' model '{}' has no forecast at {col}",
                        row_key.unique_id, row_key.model
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row_key);
        values.push(row_values);
    }

    Ok(ReconciliationFrame {
        rows,
        columns,
        values,
    })
}

/// Melt a reconciled frame back to long form, joining the base values.
pub fn unprepare(
    reconciled: &ReconciliationFrame,
    base: &[BaseForecast],
    method: ReconciliationMethod,
) -> Result<Vec<ReconciledForecast>> {
    let base_values: HashMap<(RowKey, LevelStep), f64> = base
        .iter()
        .map(|fc| ((RowKey::of(fc), fc.level_step()), fc.y))
        .collect();

    let mut out = Vec::with_capacity(reconciled.n_rows() * reconciled.columns.len());
    for (row_key, row) in reconciled.rows.iter().zip(&reconciled.values) {
        for (col, &y) in reconciled.columns.iter().zip(row) {
            let y_base = base_values
                .get(&(row_key.clone(), *col))
                .copied()
                .ok_or_else(|| {
                    ReconcileError::DataIntegrity(format!(
                        "no base forecast for series '{}' model '{}' at {col}",
                        row_key.unique_id, row_key.model
                    ))
                })?;

            out.push(ReconciledForecast {
                unique_id: row_key.unique_id.clone(),
                temporal_level: col.level,
                fh: col.step,
                model: format!("TR-{}-{}", method.tag(), row_key.model),
                y,
                y_base,
                cv: row_key.cv,
            });
        }
    }

    Ok(out)
}
