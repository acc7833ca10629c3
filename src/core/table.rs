//! Wide table of bottom-level (or aggregated) series.

use crate::error::{ReconcileError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Series laid out as rows, ordered periods laid out as columns.
///
/// `values[row][period]`. Period timestamps are optional; when present they
/// must be strictly increasing and label the start of each period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTable {
    ids: Vec<String>,
    timestamps: Option<Vec<DateTime<Utc>>>,
    values: Vec<Vec<f64>>,
}

impl PeriodTable {
    /// Create a table whose periods are labelled with timestamps.
    pub fn new(
        ids: Vec<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ReconcileError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Self::validated(ids, Some(timestamps), values)
    }

    /// Create a table with positional periods only.
    pub fn from_rows(ids: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self> {
        Self::validated(ids, None, values)
    }

    fn validated(
        ids: Vec<String>,
        timestamps: Option<Vec<DateTime<Utc>>>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if ids.len() != values.len() {
            return Err(ReconcileError::DimensionMismatch {
                expected: ids.len(),
                got: values.len(),
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(ReconcileError::InvalidParameter(format!(
                    "duplicate series id '{id}'"
                )));
            }
        }

        let width = match &timestamps {
            Some(ts) => ts.len(),
            None => values.first().map(|row| row.len()).unwrap_or(0),
        };
        for row in &values {
            if row.len() != width {
                return Err(ReconcileError::DimensionMismatch {
                    expected: width,
                    got: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ReconcileError::InvalidParameter(
                    "table values must be finite".to_string(),
                ));
            }
        }

        Ok(Self {
            ids,
            timestamps,
            values,
        })
    }

    /// Number of periods (columns).
    pub fn len(&self) -> usize {
        match &self.timestamps {
            Some(ts) => ts.len(),
            None => self.values.first().map(|row| row.len()).unwrap_or(0),
        }
    }

    /// Check if the table has no periods or no series.
    pub fn is_empty(&self) -> bool {
        self.len() == 0 || self.values.is_empty()
    }

    /// Number of series (rows).
    pub fn n_series(&self) -> usize {
        self.ids.len()
    }

    /// Series identifiers in row order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Period start timestamps, if the table carries them.
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Values of one series.
    pub fn row(&self, index: usize) -> Result<&[f64]> {
        self.values
            .get(index)
            .map(|row| row.as_slice())
            .ok_or(ReconcileError::InvalidParameter(format!(
                "row {index} out of bounds ({} series)",
                self.ids.len()
            )))
    }

    /// Iterate over `(id, values)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.ids
            .iter()
            .map(|id| id.as_str())
            .zip(self.values.iter().map(|row| row.as_slice()))
    }

    /// Columns `[start, end)` as a new table.
    pub fn slice(&self, start: usize, end: usize) -> Result<PeriodTable> {
        if start > end || end > self.len() {
            return Err(ReconcileError::InvalidParameter(format!(
                "invalid period range {start}..{end} for table of length {}",
                self.len()
            )));
        }

        Ok(PeriodTable {
            ids: self.ids.clone(),
            timestamps: self.timestamps.as_ref().map(|ts| ts[start..end].to_vec()),
            values: self
                .values
                .iter()
                .map(|row| row[start..end].to_vec())
                .collect(),
        })
    }

    /// Drop the oldest periods so the length is a multiple of `block`.
    pub fn align_to(&self, block: usize) -> Result<PeriodTable> {
        if block == 0 {
            return Err(ReconcileError::InvalidParameter(
                "alignment block must be positive".to_string(),
            ));
        }
        let n = self.len();
        self.slice(n % block, n)
    }

    pub(crate) fn from_parts(
        ids: Vec<String>,
        timestamps: Option<Vec<DateTime<Utc>>>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            ids,
            timestamps,
            values,
        }
    }
}
