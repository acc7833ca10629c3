//! Temporal aggregation of wide tables.

use crate::core::{Frequency, LevelFrequency, PeriodTable};
use crate::error::{ReconcileError, Result};
use tracing::debug;

/// Sum non-overlapping windows of `factor` periods.
///
/// Row order and period order are preserved. Each aggregated period is
/// labelled with the timestamp of its first bottom period. Trailing periods
/// that do not fill a whole window are dropped.
///
/// # Example
/// ```
/// use temporal_reconcile::core::PeriodTable;
/// use temporal_reconcile::hierarchy::resample;
///
/// let table = PeriodTable::from_rows(vec!["a".into()], vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]]).unwrap();
/// let quarterly = resample(&table, 2).unwrap();
/// assert_eq!(quarterly.row(0).unwrap(), &[3.0, 7.0]);
/// ```
pub fn resample(table: &PeriodTable, factor: usize) -> Result<PeriodTable> {
    if factor == 0 {
        return Err(ReconcileError::InvalidParameter(
            "aggregation factor must be positive".to_string(),
        ));
    }

    let windows = table.len() / factor;
    let dropped = table.len() % factor;
    if dropped > 0 {
        debug!(
            factor,
            dropped, "dropping trailing periods that do not fill a window"
        );
    }

    let values: Vec<Vec<f64>> = table
        .rows()
        .map(|(_, row)| {
            row.chunks_exact(factor)
                .map(|window| window.iter().sum::<f64>())
                .collect()
        })
        .collect();

    let timestamps = table
        .timestamps()
        .map(|ts| (0..windows).map(|w| ts[w * factor]).collect());

    Ok(PeriodTable::from_parts(
        table.ids().to_vec(),
        timestamps,
        values,
    ))
}

/// Aggregate to a temporal level and return the level's frequency tag.
pub fn resample_temporal_level(
    table: &PeriodTable,
    factor: usize,
    frequency: Frequency,
) -> Result<(PeriodTable, LevelFrequency)> {
    Ok((resample(table, factor)?, frequency.resampled(factor)))
}
