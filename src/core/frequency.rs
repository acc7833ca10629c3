//! Frequency resolution for bottom-level series and their temporal aggregates.
//!
//! A [`Frequency`] names the sampling rate of the bottom level and knows how
//! many of its periods make up one seasonal cycle. A [`LevelFrequency`] is the
//! tag for an aggregated level, e.g. `3M` for quarterly sums of monthly data.

use crate::error::{ReconcileError, Result};
use std::fmt;
use std::str::FromStr;

/// Sampling frequency of a bottom-level series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Hourly observations, 24 per daily cycle.
    Hourly,
    /// Daily observations, 7 per weekly cycle.
    Daily,
    /// Weekly observations, 52 per year.
    Weekly,
    /// Monthly observations, 12 per year.
    Monthly,
    /// Quarterly observations, 4 per year.
    Quarterly,
    /// Yearly observations.
    Yearly,
}

impl Frequency {
    /// Number of periods in one seasonal cycle.
    pub fn numeric(&self) -> usize {
        match self {
            Self::Hourly => 24,
            Self::Daily => 7,
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::Yearly => 1,
        }
    }

    /// Short code used in level tags.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hourly => "H",
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::Quarterly => "Q",
            Self::Yearly => "Y",
        }
    }

    /// Tag for the level that sums `factor` bottom periods.
    pub fn resampled(&self, factor: usize) -> LevelFrequency {
        LevelFrequency {
            base: *self,
            factor,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hourly" => Ok(Self::Hourly),
            "d" | "daily" => Ok(Self::Daily),
            "w" | "weekly" => Ok(Self::Weekly),
            "m" | "ms" | "monthly" => Ok(Self::Monthly),
            "q" | "qs" | "quarterly" => Ok(Self::Quarterly),
            "y" | "a" | "ys" | "yearly" | "annual" => Ok(Self::Yearly),
            other => Err(ReconcileError::Configuration(format!(
                "unknown frequency '{other}'"
            ))),
        }
    }
}

/// Frequency of an aggregated temporal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelFrequency {
    base: Frequency,
    factor: usize,
}

impl LevelFrequency {
    /// Bottom-level frequency this level is derived from.
    pub fn base(&self) -> Frequency {
        self.base
    }

    /// Number of bottom periods per period of this level.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Seasonal period at this level.
    ///
    /// Falls back to 1 when the factor does not divide the bottom cycle.
    pub fn seasonal_period(&self) -> usize {
        let numeric = self.base.numeric();
        if self.factor > 0 && numeric % self.factor == 0 {
            numeric / self.factor
        } else {
            1
        }
    }
}

impl fmt::Display for LevelFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factor == 1 {
            write!(f, "{}", self.base.code())
        } else {
            write!(f, "{}{}", self.factor, self.base.code())
        }
    }
}
