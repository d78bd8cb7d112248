//! ═══════════════════════════════════════════════════════════════════════════════
//! TIME - Sampling Grids for Oscillation and Coupling
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Oscillators are continuous in t and accept any sampling. Coupling and lag
//! are expressed in integer steps, so they only run on a grid that is evenly
//! spaced at one month per step; `TimeGrid::require_monthly` enforces that.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::error::{PendulumError, PendulumResult};

/// Months per year
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Spacing tolerance when checking a grid for evenness
const SPACING_TOLERANCE: f64 = 1e-9;

/// A scalar time index in the grid's unit
pub type TimePoint = f64;

/// Unit of a time grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Months,
    Years,
}

impl TimeUnit {
    /// Convert a month count into this unit
    pub fn months_to_unit(self, months: f64) -> TimePoint {
        match self {
            TimeUnit::Months => months,
            TimeUnit::Years => months / MONTHS_PER_YEAR,
        }
    }

    /// Convert a value in this unit into years (the oscillator's unit)
    pub fn to_years(self, t: TimePoint) -> f64 {
        match self {
            TimeUnit::Months => t / MONTHS_PER_YEAR,
            TimeUnit::Years => t,
        }
    }
}

/// Ordered sample times plus their unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub unit: TimeUnit,
    times: Vec<TimePoint>,
}

impl TimeGrid {
    /// Arbitrary (possibly irregular) sample times
    pub fn from_times(unit: TimeUnit, times: Vec<TimePoint>) -> Self {
        Self { unit, times }
    }

    /// Months 0, 1, …, n-1
    pub fn monthly(n: usize) -> Self {
        Self {
            unit: TimeUnit::Months,
            times: (0..n).map(|m| m as f64).collect(),
        }
    }

    /// `start, start+step, …` strictly below `stop`, in years
    pub fn arange_years(start: f64, stop: f64, step: f64) -> Self {
        let times = if step > 0.0 && stop > start {
            // Tolerance keeps stop/step = 799.999… from adding a phantom sample
            let n = ((stop - start) / step - SPACING_TOLERANCE).ceil().max(0.0) as usize;
            (0..n).map(|i| start + i as f64 * step).collect()
        } else {
            Vec::new()
        };
        Self {
            unit: TimeUnit::Years,
            times,
        }
    }

    /// `n` evenly spaced samples over [start, end], both ends included
    pub fn linspace(unit: TimeUnit, start: f64, end: f64, n: usize) -> Self {
        let times = match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n).map(|i| start + i as f64 * step).collect()
            }
        };
        Self { unit, times }
    }

    pub fn times(&self) -> &[TimePoint] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times converted to years
    pub fn years(&self) -> Vec<f64> {
        self.times.iter().map(|&t| self.unit.to_years(t)).collect()
    }

    /// Fails unless every consecutive pair is exactly one month apart
    pub fn require_monthly(&self) -> PendulumResult<()> {
        let month = self.unit.months_to_unit(1.0);
        for (i, pair) in self.times.windows(2).enumerate() {
            let spacing = pair[1] - pair[0];
            if (spacing - month).abs() > SPACING_TOLERANCE * month.max(1.0) {
                return Err(PendulumError::IrregularGrid {
                    index: i + 1,
                    spacing,
                });
            }
        }
        Ok(())
    }
}
