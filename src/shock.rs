//! ═══════════════════════════════════════════════════════════════════════════════
//! SHOCK - Bounded Additive Perturbations
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! A shock adds `magnitude` to every sample whose time lies in the half-open
//! window [start, start + width). Shocks compose by repeated application and
//! overlapping windows accumulate (no clamping). A window outside the grid
//! matches nothing and is silently a no-op.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coupling::SignalMatrix;
use crate::error::{ConfigError, DimensionError, PendulumResult};
use crate::time::{TimeGrid, TimePoint, TimeUnit};

/// Magnitude of the reference shock event
pub const DEFAULT_SHOCK_MAGNITUDE: f64 = 0.3;

/// One exogenous event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockWindow {
    /// Window start, in the grid's unit
    pub start: TimePoint,
    /// Window width, in the grid's unit
    #[serde(default = "default_width")]
    pub width: f64,
    pub magnitude: f64,
    /// Restrict to one domain when applied to a matrix; `None` hits every domain
    #[serde(default)]
    pub domain: Option<String>,
}

fn default_width() -> f64 {
    1.0
}

impl ShockWindow {
    /// Unit-width shock starting at `start`
    pub fn new(start: TimePoint, magnitude: f64) -> Self {
        Self {
            start,
            width: default_width(),
            magnitude,
            domain: None,
        }
    }

    /// Shock scheduled by month, converted into `unit`; width stays one unit
    pub fn at_month(month: f64, magnitude: f64, unit: TimeUnit) -> Self {
        Self::new(unit.months_to_unit(month), magnitude)
    }

    pub fn for_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Half-open membership: start included, start + width excluded
    pub fn contains(&self, t: TimePoint) -> bool {
        t >= self.start && t < self.start + self.width
    }
}

/// Ordered list of shocks applied to signals on a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockInjector {
    pub shocks: Vec<ShockWindow>,
}

impl ShockInjector {
    pub fn new(shocks: Vec<ShockWindow>) -> Self {
        Self { shocks }
    }

    pub fn is_empty(&self) -> bool {
        self.shocks.is_empty()
    }

    /// Add one window's magnitude in place; returns the number of samples hit
    pub fn inject(
        times: &[TimePoint],
        signal: &mut [f64],
        shock: &ShockWindow,
    ) -> PendulumResult<usize> {
        if times.len() != signal.len() {
            let what = "shock signal length vs time grid";
            return Err(DimensionError::new(what, times.len(), signal.len()).into());
        }
        let mut hits = 0;
        for (t, value) in times.iter().zip(signal.iter_mut()) {
            if shock.contains(*t) {
                *value += shock.magnitude;
                hits += 1;
            }
        }
        Ok(hits)
    }

    /// Fresh copy of `signal` with every shock applied (domain targets ignored)
    pub fn apply(&self, grid: &TimeGrid, signal: &[f64]) -> PendulumResult<Vec<f64>> {
        let mut out = signal.to_vec();
        for shock in &self.shocks {
            let hits = Self::inject(grid.times(), &mut out, shock)?;
            debug!(start = shock.start, magnitude = shock.magnitude, hits, "shock applied");
        }
        Ok(out)
    }

    /// Fresh copy of `matrix` with every shock applied to its target column(s)
    pub fn apply_to_matrix(
        &self,
        grid: &TimeGrid,
        matrix: &SignalMatrix,
    ) -> PendulumResult<SignalMatrix> {
        if grid.len() != matrix.rows() {
            let what = "shock matrix rows vs time grid";
            return Err(DimensionError::new(what, grid.len(), matrix.rows()).into());
        }
        let mut out = matrix.clone();
        for shock in &self.shocks {
            let columns: Vec<usize> = match &shock.domain {
                None => (0..matrix.cols()).collect(),
                Some(name) => match matrix.domain_index(name) {
                    Some(i) => vec![i],
                    None => {
                        return Err(ConfigError::InvalidValue {
                            field: "shock.domain".to_string(),
                            message: format!("unknown domain '{}'", name),
                        }
                        .into())
                    }
                },
            };
            let mut hits = 0;
            for (row, &t) in grid.times().iter().enumerate() {
                if shock.contains(t) {
                    for &i in &columns {
                        out.add(row, i, shock.magnitude);
                    }
                    hits += 1;
                }
            }
            debug!(
                start = shock.start,
                magnitude = shock.magnitude,
                domain = shock.domain.as_deref().unwrap_or("*"),
                hits,
                "shock applied to matrix"
            );
        }
        Ok(out)
    }
}
