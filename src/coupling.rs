//! ═══════════════════════════════════════════════════════════════════════════════
//! COUPLING - Cross-Domain Propagation (Instantaneous + Lagged)
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//!   C[t,i] = R[t,i] + Σ_j A[i,j]·R[t,j] + Σ_j A_lag[i,j]·R[t−L,j]   (t ≥ L)
//!   C[t,i] = R[t,i] + Σ_j A[i,j]·R[t,j]                            (t < L)
//!
//! Feed-forward: every term reads the raw matrix R, never C, so coupling
//! cannot amplify itself. Row t only reads rows ≤ t (causal). Requires an
//! evenly spaced monthly grid because L is an integer step count.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, DimensionError, PendulumResult};
use crate::params::{CouplingMatrices, ParameterSet};
use crate::stats;
use crate::time::TimeGrid;

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNAL MATRIX - T×D, rows are time steps, columns are domains
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalMatrixRepr")]
pub struct SignalMatrix {
    domains: Vec<String>,
    rows: usize,
    /// Row-major values
    values: Vec<f64>,
}

/// Wire form; shape is checked before it becomes a `SignalMatrix`
#[derive(Deserialize)]
struct SignalMatrixRepr {
    domains: Vec<String>,
    rows: usize,
    values: Vec<f64>,
}

impl TryFrom<SignalMatrixRepr> for SignalMatrix {
    type Error = DimensionError;

    fn try_from(repr: SignalMatrixRepr) -> Result<Self, Self::Error> {
        let expected = repr.rows * repr.domains.len();
        if repr.values.len() != expected {
            return Err(DimensionError::new(
                "signal values (rows × domains)",
                expected,
                repr.values.len(),
            ));
        }
        Ok(Self {
            domains: repr.domains,
            rows: repr.rows,
            values: repr.values,
        })
    }
}

impl SignalMatrix {
    /// All-zero T×D matrix
    pub fn zeros(domains: Vec<String>, rows: usize) -> Self {
        let cols = domains.len();
        Self {
            domains,
            rows,
            values: vec![0.0; rows * cols],
        }
    }

    /// One column per domain; all columns must share a length
    pub fn from_columns(domains: Vec<String>, columns: Vec<Vec<f64>>) -> PendulumResult<Self> {
        if columns.len() != domains.len() {
            return Err(DimensionError::new("signal columns", domains.len(), columns.len()).into());
        }
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut matrix = Self::zeros(domains, rows);
        for (i, column) in columns.iter().enumerate() {
            if column.len() != rows {
                let what = format!("signal column {} length", i);
                return Err(DimensionError::new(what, rows, column.len()).into());
            }
            for (t, &v) in column.iter().enumerate() {
                matrix.set(t, i, v);
            }
        }
        Ok(matrix)
    }

    /// One row per time step; every row must have D values
    pub fn from_rows(domains: Vec<String>, rows: Vec<Vec<f64>>) -> PendulumResult<Self> {
        let cols = domains.len();
        let mut values = Vec::with_capacity(rows.len() * cols);
        for (t, row) in rows.iter().enumerate() {
            if row.len() != cols {
                let what = format!("signal row {} columns", t);
                return Err(DimensionError::new(what, cols, row.len()).into());
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            domains,
            rows: rows.len(),
            values,
        })
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.domains.len()
    }

    pub fn get(&self, t: usize, i: usize) -> f64 {
        self.values[t * self.cols() + i]
    }

    pub fn set(&mut self, t: usize, i: usize, value: f64) {
        let cols = self.cols();
        self.values[t * cols + i] = value;
    }

    pub fn add(&mut self, t: usize, i: usize, delta: f64) {
        let cols = self.cols();
        self.values[t * cols + i] += delta;
    }

    pub fn row(&self, t: usize) -> &[f64] {
        let cols = self.cols();
        &self.values[t * cols..(t + 1) * cols]
    }

    pub fn column(&self, i: usize) -> Vec<f64> {
        (0..self.rows).map(|t| self.get(t, i)).collect()
    }

    pub fn column_by_name(&self, domain: &str) -> Option<Vec<f64>> {
        self.domain_index(domain).map(|i| self.column(i))
    }

    pub fn domain_index(&self, domain: &str) -> Option<usize> {
        self.domains.iter().position(|d| d == domain)
    }

    /// Cross-domain mean per time step
    pub fn row_means(&self) -> Vec<f64> {
        (0..self.rows).map(|t| stats::mean(self.row(t))).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPAGATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether A[i][i] contributes to C[t,i]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTerm {
    /// Diagonal is self-reinforcement
    #[default]
    Include,
    /// Only j ≠ i contributes
    Exclude,
}

/// Stateless linear coupling filter over domains
#[derive(Debug, Clone)]
pub struct CouplingPropagator<'a> {
    matrices: &'a CouplingMatrices,
    lag: usize,
    self_term: SelfTerm,
}

impl<'a> CouplingPropagator<'a> {
    pub fn new(matrices: &'a CouplingMatrices, lag: usize) -> Self {
        Self {
            matrices,
            lag,
            self_term: SelfTerm::Include,
        }
    }

    pub fn from_params(params: &'a ParameterSet) -> Self {
        Self::new(&params.coupling, params.default_lag)
    }

    pub fn with_self_term(mut self, self_term: SelfTerm) -> Self {
        self.self_term = self_term;
        self
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Couple a raw T×D matrix sampled on `grid`
    pub fn propagate(&self, grid: &TimeGrid, raw: &SignalMatrix) -> PendulumResult<SignalMatrix> {
        self.matrices.validate()?;
        let d = self.matrices.domain_count();

        if raw.cols() != d {
            return Err(DimensionError::new("signal domain columns", d, raw.cols()).into());
        }
        if raw.domains() != self.matrices.domains.as_slice() {
            return Err(ConfigError::InvalidValue {
                field: "signal.domains".to_string(),
                message: format!(
                    "signal domains [{}] do not match coupling domains [{}]",
                    raw.domains().join(", "),
                    self.matrices.domains.join(", ")
                ),
            }
            .into());
        }
        if grid.len() != raw.rows() {
            let err = DimensionError::new("signal rows vs time grid", grid.len(), raw.rows());
            return Err(err.into());
        }
        grid.require_monthly()?;

        debug!(
            domains = d,
            rows = raw.rows(),
            lag = self.lag,
            "propagating cross-domain coupling"
        );

        let a = &self.matrices.instantaneous;
        let a_lag = &self.matrices.lagged;
        let mut coupled = raw.clone();

        for t in 0..raw.rows() {
            let now = raw.row(t);
            let past = t.checked_sub(self.lag).map(|p| raw.row(p));

            for i in 0..d {
                let mut acc = 0.0;
                for j in 0..d {
                    if j == i && self.self_term == SelfTerm::Exclude {
                        continue;
                    }
                    acc += a[i][j] * now[j];
                }
                if let Some(past) = past {
                    for j in 0..d {
                        acc += a_lag[i][j] * past[j];
                    }
                }
                coupled.add(t, i, acc);
            }
        }

        Ok(coupled)
    }
}
