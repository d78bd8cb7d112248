//! ═══════════════════════════════════════════════════════════════════════════════
//! SIMULATION - Deterministic Replay of the Coupled Pendulum
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! monthly grid → per-domain oscillator (+ secular driver, + seeded noise)
//!              → raw T×D → coupling → shocks → coupled T×D
//!
//! Identical parameters and config always produce identical output. Nothing is
//! shared between calls; every run builds its own arrays.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coupling::{CouplingPropagator, SignalMatrix};
use crate::error::{DimensionError, PendulumResult};
use crate::oscillator::DomainOscillator;
use crate::params::ParameterSet;
use crate::shock::{ShockInjector, ShockWindow, DEFAULT_SHOCK_MAGNITUDE};
use crate::stats::{Ewma, NoiseSource};
use crate::time::{TimeGrid, TimeUnit, MONTHS_PER_YEAR};

/// Phase spread between consecutive domains when no offsets are configured
pub const DEFAULT_DOMAIN_SPREAD_YEARS: f64 = 0.5;

/// Reference theoretical run: 80 years sampled every 0.1 years
pub const TREND_LENGTH_MONTHS: f64 = 960.0;
pub const TREND_SHOCK_MONTH: f64 = 400.0;
pub const TREND_STEP_YEARS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of monthly steps
    pub months: usize,
    /// Per-domain time offsets in years; empty means evenly spread
    pub domain_offsets_years: Vec<f64>,
    /// Weight of `ParameterSet::secular_driver` added to each raw signal
    pub secular_weight: f64,
    /// Add N(0, σ²) noise from the parameter seed
    pub noise: bool,
    /// Applied to the coupled output; times are in months
    pub shocks: Vec<ShockWindow>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            months: 960,
            domain_offsets_years: Vec::new(),
            secular_weight: 0.0,
            noise: true,
            shocks: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Effective per-domain offsets
    pub fn offsets(&self, domains: usize) -> PendulumResult<Vec<f64>> {
        if self.domain_offsets_years.is_empty() {
            return Ok((0..domains)
                .map(|i| i as f64 * DEFAULT_DOMAIN_SPREAD_YEARS)
                .collect());
        }
        if self.domain_offsets_years.len() != domains {
            let actual = self.domain_offsets_years.len();
            return Err(DimensionError::new("domain offsets", domains, actual).into());
        }
        Ok(self.domain_offsets_years.clone())
    }
}

/// Output of one run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub grid: TimeGrid,
    pub raw: SignalMatrix,
    /// Coupled and shocked
    pub coupled: SignalMatrix,
    pub ema_window: usize,
}

impl SimulationRun {
    /// Cross-domain mean of the coupled signal per month
    pub fn heartbeat(&self) -> Vec<f64> {
        self.coupled.row_means()
    }

    /// Heartbeat smoothed with the scarcity EMA window
    pub fn smoothed_heartbeat(&self) -> Vec<f64> {
        Ewma::smooth(self.ema_window, &self.heartbeat())
    }
}

/// Raw per-domain signals on a monthly grid
pub fn raw_signals(
    params: &ParameterSet,
    config: &SimulationConfig,
    grid: &TimeGrid,
) -> PendulumResult<SignalMatrix> {
    let domains = params.domains().to_vec();
    let offsets = config.offsets(domains.len())?;
    let oscillator = DomainOscillator::from_params(params);
    let sigma = if config.noise { params.noise_sigma } else { 0.0 };
    let mut noise = NoiseSource::new(params.seed, sigma);

    let columns = offsets
        .iter()
        .map(|offset| {
            grid.times()
                .iter()
                .map(|&month| {
                    let t = month / MONTHS_PER_YEAR + offset;
                    oscillator.value(t)
                        + config.secular_weight * params.secular_driver(month)
                        + noise.sample()
                })
                .collect()
        })
        .collect();

    SignalMatrix::from_columns(domains, columns)
}

/// Full replay: oscillate, couple, shock
pub fn simulate(params: &ParameterSet, config: &SimulationConfig) -> PendulumResult<SimulationRun> {
    params.validate()?;
    let grid = TimeGrid::monthly(config.months);

    let raw = raw_signals(params, config, &grid)?;
    let coupled = CouplingPropagator::from_params(params).propagate(&grid, &raw)?;
    let coupled = ShockInjector::new(config.shocks.clone()).apply_to_matrix(&grid, &coupled)?;

    info!(
        months = config.months,
        domains = params.domain_count(),
        lag = params.default_lag,
        shocks = config.shocks.len(),
        "simulation complete"
    );

    Ok(SimulationRun {
        grid,
        raw,
        coupled,
        ema_window: params.scarcity_ema_window,
    })
}

/// Single-oscillator theoretical trend on a fractional-year grid with one
/// unit-width shock of 0.3 starting at `shock_month / 12` years
pub fn generate_trends(
    oscillator: &DomainOscillator,
    length_months: f64,
    shock_month: f64,
) -> PendulumResult<(TimeGrid, Vec<f64>)> {
    let grid = TimeGrid::arange_years(0.0, length_months / MONTHS_PER_YEAR, TREND_STEP_YEARS);
    let signal = oscillator.sample(&grid);
    let shock = ShockWindow::at_month(shock_month, DEFAULT_SHOCK_MAGNITUDE, TimeUnit::Years);
    let shocked = ShockInjector::new(vec![shock]).apply(&grid, &signal)?;
    Ok((grid, shocked))
}
