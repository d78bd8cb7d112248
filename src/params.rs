//! ═══════════════════════════════════════════════════════════════════════════════
//! PARAMS - Immutable Constants of the Order/Novelty Pendulum
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! A `ParameterSet` is built once (defaults, JSON file, env overrides) and then
//! only ever read. The coupling prior is an explicit structure: a named domain
//! list plus two square matrices, so alternative coupling hypotheses can be
//! swapped in without touching the propagator.
//!
//! Matrix convention: row i holds the influence of every domain j on domain i.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConfigError, DimensionError, PendulumResult};

/// Reference domains, in matrix order
pub const DEFAULT_DOMAINS: [&str; 5] = ["fashion", "music", "tech", "politics", "economics"];

// ═══════════════════════════════════════════════════════════════════════════════
// PERIODS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cycle lengths in months
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Periods {
    /// ~16-year primary Order/Novelty swing
    pub primary: f64,
    /// 10-year resonance
    pub resonance: f64,
    /// 88-year generational macro cycle
    pub macro_cycle: f64,
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            primary: 192.0,
            resonance: 120.0,
            macro_cycle: 1056.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COUPLING MATRICES
// ═══════════════════════════════════════════════════════════════════════════════

/// Structural coupling prior: domains plus instantaneous and lagged D×D weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingMatrices {
    pub domains: Vec<String>,
    /// A[i][j] = same-month influence of domain j on domain i
    pub instantaneous: Vec<Vec<f64>>,
    /// A_lag[i][j] = influence of domain j, `lag` months ago, on domain i
    pub lagged: Vec<Vec<f64>>,
}

impl CouplingMatrices {
    /// Build and validate
    pub fn new(
        domains: Vec<String>,
        instantaneous: Vec<Vec<f64>>,
        lagged: Vec<Vec<f64>>,
    ) -> PendulumResult<Self> {
        let matrices = Self {
            domains,
            instantaneous,
            lagged,
        };
        matrices.validate()?;
        Ok(matrices)
    }

    /// All-zero coupling over the given domains (identity propagation)
    pub fn uncoupled(domains: Vec<String>) -> Self {
        let d = domains.len();
        Self {
            domains,
            instantaneous: vec![vec![0.0; d]; d],
            lagged: vec![vec![0.0; d]; d],
        }
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Position of a domain in matrix order
    pub fn domain_index(&self, name: &str) -> Option<usize> {
        self.domains.iter().position(|d| d == name)
    }

    /// Both matrices must be D×D where D = number of domains
    pub fn validate(&self) -> PendulumResult<()> {
        let d = self.domains.len();
        if d == 0 {
            return Err(ConfigError::InvalidValue {
                field: "coupling.domains".to_string(),
                message: "at least one domain is required".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for name in &self.domains {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "coupling.domains".to_string(),
                    message: format!("duplicate domain '{}'", name),
                }
                .into());
            }
        }

        for (label, matrix) in [
            ("instantaneous", &self.instantaneous),
            ("lagged", &self.lagged),
        ] {
            if matrix.len() != d {
                let what = format!("{} coupling rows", label);
                return Err(DimensionError::new(what, d, matrix.len()).into());
            }
            for (i, row) in matrix.iter().enumerate() {
                if row.len() != d {
                    return Err(DimensionError::new(
                        format!("{} coupling row {} columns", label, i),
                        d,
                        row.len(),
                    )
                    .into());
                }
                if row.iter().any(|w| !w.is_finite()) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("coupling.{}[{}]", label, i),
                        message: "weights must be finite".to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

impl Default for CouplingMatrices {
    fn default() -> Self {
        Self {
            domains: DEFAULT_DOMAINS.iter().map(|s| s.to_string()).collect(),
            instantaneous: vec![
                vec![0.40, 0.06, 0.08, 0.00, 0.00],  // fashion <= music, tech
                vec![0.05, 0.40, 0.05, 0.00, 0.00],  // music <= fashion, tech
                vec![0.03, 0.05, 0.45, 0.00, 0.00],  // tech <= fashion, music
                vec![0.00, 0.00, 0.07, 0.45, 0.12],  // politics <= tech, econ
                vec![0.00, 0.00, 0.08, -0.04, 0.45], // econ <= tech, -politics
            ],
            lagged: vec![
                vec![0.00, 0.08, 0.07, -0.05, 0.00],
                vec![0.00, 0.00, 0.03, 0.00, 0.00],
                vec![0.00, 0.00, 0.00, 0.00, 0.00],
                vec![0.00, 0.00, 0.06, 0.00, 0.00],
                vec![0.00, 0.00, 0.04, 0.03, 0.00],
            ],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARAMETER SET
// ═══════════════════════════════════════════════════════════════════════════════

/// Every constant the engine reads. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub periods: Periods,

    /// (base wave, youth wave) amplitudes
    pub amplitudes: [f64; 2],

    /// (base wave, youth wave) phases in radians
    pub phases: [f64; 2],

    /// Amplitude of the macro-cycle component of the secular driver
    pub macro_amplitude: f64,
    pub macro_phase: f64,

    /// EWMA window (months) used when smoothing the cultural heartbeat
    pub scarcity_ema_window: usize,

    /// k: need-for-opposite damping gain
    pub scarcity_gain: f64,

    /// y: youth influence, applied as a phase shift of y·π
    pub youth_gain: f64,

    /// β: weight of the youth wave in the oscillator
    pub coupling_strength: f64,

    /// L: lag of the lagged coupling matrix, in months
    pub default_lag: usize,

    /// σ of additive Gaussian noise (0 disables)
    pub noise_sigma: f64,

    pub seed: u64,

    pub coupling: CouplingMatrices,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            periods: Periods::default(),
            amplitudes: [0.7, 0.3],
            phases: [0.0, 0.0],
            macro_amplitude: 0.25,
            macro_phase: 0.0,
            scarcity_ema_window: 24,
            scarcity_gain: 0.35,
            youth_gain: 0.6,
            coupling_strength: 0.6,
            default_lag: 6,
            noise_sigma: 0.03,
            seed: 42,
            coupling: CouplingMatrices::default(),
        }
    }
}

impl ParameterSet {
    pub fn domains(&self) -> &[String] {
        &self.coupling.domains
    }

    pub fn domain_count(&self) -> usize {
        self.coupling.domain_count()
    }

    /// Secular driver at month m: primary + resonance + macro sinusoids
    pub fn secular_driver(&self, month: f64) -> f64 {
        use std::f64::consts::TAU;
        let wave = |period: f64, phase: f64| (TAU * month / period + phase).sin();
        self.amplitudes[0] * wave(self.periods.primary, self.phases[0])
            + self.amplitudes[1] * wave(self.periods.resonance, self.phases[1])
            + self.macro_amplitude * wave(self.periods.macro_cycle, self.macro_phase)
    }

    /// Structural and numeric checks; run once after loading
    pub fn validate(&self) -> PendulumResult<()> {
        self.coupling.validate()?;

        let positive = [
            ("periods.primary", self.periods.primary),
            ("periods.resonance", self.periods.resonance),
            ("periods.macro_cycle", self.periods.macro_cycle),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be a positive number"));
            }
        }

        let finite = [
            ("amplitudes[0]", self.amplitudes[0]),
            ("amplitudes[1]", self.amplitudes[1]),
            ("phases[0]", self.phases[0]),
            ("phases[1]", self.phases[1]),
            ("macro_amplitude", self.macro_amplitude),
            ("macro_phase", self.macro_phase),
            ("scarcity_gain", self.scarcity_gain),
            ("youth_gain", self.youth_gain),
            ("coupling_strength", self.coupling_strength),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }

        if !(self.noise_sigma.is_finite() && self.noise_sigma >= 0.0) {
            return Err(invalid("noise_sigma", "must be finite and non-negative"));
        }
        if self.scarcity_ema_window == 0 {
            return Err(invalid("scarcity_ema_window", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> crate::error::PendulumError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PendulumError;

    #[test]
    fn test_defaults_are_valid() {
        let params = ParameterSet::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.domain_count(), 5);
        assert_eq!(params.coupling.domain_index("tech"), Some(2));
        assert_eq!(params.default_lag, 6);
    }

    #[test]
    fn test_ragged_matrix_is_dimension_mismatch() {
        let mut coupling = CouplingMatrices::default();
        coupling.lagged[3].pop();
        let err = coupling.validate().unwrap_err();
        assert!(matches!(
            err,
            PendulumError::DimensionMismatch(ref e) if e.expected == 5 && e.actual == 4
        ));
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut coupling = CouplingMatrices::default();
        coupling.instantaneous.push(vec![0.0; 5]);
        assert!(matches!(
            coupling.validate(),
            Err(PendulumError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_duplicate_domains_rejected() {
        let result = CouplingMatrices::new(
            vec!["music".into(), "music".into()],
            vec![vec![0.0; 2]; 2],
            vec![vec![0.0; 2]; 2],
        );
        assert!(matches!(result, Err(PendulumError::Config(_))));
    }

    #[test]
    fn test_negative_noise_rejected() {
        let params = ParameterSet {
            noise_sigma: -0.1,
            ..ParameterSet::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params: ParameterSet =
            serde_json::from_str(r#"{ "scarcity_gain": 0.0, "default_lag": 12 }"#).unwrap();
        assert_eq!(params.scarcity_gain, 0.0);
        assert_eq!(params.default_lag, 12);
        assert_eq!(params.amplitudes, [0.7, 0.3]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_secular_driver_starts_at_zero() {
        let params = ParameterSet::default();
        assert!(params.secular_driver(0.0).abs() < 1e-12);
        // Quarter of the primary period: primary term at its peak
        let quarter = params.periods.primary / 4.0;
        assert!(params.secular_driver(quarter) > 0.5);
    }
}
