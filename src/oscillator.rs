//! ═══════════════════════════════════════════════════════════════════════════════
//! OSCILLATOR - Single-Domain Order/Novelty Wave
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//!   base    = a1 · sin(t / T_base + φ1)
//!   youth   = a2 · sin(t / T_youth + φ2 + y·π)
//!   damping = exp(−k · |base|)
//!   value   = (base + β · youth) · damping
//!
//! t is in years. Youth shifts timing (phase), not size. Scarcity is a
//! negative feedback on the uncoupled base wave's own magnitude, so peaks
//! flatten while zero crossings pass through untouched.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::params::ParameterSet;
use crate::time::TimeGrid;

/// Divisor of the base wave, in years (period 2π·6 ≈ 37.7 years)
pub const BASE_DIVISOR_YEARS: f64 = 6.0;

/// Divisor of the youth wave, in years
pub const YOUTH_DIVISOR_YEARS: f64 = 2.0;

/// Pure single-domain oscillator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainOscillator {
    /// Base wave amplitude
    pub a1: f64,
    /// Youth wave amplitude
    pub a2: f64,
    /// Scarcity gain k (0 disables damping)
    pub scarcity: f64,
    /// Youth weight y, phase offset y·π
    pub youth: f64,
    /// Youth wave weight β (0 disables youth influence)
    pub beta: f64,
    pub base_divisor: f64,
    pub youth_divisor: f64,
    /// Extra (base, youth) phases in radians
    pub phases: [f64; 2],
}

/// Intermediate terms of one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorTerms {
    pub base: f64,
    pub youth: f64,
    pub damping: f64,
    pub value: f64,
}

impl DomainOscillator {
    pub fn new(a1: f64, a2: f64, scarcity: f64, youth: f64, beta: f64) -> Self {
        Self {
            a1,
            a2,
            scarcity,
            youth,
            beta,
            base_divisor: BASE_DIVISOR_YEARS,
            youth_divisor: YOUTH_DIVISOR_YEARS,
            phases: [0.0, 0.0],
        }
    }

    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            phases: params.phases,
            ..Self::new(
                params.amplitudes[0],
                params.amplitudes[1],
                params.scarcity_gain,
                params.youth_gain,
                params.coupling_strength,
            )
        }
    }

    pub fn base_wave(&self, t: f64) -> f64 {
        self.a1 * (t / self.base_divisor + self.phases[0]).sin()
    }

    pub fn youth_wave(&self, t: f64) -> f64 {
        self.a2 * (t / self.youth_divisor + self.phases[1] + self.youth * PI).sin()
    }

    /// Scarcity damping for a given base value; exactly 1 when k = 0 or base = 0
    pub fn damping_for(&self, base: f64) -> f64 {
        (-self.scarcity * base.abs()).exp()
    }

    pub fn terms(&self, t: f64) -> OscillatorTerms {
        let base = self.base_wave(t);
        let youth = self.youth_wave(t);
        let damping = self.damping_for(base);
        OscillatorTerms {
            base,
            youth,
            damping,
            value: (base + self.beta * youth) * damping,
        }
    }

    /// Oscillation value at t (years)
    pub fn value(&self, t: f64) -> f64 {
        self.terms(t).value
    }

    /// Evaluate over a grid; any spacing is fine
    pub fn sample(&self, grid: &TimeGrid) -> Vec<f64> {
        grid.years().into_iter().map(|t| self.value(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep() -> impl Iterator<Item = f64> {
        (0..400).map(|i| -20.0 + i as f64 * 0.1)
    }

    #[test]
    fn test_reduces_to_base_wave() {
        // k = 0 and y = 0: youth term weighted by β = 0 too
        let osc = DomainOscillator::new(0.7, 0.3, 0.0, 0.0, 0.0);
        for t in sweep() {
            assert_eq!(osc.value(t), 0.7 * (t / 6.0).sin());
        }
    }

    #[test]
    fn test_scarcity_strictly_damps_nonzero_base() {
        let gains = [0.0, 0.1, 0.35, 1.0, 3.0];
        for t in sweep() {
            let base = DomainOscillator::new(0.7, 0.3, 0.0, 0.6, 0.6).base_wave(t);
            let dampings: Vec<f64> = gains
                .iter()
                .map(|&k| DomainOscillator::new(0.7, 0.3, k, 0.6, 0.6).damping_for(base))
                .collect();
            if base.abs() > 1e-9 {
                for pair in dampings.windows(2) {
                    assert!(pair[1] < pair[0], "t={} dampings={:?}", t, dampings);
                }
            }
        }
    }

    #[test]
    fn test_damping_is_one_at_zero_base() {
        for k in [0.0, 0.35, 5.0] {
            let osc = DomainOscillator::new(0.7, 0.3, k, 0.6, 0.6);
            assert_eq!(osc.damping_for(0.0), 1.0);
            assert_eq!(osc.terms(0.0).damping, 1.0);
        }
    }

    #[test]
    fn test_zero_beta_disables_youth() {
        let with_youth = DomainOscillator::new(0.7, 0.3, 0.35, 0.6, 0.0);
        let without = DomainOscillator::new(0.7, 0.0, 0.35, 0.0, 0.0);
        for t in sweep() {
            assert_eq!(with_youth.value(t), without.value(t));
        }
    }

    #[test]
    fn test_youth_is_phase_not_amplitude() {
        let early = DomainOscillator::new(0.0, 0.3, 0.0, 0.0, 1.0);
        let shifted = DomainOscillator::new(0.0, 0.3, 0.0, 0.5, 1.0);
        let peak = |osc: &DomainOscillator| {
            sweep()
                .map(|t| osc.value(t).abs())
                .fold(0.0_f64, f64::max)
        };
        // Same envelope
        assert!((peak(&early) - peak(&shifted)).abs() < 1e-3);
        // Different timing: y = 0.5 turns sin into cos
        assert!((shifted.value(0.0) - 0.3).abs() < 1e-12);
        assert_eq!(early.value(0.0), 0.0);
    }

    #[test]
    fn test_reference_oscillator_shape() {
        let osc = DomainOscillator::new(0.7, 0.3, 0.0, 0.0, 0.6);
        assert_eq!(osc.value(0.0), 0.0);

        // Base term peaks at t = 3π; youth term is sin(3π/2) = -1 there
        let peak = osc.terms(3.0 * PI);
        assert!((peak.base - 0.7).abs() < 1e-12);
        assert!(peak.youth < 0.0);
        assert!(peak.value > 0.0 && peak.value < peak.base);

        // Rising quarter of the base wave is monotone
        let rising: Vec<f64> = (21..=30)
            .map(|i| osc.terms(i as f64 * 3.0 * PI / 30.0).base)
            .collect();
        assert!(rising.windows(2).all(|w| w[1] > w[0]));

        // Wherever |base| exceeds the youth envelope (β·a2), the sign follows base
        let envelope = 0.6 * 0.3;
        for i in 1..1200 {
            let t = i as f64 * 12.0 * PI / 1200.0;
            let terms = osc.terms(t);
            if terms.base.abs() > envelope + 1e-9 {
                assert_eq!(terms.value.signum(), terms.base.signum(), "t={}", t);
            }
        }

        // Falling half mirrors: negative base beyond 6π
        assert!(osc.terms(7.0 * PI).base < 0.0);
        assert!(osc.value(9.0 * PI) < 0.0);
    }

    #[test]
    fn test_scarcity_flattens_peaks_asymmetrically() {
        let free = DomainOscillator::new(0.7, 0.0, 0.0, 0.0, 0.0);
        let damped = DomainOscillator::new(0.7, 0.0, 0.35, 0.0, 0.0);
        let near_zero = 0.1;
        let at_peak = 3.0 * PI;
        let ratio_small = damped.value(near_zero) / free.value(near_zero);
        let ratio_peak = damped.value(at_peak) / free.value(at_peak);
        assert!(ratio_peak < ratio_small);
    }

    #[test]
    fn test_sample_uses_years() {
        let osc = DomainOscillator::new(0.7, 0.3, 0.35, 0.6, 0.6);
        let grid = TimeGrid::monthly(25);
        let samples = osc.sample(&grid);
        assert_eq!(samples.len(), 25);
        assert_eq!(samples[24], osc.value(2.0));
    }

    #[test]
    fn test_from_params() {
        let osc = DomainOscillator::from_params(&ParameterSet::default());
        assert_eq!(osc.a1, 0.7);
        assert_eq!(osc.a2, 0.3);
        assert_eq!(osc.scarcity, 0.35);
        assert_eq!(osc.youth, 0.6);
        assert_eq!(osc.beta, 0.6);
    }
}
