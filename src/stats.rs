//! ═══════════════════════════════════════════════════════════════════════════════
//! STATS - Numeric Primitives for Signal Processing
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Core tools shared by the oscillator, simulation and forecast layers:
//! - Total ordering for floats (NaN-safe sorting)
//! - Mean / population standard deviation / dot / norm
//! - EWMA (Exponentially Weighted Moving Average) for heartbeat smoothing
//! - Seeded Gaussian noise so simulation runs replay exactly
//! ═══════════════════════════════════════════════════════════════════════════════

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

// ═══════════════════════════════════════════════════════════════════════════════
// FLOAT ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Comparator for `sort_by` on f64. NaN compares equal to everything.
pub fn float_cmp(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUMMARY STATISTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Arithmetic mean (0.0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Dot product; callers check that lengths match
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

// ═══════════════════════════════════════════════════════════════════════════════
// EWMA - Exponentially Weighted Moving Average
// ═══════════════════════════════════════════════════════════════════════════════

/// Exponentially Weighted Moving Average
/// New value weighted by α, history by (1-α)
#[derive(Debug, Clone)]
pub struct Ewma {
    /// Smoothing factor (0 < α ≤ 1)
    alpha: f64,
    /// Current smoothed value
    value: f64,
    /// Whether initialized with at least one sample
    initialized: bool,
}

impl Ewma {
    /// Create new EWMA with specified alpha, clamped into (0, 1]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            value: 0.0,
            initialized: false,
        }
    }

    /// Create EWMA with specified effective window size
    /// α = 2/(N+1)
    pub fn with_window(window_size: usize) -> Self {
        Self::new(2.0 / (window_size as f64 + 1.0))
    }

    /// Update with new sample
    pub fn update(&mut self, sample: f64) -> f64 {
        if !self.initialized {
            self.value = sample;
            self.initialized = true;
        } else {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        }
        self.value
    }

    /// Current smoothed value
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooth a whole series, first sample passes through unchanged
    pub fn smooth(window_size: usize, series: &[f64]) -> Vec<f64> {
        let mut ewma = Self::with_window(window_size);
        series.iter().map(|&x| ewma.update(x)).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOISE - Seeded Gaussian source
// ═══════════════════════════════════════════════════════════════════════════════

/// Gaussian noise N(0, σ²) from a seeded generator (Box–Muller)
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: StdRng,
    sigma: f64,
    /// Second Box–Muller variate, kept for the next draw
    spare: Option<f64>,
}

impl NoiseSource {
    pub fn new(seed: u64, sigma: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sigma,
            spare: None,
        }
    }

    /// Next sample scaled by σ
    pub fn sample(&mut self) -> f64 {
        if self.sigma == 0.0 {
            return 0.0;
        }
        if let Some(z) = self.spare.take() {
            return z * self.sigma;
        }
        // u1 in (0, 1] so ln(u1) is finite
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(radius * theta.sin());
        radius * theta.cos() * self.sigma
    }

    /// Fill a fresh vector with `n` samples
    pub fn samples(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample()).collect()
    }
}
