//! ═══════════════════════════════════════════════════════════════════════════════
//! SCENARIO - Keyword Nudges → Forecast Curve
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! 1. Nudge: an ordered rule table; each rule fires on substring membership in
//!    the lower-cased scenario text. Rules run in table order, so a later rule
//!    overwrites an earlier one on shared fields.
//! 2. Amplitude: amp = f[yt_views] − f[order_kw_density]
//! 3. Signal:  s(t) = w1·sin(2πt/P) + w2·sin(4πt/P) + amp·exp(−t/horizon)
//! 4. Blend:   forecast(t) = regressor(f) + 0.5·s(t)
//!
//! The regressor sees the same adjusted vector at every step; all time
//! variation comes from s(t).
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::{debug, info};

use crate::error::{ConfigError, PendulumResult};
use crate::features::FeatureVector;
use crate::regressor::{AxisLabel, AxisReading, AxisRegressor};
use crate::stats;
use crate::time::{TimeGrid, TimeUnit};

pub const MARKET_RETURN: &str = "sp500_ret";
pub const YOUTH_PROXY: &str = "youth_proxy";
pub const ENGAGEMENT: &str = "yt_views";
pub const ORDER_DENSITY: &str = "order_kw_density";
pub const NOVELTY_DENSITY: &str = "novelty_kw_density";

/// Curves with population σ below this read as "steady"
pub const STEADY_VOLATILITY: f64 = 0.3;

// ═══════════════════════════════════════════════════════════════════════════════
// NUDGE RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// One (predicate, effect) entry of the nudge table
#[derive(Clone, Copy)]
pub struct NudgeRule {
    pub name: &'static str,
    /// Fires if any keyword is a substring of the lower-cased text
    pub keywords: &'static [&'static str],
    pub effect: fn(&mut FeatureVector) -> PendulumResult<()>,
}

impl NudgeRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

impl fmt::Debug for NudgeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NudgeRule")
            .field("name", &self.name)
            .field("keywords", &self.keywords)
            .finish()
    }
}

/// Overwrite a field that must already exist
fn overwrite(f: &mut FeatureVector, name: &str, value: f64) -> PendulumResult<()> {
    f.require(name)?;
    f.set(name, value);
    Ok(())
}

/// Economic stress lifts market return by 0.3, capped at 1.0, never lowering it
fn economic_stress(f: &mut FeatureVector) -> PendulumResult<()> {
    let current = f.require(MARKET_RETURN)?;
    f.set(MARKET_RETURN, (current + 0.3).min(1.0).max(current));
    Ok(())
}

fn youth_surge(f: &mut FeatureVector) -> PendulumResult<()> {
    overwrite(f, YOUTH_PROXY, 0.8)
}

fn innovation_push(f: &mut FeatureVector) -> PendulumResult<()> {
    overwrite(f, ENGAGEMENT, 0.8)
}

fn nostalgia_pull(f: &mut FeatureVector) -> PendulumResult<()> {
    overwrite(f, ORDER_DENSITY, 0.8)?;
    overwrite(f, NOVELTY_DENSITY, -0.3)
}

/// Reference rule table, in evaluation order
pub fn default_rules() -> Vec<NudgeRule> {
    vec![
        NudgeRule {
            name: "economic_stress",
            keywords: &["crisis", "recession", "inflation", "scarcity"],
            effect: economic_stress,
        },
        NudgeRule {
            name: "youth_surge",
            keywords: &["youth", "gen z", "trend", "viral"],
            effect: youth_surge,
        },
        NudgeRule {
            name: "innovation_push",
            keywords: &["innovation", "ai", "tech", "future", "digital"],
            effect: innovation_push,
        },
        NudgeRule {
            name: "nostalgia_pull",
            keywords: &["nostalgia", "tradition", "vintage"],
            effect: nostalgia_pull,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Samples over [0, horizon]
    pub resolution: usize,
    /// P in months
    pub period: f64,
    /// (w1, w2)
    pub harmonic_weights: [f64; 2],
    /// Weight of s(t) added to the regressor output
    pub signal_blend: f64,
    pub default_horizon: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            period: 24.0,
            harmonic_weights: [0.5, 0.3],
            signal_blend: 0.5,
            default_horizon: 60.0,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> PendulumResult<()> {
        if self.resolution < 2 {
            return Err(invalid("forecast.resolution", "at least 2 samples are required"));
        }
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(invalid("forecast.period", "must be a positive number"));
        }
        if !(self.default_horizon.is_finite() && self.default_horizon > 0.0) {
            return Err(invalid("forecast.default_horizon", "must be a positive number"));
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

// ═══════════════════════════════════════════════════════════════════════════════
// FORECASTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Forecast curve plus what produced it
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub grid: TimeGrid,
    /// regressor + blend·signal, one per grid point
    pub values: Vec<f64>,
    pub signal: Vec<f64>,
    pub amplitude: f64,
    pub adjusted: FeatureVector,
    pub fired_rules: Vec<String>,
    /// Reading of the constant regressor output
    pub reading: AxisReading,
}

impl Forecast {
    pub fn narrate(&self) -> String {
        describe_forecast(&self.values, self.reading.label)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioForecaster {
    config: ForecastConfig,
    rules: Vec<NudgeRule>,
}

impl Default for ScenarioForecaster {
    fn default() -> Self {
        Self {
            config: ForecastConfig::default(),
            rules: default_rules(),
        }
    }
}

impl ScenarioForecaster {
    pub fn new(config: ForecastConfig) -> PendulumResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rules: default_rules(),
        })
    }

    /// Replace the rule table (order is precedence)
    pub fn with_rules(mut self, rules: Vec<NudgeRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn rules(&self) -> &[NudgeRule] {
        &self.rules
    }

    /// Copy of `base` with every matching rule applied in table order
    pub fn apply_nudges(
        &self,
        base: &FeatureVector,
        scenario: &str,
    ) -> PendulumResult<(FeatureVector, Vec<String>)> {
        let lowered = scenario.to_lowercase();
        let mut adjusted = base.clone();
        let mut fired = Vec::new();
        for rule in &self.rules {
            if rule.matches(&lowered) {
                (rule.effect)(&mut adjusted)?;
                fired.push(rule.name.to_string());
            }
        }
        debug!(?fired, "scenario nudges applied");
        Ok((adjusted, fired))
    }

    /// amp = engagement − order density
    pub fn amplitude(features: &FeatureVector) -> PendulumResult<f64> {
        Ok(features.require(ENGAGEMENT)? - features.require(ORDER_DENSITY)?)
    }

    /// s(t) for one month offset
    pub fn signal_at(&self, t: f64, amplitude: f64, horizon: f64) -> f64 {
        let [w1, w2] = self.config.harmonic_weights;
        let p = self.config.period;
        w1 * (2.0 * PI * t / p).sin()
            + w2 * (4.0 * PI * t / p).sin()
            + amplitude * (-t / horizon).exp()
    }

    pub fn forecast<R: AxisRegressor + ?Sized>(
        &self,
        base: &FeatureVector,
        scenario: &str,
        horizon_months: f64,
        regressor: &R,
    ) -> PendulumResult<Forecast> {
        if !(horizon_months.is_finite() && horizon_months > 0.0) {
            return Err(invalid("horizon", "must be a positive number of months"));
        }

        let (adjusted, fired_rules) = self.apply_nudges(base, scenario)?;
        let amplitude = Self::amplitude(&adjusted)?;
        let row = adjusted.project(regressor.feature_names())?;

        let resolution = self.config.resolution;
        let grid = TimeGrid::linspace(TimeUnit::Months, 0.0, horizon_months, resolution);
        let mut signal = Vec::with_capacity(grid.len());
        let mut values = Vec::with_capacity(grid.len());
        let mut constant = 0.0;
        for (k, &t) in grid.times().iter().enumerate() {
            // Same row every step
            let predicted = regressor.predict(&row)?;
            if k == 0 {
                constant = predicted;
            }
            let s = self.signal_at(t, amplitude, horizon_months);
            signal.push(s);
            values.push(predicted + self.config.signal_blend * s);
        }

        let reading = AxisReading::from_prediction(constant);
        info!(
            horizon = horizon_months,
            samples = values.len(),
            amplitude,
            label = %reading.label,
            "scenario forecast built"
        );

        Ok(Forecast {
            grid,
            values,
            signal,
            amplitude,
            adjusted,
            fired_rules,
            reading,
        })
    }
}

/// Neutral starting vector over the reference axis schema
pub fn reference_base() -> FeatureVector {
    FeatureVector::from_pairs([
        ("gt_search", 0.4),
        ("yt_views", 0.5),
        ("sp500_ret", 0.5),
        ("cpi_surprise", 0.5),
        ("unemp_rate", 0.5),
        ("youth_proxy", 0.3_f64.sin()),
        ("shock_signed", 0.5_f64.cos()),
        ("novelty_kw_density", 0.0),
        ("order_kw_density", 0.0),
    ])
}

// ═══════════════════════════════════════════════════════════════════════════════
// THEMES & NARRATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioTheme {
    Beauty,
    Fashion,
    Technology,
    Music,
    Economy,
}

impl ScenarioTheme {
    pub fn all() -> &'static [ScenarioTheme] {
        &[
            ScenarioTheme::Beauty,
            ScenarioTheme::Fashion,
            ScenarioTheme::Technology,
            ScenarioTheme::Music,
            ScenarioTheme::Economy,
        ]
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ScenarioTheme::Beauty => &["makeup", "beauty"],
            ScenarioTheme::Fashion => &["fashion", "style"],
            ScenarioTheme::Technology => &["tech", "ai"],
            ScenarioTheme::Music => &["music"],
            ScenarioTheme::Economy => &["economy", "recession", "inflation"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioTheme::Beauty => "Makeup & Beauty trends",
            ScenarioTheme::Fashion => "Fashion cycles",
            ScenarioTheme::Technology => "Technology evolution",
            ScenarioTheme::Music => "Music culture",
            ScenarioTheme::Economy => "Economic influence",
        }
    }
}

/// Themes mentioned in the text, in fixed order
pub fn detect_themes(scenario: &str) -> Vec<ScenarioTheme> {
    let lowered = scenario.to_lowercase();
    ScenarioTheme::all()
        .iter()
        .copied()
        .filter(|theme| theme.keywords().iter().any(|k| lowered.contains(k)))
        .collect()
}

pub fn describe_themes(scenario: &str) -> String {
    let themes = detect_themes(scenario);
    if themes.is_empty() {
        return "General cultural and social dynamics".to_string();
    }
    themes.iter().map(|t| t.label()).collect::<Vec<_>>().join(", ")
}

/// One-sentence reading of a curve
pub fn describe_forecast(values: &[f64], label: AxisLabel) -> String {
    let direction = match label {
        AxisLabel::Novelty => "upward (toward creativity and experimentation)",
        AxisLabel::Order => "downward (toward tradition and structure)",
    };
    let volatility = if stats::std_dev(values) < STEADY_VOLATILITY {
        "steady"
    } else {
        "highly dynamic"
    };
    format!(
        "The curve shows a {} movement leaning {}, \
         suggesting that society is entering a {}-dominated phase.",
        volatility, direction, label
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PendulumError;
    use crate::regressor::LinearAxisModel;

    #[test]
    fn test_recession_raises_market_return() {
        let forecaster = ScenarioForecaster::default();
        for start in [-1.0, 0.0, 0.5, 0.8, 1.0, 1.4] {
            let mut base = reference_base();
            base.set(MARKET_RETURN, start);
            let (adjusted, fired) = forecaster
                .apply_nudges(&base, "A deep RECESSION hits")
                .unwrap();
            let after = adjusted.get(MARKET_RETURN).unwrap();
            assert!(after >= start, "start={} after={}", start, after);
            assert!(after <= 1.0_f64.max(start));
            assert_eq!(fired, vec!["economic_stress"]);
        }
        let mut base = reference_base();
        base.set(MARKET_RETURN, 0.5);
        let (adjusted, _) = forecaster.apply_nudges(&base, "recession").unwrap();
        assert!((adjusted.get(MARKET_RETURN).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_rules_fire_independently_in_order() {
        let forecaster = ScenarioForecaster::default();
        let (adjusted, fired) = forecaster
            .apply_nudges(&reference_base(), "Viral nostalgia meets digital tradition")
            .unwrap();
        assert_eq!(fired, vec!["youth_surge", "innovation_push", "nostalgia_pull"]);
        assert_eq!(adjusted.get(YOUTH_PROXY), Some(0.8));
        assert_eq!(adjusted.get(ENGAGEMENT), Some(0.8));
        assert_eq!(adjusted.get(ORDER_DENSITY), Some(0.8));
        assert_eq!(adjusted.get(NOVELTY_DENSITY), Some(-0.3));
    }

    #[test]
    fn test_later_rule_wins_on_shared_field() {
        fn low(f: &mut FeatureVector) -> PendulumResult<()> {
            f.set(ENGAGEMENT, 0.1);
            Ok(())
        }
        fn high(f: &mut FeatureVector) -> PendulumResult<()> {
            f.set(ENGAGEMENT, 0.9);
            Ok(())
        }
        let rules = vec![
            NudgeRule { name: "low", keywords: &["x"], effect: low },
            NudgeRule { name: "high", keywords: &["x"], effect: high },
        ];
        let forecaster = ScenarioForecaster::default().with_rules(rules);
        let (adjusted, _) = forecaster.apply_nudges(&reference_base(), "x").unwrap();
        assert_eq!(adjusted.get(ENGAGEMENT), Some(0.9));
    }

    #[test]
    fn test_no_keywords_leaves_vector_untouched() {
        let forecaster = ScenarioForecaster::default();
        let base = reference_base();
        let (adjusted, fired) = forecaster.apply_nudges(&base, "quiet week").unwrap();
        assert_eq!(adjusted, base);
        assert!(fired.is_empty());
    }

    #[test]
    fn test_missing_key_fails() {
        let forecaster = ScenarioForecaster::default();
        let base = FeatureVector::from_pairs([("yt_views", 0.5)]);
        let err = forecaster.apply_nudges(&base, "inflation").unwrap_err();
        assert!(matches!(err, PendulumError::MissingFeature(ref n) if n == MARKET_RETURN));
        assert!(ScenarioForecaster::amplitude(&base).is_err());
    }

    #[test]
    fn test_forecast_blends_constant_regressor() {
        let forecaster = ScenarioForecaster::default();
        let model = LinearAxisModel::constant(0.25);
        let f = forecaster
            .forecast(&reference_base(), "new tech future", 60.0, &model)
            .unwrap();

        assert_eq!(f.values.len(), 200);
        assert_eq!(f.grid.times()[0], 0.0);
        assert!((f.grid.times()[199] - 60.0).abs() < 1e-9);
        // amp = 0.8 - 0.0, s(0) = amp
        assert!((f.amplitude - 0.8).abs() < 1e-12);
        assert!((f.signal[0] - 0.8).abs() < 1e-12);
        for (v, s) in f.values.iter().zip(&f.signal) {
            assert!((v - (0.25 + 0.5 * s)).abs() < 1e-12);
        }
        assert_eq!(f.reading.label, AxisLabel::Novelty);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let forecaster = ScenarioForecaster::default();
        let model = LinearAxisModel::constant(-0.1);
        let a = forecaster.forecast(&reference_base(), "vintage crisis", 36.0, &model).unwrap();
        let b = forecaster.forecast(&reference_base(), "vintage crisis", 36.0, &model).unwrap();
        assert_eq!(a.values, b.values);
        assert_eq!(a.fired_rules, b.fired_rules);
    }

    #[test]
    fn test_signal_decay() {
        let forecaster = ScenarioForecaster::default();
        // Full periods: harmonic terms vanish, leaving amp·e^{-t/h}
        let s = forecaster.signal_at(24.0, 1.0, 24.0);
        assert!((s - (-1.0_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_bad_horizon_rejected() {
        let forecaster = ScenarioForecaster::default();
        let model = LinearAxisModel::constant(0.0);
        assert!(forecaster.forecast(&reference_base(), "", 0.0, &model).is_err());
        assert!(forecaster.forecast(&reference_base(), "", -5.0, &model).is_err());
    }

    #[test]
    fn test_themes() {
        assert_eq!(
            detect_themes("Fashion and MUSIC in a recession"),
            vec![ScenarioTheme::Fashion, ScenarioTheme::Music, ScenarioTheme::Economy]
        );
        assert_eq!(describe_themes("weather"), "General cultural and social dynamics");
        assert_eq!(describe_themes("makeup"), "Makeup & Beauty trends");
    }

    #[test]
    fn test_describe_forecast() {
        let flat = vec![0.1; 50];
        let text = describe_forecast(&flat, AxisLabel::Order);
        assert!(text.contains("steady"));
        assert!(text.contains("Order-dominated"));

        let wild: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(describe_forecast(&wild, AxisLabel::Novelty).contains("highly dynamic"));
    }
}
