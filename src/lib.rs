//! ═══════════════════════════════════════════════════════════════════════════════
//! PENDULUM - Order/Novelty Cultural Oscillation Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//! Damped domain waves, feed-forward coupling, shocks, historical analogies and
//! scenario forecasts. Pure computation; every run is deterministic in its seed.
//! ═══════════════════════════════════════════════════════════════════════════════

#![allow(clippy::excessive_precision)] // Reference coupling weights are kept verbatim
#![allow(clippy::needless_range_loop)] // Indexed loops clearer for matrix math
#![allow(clippy::doc_lazy_continuation)]

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION MODULES - errors, parameters, time, statistics
// ═══════════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod params;
pub mod stats;
pub mod time;

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMICS - oscillator, shocks, coupling, full replay
// ═══════════════════════════════════════════════════════════════════════════════

pub mod coupling;
pub mod oscillator;
pub mod shock;
pub mod simulation;

// ═══════════════════════════════════════════════════════════════════════════════
// INFERENCE - features, analogies, axis regressor, scenarios
// ═══════════════════════════════════════════════════════════════════════════════

pub mod analogy;
pub mod features;
pub mod regressor;
pub mod scenario;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use error::{ConfigError, DimensionError, PendulumError, PendulumResult};

pub use config::PendulumConfig;
pub use params::{CouplingMatrices, ParameterSet, Periods, DEFAULT_DOMAINS};
pub use stats::{float_cmp, Ewma, NoiseSource};
pub use time::{TimeGrid, TimePoint, TimeUnit, MONTHS_PER_YEAR};

pub use coupling::{CouplingPropagator, SelfTerm, SignalMatrix};
pub use oscillator::{DomainOscillator, OscillatorTerms};
pub use shock::{ShockInjector, ShockWindow, DEFAULT_SHOCK_MAGNITUDE};
pub use simulation::{generate_trends, simulate, SimulationConfig, SimulationRun};

pub use analogy::{
    cosine_similarity, AnalogyConfig, AnalogyScore, HistoricalAnalogyScorer, LagSimilarity,
};
pub use features::{FeatureRecord, FeatureValue, FeatureVector, ANALOGY_FEATURES, AXIS_FEATURES};
pub use regressor::{read_axis, AxisLabel, AxisReading, AxisRegressor, LinearAxisModel};
pub use scenario::{
    default_rules, describe_forecast, describe_themes, detect_themes, reference_base, Forecast,
    ForecastConfig, NudgeRule, ScenarioForecaster, ScenarioTheme,
};
