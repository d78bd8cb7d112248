//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR - Unified Error Type for Pendulum
//! ═══════════════════════════════════════════════════════════════════════════════
//! Fatal conditions only: dimension mismatches, missing or non-numeric features,
//! bad configuration. Short history and null vectors are not errors.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::fmt;

/// The unified error type for the Pendulum crate
#[derive(Debug)]
pub enum PendulumError {
    /// I/O error (config and model files)
    Io(std::io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Matrix or signal shape disagrees with the domain count
    DimensionMismatch(DimensionError),
    /// A required named feature is absent
    MissingFeature(String),
    /// A feature value is present but not numeric
    TypeMismatch { feature: String, found: String },
    /// Lag/coupling requested on a grid that is not evenly spaced in months
    IrregularGrid { index: usize, spacing: f64 },
    /// Configuration error
    Config(ConfigError),
}

impl std::error::Error for PendulumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PendulumError::Io(e) => Some(e),
            PendulumError::Json(e) => Some(e),
            PendulumError::DimensionMismatch(e) => Some(e),
            PendulumError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PendulumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendulumError::Io(e) => write!(f, "I/O error: {}", e),
            PendulumError::Json(e) => write!(f, "JSON error: {}", e),
            PendulumError::DimensionMismatch(e) => write!(f, "Dimension mismatch: {}", e),
            PendulumError::MissingFeature(name) => write!(f, "Missing feature: {}", name),
            PendulumError::TypeMismatch { feature, found } => {
                write!(f, "Feature '{}' is not numeric (found {})", feature, found)
            }
            PendulumError::IrregularGrid { index, spacing } => write!(
                f,
                "Time grid is not evenly spaced monthly: step {} has spacing {}",
                index, spacing
            ),
            PendulumError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl From<std::io::Error> for PendulumError {
    fn from(err: std::io::Error) -> Self {
        PendulumError::Io(err)
    }
}

impl From<serde_json::Error> for PendulumError {
    fn from(err: serde_json::Error) -> Self {
        PendulumError::Json(err)
    }
}

/// Shape disagreement between a matrix/signal and the configured domains
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionError {
    /// What was being checked (e.g. "instantaneous coupling rows")
    pub what: String,
    pub expected: usize,
    pub actual: usize,
}

impl DimensionError {
    pub fn new(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            what: what.into(),
            expected,
            actual,
        }
    }
}

impl fmt::Display for DimensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.what, self.expected, self.actual
        )
    }
}

impl std::error::Error for DimensionError {}

impl From<DimensionError> for PendulumError {
    fn from(err: DimensionError) -> Self {
        PendulumError::DimensionMismatch(err)
    }
}

/// Configuration-specific errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Invalid value
    InvalidValue { field: String, message: String },
    /// File not found
    FileNotFound(String),
    /// Feature names owned here disagree with the regressor's input schema
    SchemaMismatch { expected: Vec<String>, actual: Vec<String> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::SchemaMismatch { expected, actual } => write!(
                f,
                "Regressor schema mismatch: expected [{}], got [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for PendulumError {
    fn from(err: ConfigError) -> Self {
        PendulumError::Config(err)
    }
}

/// Type alias for Result with PendulumError
pub type PendulumResult<T> = Result<T, PendulumError>;
