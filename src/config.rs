//! ═══════════════════════════════════════════════════════════════════════════════
//! CONFIG - Layered Settings
//! ═══════════════════════════════════════════════════════════════════════════════
//! defaults < JSON file (`--config` or PENDULUM_CONFIG) < environment overrides
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analogy::AnalogyConfig;
use crate::error::{ConfigError, PendulumError, PendulumResult};
use crate::params::ParameterSet;
use crate::scenario::ForecastConfig;
use crate::simulation::SimulationConfig;

pub const CONFIG_PATH_VAR: &str = "PENDULUM_CONFIG";
pub const SEED_VAR: &str = "PENDULUM_SEED";
pub const LAG_VAR: &str = "PENDULUM_LAG";
pub const NOISE_SIGMA_VAR: &str = "PENDULUM_NOISE_SIGMA";

/// Everything a run reads. Any section may be omitted from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumConfig {
    pub params: ParameterSet,
    pub simulation: SimulationConfig,
    pub analogy: AnalogyConfig,
    pub forecast: ForecastConfig,
}

impl PendulumConfig {
    /// Load config from an explicit path, or PENDULUM_CONFIG, then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> PendulumResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));

        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON file; a named file that does not exist is an error
    pub fn from_file(path: &Path) -> PendulumResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: PendulumConfig = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn apply_env_with<F>(&mut self, lookup: F) -> PendulumResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(SEED_VAR) {
            self.params.seed = parse_var(SEED_VAR, &raw)?;
        }
        if let Some(raw) = lookup(LAG_VAR) {
            self.params.default_lag = parse_var(LAG_VAR, &raw)?;
        }
        if let Some(raw) = lookup(NOISE_SIGMA_VAR) {
            self.params.noise_sigma = parse_var(NOISE_SIGMA_VAR, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> PendulumResult<()> {
        self.params.validate()?;
        self.simulation.offsets(self.params.domain_count())?;
        self.analogy.validate()?;
        self.forecast.validate()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> PendulumResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, raw: &str) -> PendulumResult<T> {
    raw.trim().parse().map_err(|_| {
        PendulumError::from(ConfigError::InvalidValue {
            field: var.to_string(),
            message: format!("cannot parse '{}'", raw),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"params": {{"seed": 7, "default_lag": 12}}}}"#).unwrap();

        let config = PendulumConfig::from_file(file.path()).unwrap();
        assert_eq!(config.params.seed, 7);
        assert_eq!(config.params.default_lag, 12);
        assert_eq!(config.params.noise_sigma, 0.03);
        assert_eq!(config.analogy, AnalogyConfig::default());
        assert_eq!(config.simulation.months, 960);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"params": {{"seed": 7}}}}"#).unwrap();

        let mut config = PendulumConfig::from_file(file.path()).unwrap();
        config
            .apply_env_with(env(&[(SEED_VAR, "99"), (NOISE_SIGMA_VAR, " 0.0 ")]))
            .unwrap();
        assert_eq!(config.params.seed, 99);
        assert_eq!(config.params.noise_sigma, 0.0);
        assert_eq!(config.params.default_lag, 6);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = PendulumConfig::default();
        let result = config.apply_env_with(env(&[(LAG_VAR, "six")]));
        assert!(matches!(
            result,
            Err(PendulumError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = PendulumConfig::from_file(Path::new("/nonexistent/pendulum.json"));
        assert!(matches!(
            result,
            Err(PendulumError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pendulum.json");
        let mut config = PendulumConfig::default();
        config.forecast.default_horizon = 36.0;
        config.save(&path).unwrap();

        let loaded = PendulumConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.forecast.default_horizon, 36.0);
    }

    #[test]
    fn test_validate_rejects_bad_matrix() {
        let mut config = PendulumConfig::default();
        config.params.coupling.lagged.pop();
        assert!(matches!(
            config.validate(),
            Err(PendulumError::DimensionMismatch(_))
        ));
    }
}
