//! ═══════════════════════════════════════════════════════════════════════════════
//! FEATURES - Named Numeric Driver Inputs
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Feature vectors are keyed by name. Downstream consumers project them onto
//! an ordered schema (the regressor's, or the analogy subset); a missing key
//! or a non-numeric value fails that call instead of being coerced.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PendulumError, PendulumResult};

/// Input schema of the reference axis regressor, in order
pub const AXIS_FEATURES: [&str; 9] = [
    "gt_search",
    "yt_views",
    "sp500_ret",
    "cpi_surprise",
    "unemp_rate",
    "youth_proxy",
    "shock_signed",
    "novelty_kw_density",
    "order_kw_density",
];

/// Subset compared by the historical analogy scorer, in order
pub const ANALOGY_FEATURES: [&str; 5] = [
    "gt_search",
    "tiktok_views",
    "youth_proxy",
    "novelty_kw_density",
    "order_kw_density",
];

/// Owned copy of a schema constant
pub fn schema(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURE VALUE - raw cell from the ingestion collaborator
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Null,
}

impl FeatureValue {
    /// Numeric value or a type-mismatch error naming the feature
    pub fn as_number(&self, feature: &str) -> PendulumResult<f64> {
        match self {
            FeatureValue::Number(v) if v.is_finite() => Ok(*v),
            other => Err(PendulumError::TypeMismatch {
                feature: feature.to_string(),
                found: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "number {}", v),
            FeatureValue::Flag(b) => write!(f, "bool {}", b),
            FeatureValue::Text(s) => write!(f, "text {:?}", s),
            FeatureValue::Null => write!(f, "null"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURE VECTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Name → scalar mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value or a missing-feature error
    pub fn require(&self, name: &str) -> PendulumResult<f64> {
        self.get(name)
            .ok_or_else(|| PendulumError::MissingFeature(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Values in the order of `names`; every name must be present
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> PendulumResult<Vec<f64>> {
        names.iter().map(|n| self.require(n.as_ref())).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURE RECORD - one row of the per-entity table
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Entity (trend/domain) identifier; histories never mix across entities
    pub entity_id: String,
    /// Chronological position within the entity's own series
    pub ordinal: i64,
    pub features: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    pub fn new(entity_id: impl Into<String>, ordinal: i64) -> Self {
        Self {
            entity_id: entity_id.into(),
            ordinal,
            features: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.features.insert(name.to_string(), FeatureValue::Number(value));
        self
    }

    pub fn with_value(mut self, name: &str, value: FeatureValue) -> Self {
        self.features.insert(name.to_string(), value);
        self
    }

    /// Numeric tuple over `names`, in order
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> PendulumResult<Vec<f64>> {
        names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                self.features
                    .get(name)
                    .ok_or_else(|| PendulumError::MissingFeature(name.to_string()))?
                    .as_number(name)
            })
            .collect()
    }
}
