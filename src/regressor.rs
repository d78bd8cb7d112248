//! ═══════════════════════════════════════════════════════════════════════════════
//! REGRESSOR - Feature Vector → Axis Position
//! ═══════════════════════════════════════════════════════════════════════════════
//! Training lives elsewhere. The engine only needs something that takes an
//! ordered numeric vector and returns a scalar on the Order(−)/Novelty(+) axis.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{ConfigError, DimensionError, PendulumResult};
use crate::features::{schema, FeatureVector, AXIS_FEATURES};

/// External axis regressor seam
pub trait AxisRegressor {
    /// Expected input schema, in order
    fn feature_names(&self) -> &[String];

    /// Predict from values ordered as `feature_names()`
    fn predict(&self, features: &[f64]) -> PendulumResult<f64>;

    /// Predict for a named vector, projected onto the schema
    fn predict_vector(&self, features: &FeatureVector) -> PendulumResult<f64> {
        let row = features.project(self.feature_names())?;
        self.predict(&row)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINEAR MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// y = intercept + Σ w_k · x_k
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearAxisModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearAxisModel {
    pub fn new(
        feature_names: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
    ) -> PendulumResult<Self> {
        let model = Self {
            feature_names,
            weights,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Zero weights over the reference schema; predicts `intercept` everywhere
    pub fn constant(intercept: f64) -> Self {
        let names = schema(&AXIS_FEATURES);
        let weights = vec![0.0; names.len()];
        Self {
            feature_names: names,
            weights,
            intercept,
        }
    }

    /// Load a JSON model file
    pub fn load(path: &Path) -> PendulumResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path)?;
        let model: LinearAxisModel = serde_json::from_str(&contents)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> PendulumResult<()> {
        if self.weights.len() != self.feature_names.len() {
            return Err(DimensionError::new(
                "regressor weights vs feature names",
                self.feature_names.len(),
                self.weights.len(),
            )
            .into());
        }
        Ok(())
    }
}

impl AxisRegressor for LinearAxisModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &[f64]) -> PendulumResult<f64> {
        if features.len() != self.weights.len() {
            let width = self.weights.len();
            let err = DimensionError::new("regressor input width", width, features.len());
            return Err(err.into());
        }
        Ok(self.intercept + crate::stats::dot(&self.weights, features))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AXIS READING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisLabel {
    /// Tradition / stability (negative axis)
    Order,
    /// Change / experimentation (positive axis)
    Novelty,
}

impl AxisLabel {
    /// Zero counts as Novelty
    pub fn from_prediction(prediction: f64) -> Self {
        if prediction >= 0.0 {
            AxisLabel::Novelty
        } else {
            AxisLabel::Order
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisLabel::Order => write!(f, "Order"),
            AxisLabel::Novelty => write!(f, "Novelty"),
        }
    }
}

/// Label plus pseudo-confidence min(1, |prediction|)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    pub label: AxisLabel,
    pub confidence: f64,
    pub prediction: f64,
}

impl AxisReading {
    pub fn from_prediction(prediction: f64) -> Self {
        Self {
            label: AxisLabel::from_prediction(prediction),
            confidence: prediction.abs().min(1.0),
            prediction,
        }
    }
}

/// Fails unless the regressor expects exactly the `expected` names (any order)
pub fn check_schema<R: AxisRegressor + ?Sized>(
    regressor: &R,
    expected: &[String],
) -> PendulumResult<()> {
    let mut want: Vec<&str> = expected.iter().map(String::as_str).collect();
    let mut have: Vec<&str> = regressor.feature_names().iter().map(String::as_str).collect();
    want.sort_unstable();
    have.sort_unstable();
    if want != have {
        return Err(ConfigError::SchemaMismatch {
            expected: expected.to_vec(),
            actual: regressor.feature_names().to_vec(),
        }
        .into());
    }
    Ok(())
}

/// Run the regressor on a named vector and interpret the result
pub fn read_axis<R: AxisRegressor + ?Sized>(
    regressor: &R,
    features: &FeatureVector,
) -> PendulumResult<AxisReading> {
    Ok(AxisReading::from_prediction(regressor.predict_vector(features)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PendulumError;

    fn two_feature_model() -> LinearAxisModel {
        LinearAxisModel::new(vec!["a".into(), "b".into()], vec![2.0, -1.0], 0.5).unwrap()
    }

    #[test]
    fn test_linear_prediction() {
        let model = two_feature_model();
        assert_eq!(model.predict(&[1.0, 3.0]).unwrap(), 0.5 + 2.0 - 3.0);
    }

    #[test]
    fn test_predict_vector_uses_schema_order() {
        let model = two_feature_model();
        let fv = FeatureVector::from_pairs([("b", 3.0), ("a", 1.0), ("ignored", 100.0)]);
        assert_eq!(model.predict_vector(&fv).unwrap(), -0.5);
    }

    #[test]
    fn test_missing_schema_feature() {
        let model = two_feature_model();
        let fv = FeatureVector::from_pairs([("a", 1.0)]);
        assert!(matches!(
            model.predict_vector(&fv),
            Err(PendulumError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_weight_count_mismatch() {
        let result = LinearAxisModel::new(vec!["a".into()], vec![1.0, 2.0], 0.0);
        assert!(matches!(result, Err(PendulumError::DimensionMismatch(_))));
    }

    #[test]
    fn test_axis_reading() {
        let novelty = AxisReading::from_prediction(0.4);
        assert_eq!(novelty.label, AxisLabel::Novelty);
        assert_eq!(novelty.confidence, 0.4);

        let order = AxisReading::from_prediction(-2.5);
        assert_eq!(order.label, AxisLabel::Order);
        assert_eq!(order.confidence, 1.0);

        assert_eq!(AxisLabel::from_prediction(0.0), AxisLabel::Novelty);
    }

    #[test]
    fn test_load_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axis_model.json");
        std::fs::write(
            &path,
            r#"{ "feature_names": ["a", "b"], "weights": [2.0, -1.0], "intercept": 0.5 }"#,
        )
        .unwrap();
        assert_eq!(LinearAxisModel::load(&path).unwrap(), two_feature_model());

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            LinearAxisModel::load(&missing),
            Err(PendulumError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_check_schema() {
        let model = LinearAxisModel::constant(0.0);
        assert!(check_schema(&model, &schema(&AXIS_FEATURES)).is_ok());

        let mut reversed = schema(&AXIS_FEATURES);
        reversed.reverse();
        assert!(check_schema(&model, &reversed).is_ok());

        let result = check_schema(&two_feature_model(), &schema(&AXIS_FEATURES));
        assert!(matches!(
            result,
            Err(PendulumError::Config(ConfigError::SchemaMismatch { .. }))
        ));
    }

    #[test]
    fn test_constant_model_reads_intercept() {
        let model = LinearAxisModel::constant(-0.3);
        let fv = FeatureVector::from_pairs(AXIS_FEATURES.iter().map(|n| (*n, 0.9)));
        let reading = read_axis(&model, &fv).unwrap();
        assert_eq!(reading.label, AxisLabel::Order);
        assert!((reading.prediction + 0.3).abs() < 1e-12);
    }
}
