//! ═══════════════════════════════════════════════════════════════════════════════
//! ANALOGY - Historical Self-Similarity at Fixed Offsets
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! For each entity's own history, in ascending ordinal order:
//!
//!   score[i, Δ] = ⟨v_i, v_{i−Δ}⟩ / (‖v_i‖·‖v_{i−Δ}‖ + ε)   if i − Δ ≥ 0
//!   score[i, Δ] = 0                                          otherwise
//!
//! Δ is a position offset inside the entity's series (120 = 10 years of
//! months). Entities are scored independently and in parallel; order inside
//! an entity is preserved. Null vectors score ~0 through ε, never an error.
//! ═══════════════════════════════════════════════════════════════════════════════

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{ConfigError, DimensionError, PendulumResult};
use crate::features::{schema, FeatureRecord, ANALOGY_FEATURES};
use crate::stats::{dot, norm};

/// Denominator stabilizer
pub const SIMILARITY_EPSILON: f64 = 1e-9;

/// 10 and 20 years, in monthly steps
pub const DEFAULT_LAGS: [usize; 2] = [120, 240];

/// Cosine similarity with ε in the denominator; both vectors must share a length
pub fn cosine_similarity(a: &[f64], b: &[f64], epsilon: f64) -> PendulumResult<f64> {
    if a.len() != b.len() {
        return Err(DimensionError::new("similarity operand length", a.len(), b.len()).into());
    }
    Ok(dot(a, b) / (norm(a) * norm(b) + epsilon))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogyConfig {
    /// Feature subset compared, in order; anything else is ignored
    pub features: Vec<String>,
    /// Offsets Δ in steps
    pub lags: Vec<usize>,
    pub epsilon: f64,
}

impl Default for AnalogyConfig {
    fn default() -> Self {
        Self {
            features: schema(&ANALOGY_FEATURES),
            lags: DEFAULT_LAGS.to_vec(),
            epsilon: SIMILARITY_EPSILON,
        }
    }
}

impl AnalogyConfig {
    pub fn validate(&self) -> PendulumResult<()> {
        if self.features.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "analogy.features".to_string(),
                message: "at least one feature is required".to_string(),
            }
            .into());
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "analogy.epsilon".to_string(),
                message: "must be a positive number".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Similarity at one lag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagSimilarity {
    pub lag: usize,
    pub similarity: f64,
}

/// Scores for one row of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogyScore {
    pub entity_id: String,
    pub ordinal: i64,
    pub scores: Vec<LagSimilarity>,
}

impl AnalogyScore {
    pub fn at_lag(&self, lag: usize) -> Option<f64> {
        self.scores.iter().find(|s| s.lag == lag).map(|s| s.similarity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoricalAnalogyScorer {
    config: AnalogyConfig,
}

impl HistoricalAnalogyScorer {
    pub fn new(config: AnalogyConfig) -> PendulumResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalogyConfig {
        &self.config
    }

    /// Score one already-ordered series; `out[i][k]` is the score at `lags[k]`.
    /// Every step must carry the same number of values.
    pub fn score_series(&self, series: &[Vec<f64>]) -> PendulumResult<Vec<Vec<f64>>> {
        let width = series.first().map(Vec::len).unwrap_or(0);
        if let Some((i, step)) = series.iter().enumerate().find(|(_, v)| v.len() != width) {
            let what = format!("analogy step {} width", i);
            return Err(DimensionError::new(what, width, step.len()).into());
        }

        (0..series.len())
            .map(|i| {
                self.config
                    .lags
                    .iter()
                    .map(|&lag| match i.checked_sub(lag) {
                        Some(j) => cosine_similarity(&series[i], &series[j], self.config.epsilon),
                        None => Ok(0.0),
                    })
                    .collect::<PendulumResult<Vec<f64>>>()
            })
            .collect()
    }

    /// Group by entity, order by ordinal, score each group in parallel.
    /// Output is sorted by (entity_id, ordinal). Any malformed row fails the call.
    pub fn score_records(&self, records: &[FeatureRecord]) -> PendulumResult<Vec<AnalogyScore>> {
        let mut groups: BTreeMap<&str, Vec<&FeatureRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.entity_id.as_str()).or_default().push(record);
        }
        info!(
            rows = records.len(),
            entities = groups.len(),
            lags = ?self.config.lags,
            "scoring historical analogies"
        );

        let groups: Vec<(&str, Vec<&FeatureRecord>)> = groups.into_iter().collect();
        let scored: Vec<Vec<AnalogyScore>> = groups
            .into_par_iter()
            .map(|(entity, mut rows)| self.score_entity(entity, &mut rows))
            .collect::<PendulumResult<_>>()?;

        Ok(scored.into_iter().flatten().collect())
    }

    fn score_entity(
        &self,
        entity: &str,
        rows: &mut [&FeatureRecord],
    ) -> PendulumResult<Vec<AnalogyScore>> {
        // Stable: equal ordinals keep input order
        rows.sort_by_key(|r| r.ordinal);
        let series = rows
            .iter()
            .map(|r| r.project(self.config.features.as_slice()))
            .collect::<PendulumResult<Vec<_>>>()?;
        debug!(entity, steps = series.len(), "entity series built");

        let scores = self.score_series(&series)?;
        Ok(rows
            .iter()
            .zip(scores)
            .map(|(row, per_lag)| AnalogyScore {
                entity_id: entity.to_string(),
                ordinal: row.ordinal,
                scores: self
                    .config
                    .lags
                    .iter()
                    .zip(per_lag)
                    .map(|(&lag, similarity)| LagSimilarity { lag, similarity })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PendulumError;

    fn small_lags(lags: Vec<usize>) -> HistoricalAnalogyScorer {
        HistoricalAnalogyScorer::new(AnalogyConfig {
            lags,
            ..AnalogyConfig::default()
        })
        .unwrap()
    }

    fn record(entity: &str, ordinal: i64, v: [f64; 5]) -> FeatureRecord {
        ANALOGY_FEATURES
            .iter()
            .zip(v)
            .fold(FeatureRecord::new(entity, ordinal), |r, (name, x)| r.with(name, x))
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let v = vec![0.3, -0.2, 0.9, 0.1, 0.5];
        assert!((cosine_similarity(&v, &v, SIMILARITY_EPSILON).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 2.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b, SIMILARITY_EPSILON).unwrap(), 0.0);
    }

    #[test]
    fn test_null_vectors_do_not_fail() {
        let z = vec![0.0; 5];
        let s = cosine_similarity(&z, &z, SIMILARITY_EPSILON).unwrap();
        assert!(s.is_finite());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_insufficient_history_is_zero() {
        let scorer = small_lags(vec![3, 5]);
        let series: Vec<Vec<f64>> = (0..8).map(|_| vec![1.0, 1.0]).collect();
        let scores = scorer.score_series(&series).unwrap();
        for i in 0..3 {
            assert_eq!(scores[i], vec![0.0, 0.0]);
        }
        assert!((scores[3][0] - 1.0).abs() < 1e-6);
        assert_eq!(scores[4][1], 0.0);
        assert!((scores[5][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_lags_need_ten_years() {
        let scorer = HistoricalAnalogyScorer::default();
        let series: Vec<Vec<f64>> = (0..130).map(|_| vec![1.0, 0.5]).collect();
        let scores = scorer.score_series(&series).unwrap();
        assert_eq!(scores[119], vec![0.0, 0.0]);
        assert!((scores[120][0] - 1.0).abs() < 1e-6);
        assert_eq!(scores[129][1], 0.0);
    }

    #[test]
    fn test_groups_are_independent_and_sorted() {
        let scorer = small_lags(vec![1]);
        // Interleaved and out of order on purpose
        let records = vec![
            record("b", 1, [0.0, 1.0, 0.0, 0.0, 0.0]),
            record("a", 1, [1.0, 0.0, 0.0, 0.0, 0.0]),
            record("b", 0, [1.0, 0.0, 0.0, 0.0, 0.0]),
            record("a", 0, [2.0, 0.0, 0.0, 0.0, 0.0]),
        ];
        let out = scorer.score_records(&records).unwrap();
        let keys: Vec<(&str, i64)> = out
            .iter()
            .map(|s| (s.entity_id.as_str(), s.ordinal))
            .collect();
        assert_eq!(keys, vec![("a", 0), ("a", 1), ("b", 0), ("b", 1)]);

        assert_eq!(out[0].at_lag(1), Some(0.0));
        // a: parallel vectors
        assert!((out[1].at_lag(1).unwrap() - 1.0).abs() < 1e-6);
        // b: orthogonal vectors, and never compared against entity a
        assert_eq!(out[3].at_lag(1), Some(0.0));
    }

    #[test]
    fn test_extra_features_ignored() {
        let scorer = small_lags(vec![1]);
        let records = vec![
            record("x", 0, [0.2, 0.4, 0.1, 0.0, 0.3]).with("sp500_ret", 9.0),
            record("x", 1, [0.2, 0.4, 0.1, 0.0, 0.3]).with("sp500_ret", -9.0),
        ];
        let out = scorer.score_records(&records).unwrap();
        assert!((out[1].at_lag(1).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_numeric_fails_whole_call() {
        let scorer = small_lags(vec![1]);
        let records = vec![
            record("x", 0, [0.2, 0.4, 0.1, 0.0, 0.3]),
            record("y", 0, [0.2, 0.4, 0.1, 0.0, 0.3])
                .with_value("gt_search", crate::features::FeatureValue::Text("n/a".into())),
        ];
        let result = scorer.score_records(&records);
        assert!(matches!(result, Err(PendulumError::TypeMismatch { .. })));
    }

    #[test]
    fn test_missing_feature_fails() {
        let scorer = small_lags(vec![1]);
        let records = vec![FeatureRecord::new("x", 0).with("gt_search", 1.0)];
        assert!(matches!(
            scorer.score_records(&records),
            Err(PendulumError::MissingFeature(_))
        ));
    }

    #[test]
    fn test_empty_feature_subset_rejected() {
        let config = AnalogyConfig {
            features: Vec::new(),
            ..AnalogyConfig::default()
        };
        assert!(HistoricalAnalogyScorer::new(config).is_err());
    }

    #[test]
    fn test_ragged_series_is_dimension_mismatch() {
        let scorer = small_lags(vec![1]);
        let result = scorer.score_series(&[vec![1.0, 5.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(PendulumError::DimensionMismatch(ref e)) if e.expected == 2 && e.actual == 1
        ));
    }

    #[test]
    fn test_mismatched_operands_rejected() {
        let result = cosine_similarity(&[1.0, 5.0], &[1.0], SIMILARITY_EPSILON);
        assert!(matches!(result, Err(PendulumError::DimensionMismatch(_))));
    }

    #[test]
    fn test_empty_series_scores_nothing() {
        let scorer = HistoricalAnalogyScorer::default();
        assert!(scorer.score_series(&[]).unwrap().is_empty());
    }
}
