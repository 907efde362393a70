//! Engine configuration.
//!
//! ## Sources
//!
//! - `RankingConfig::default()`: standard thresholds, initial score 10.0, step 1.0
//! - `RankingConfig::from_json(..)`: a JSON document, missing fields default
//! - `RankingConfig::from_env()`: defaults overridden by environment variables
//!
//! Environment variables:
//! - `PRESTIGE_TIER_VARIANT`: `low` or `standard` (default: standard)
//! - `PRESTIGE_INITIAL_SCORE`: score of the first item in an empty category (default: 10.0)
//! - `PRESTIGE_SCORE_STEP`: offset used when inserting at either end (default: 1.0)

use serde::{Deserialize, Serialize};

use crate::ranking::{ScoreError, ScorePolicy};
use crate::tier::{ThresholdVariant, TierError, TierTables};
use crate::types::ItemKind;

/// Env var selecting the threshold variant.
pub const ENV_TIER_VARIANT: &str = "PRESTIGE_TIER_VARIANT";
/// Env var overriding the initial score.
pub const ENV_INITIAL_SCORE: &str = "PRESTIGE_INITIAL_SCORE";
/// Env var overriding the extreme step.
pub const ENV_SCORE_STEP: &str = "PRESTIGE_SCORE_STEP";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON document.
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An environment value could not be parsed.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
    /// Tier tables are incomplete or malformed.
    #[error(transparent)]
    Tier(#[from] TierError),
    /// Score policy cannot order scores.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Configuration for the ranking and tier engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Threshold table used for classification.
    pub threshold_variant: ThresholdVariant,
    /// Score derivation parameters.
    pub score: ScorePolicy,
    /// Threshold tables for both variants.
    pub tiers: TierTables,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            threshold_variant: ThresholdVariant::Standard,
            score: ScorePolicy::default(),
            tiers: TierTables::builtin(),
        }
    }
}

impl RankingConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `PRESTIGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TIER_VARIANT) {
            config.threshold_variant = raw.trim().parse().map_err(|e: TierError| {
                ConfigError::InvalidValue {
                    key: ENV_TIER_VARIANT.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_INITIAL_SCORE) {
            config.score.initial_score = parse_f64(ENV_INITIAL_SCORE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SCORE_STEP) {
            config.score.extreme_step = parse_f64(ENV_SCORE_STEP, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the score policy and that both tables cover every item kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.score.validate()?;
        for variant in [ThresholdVariant::Low, ThresholdVariant::Standard] {
            for kind in ItemKind::ALL {
                if self.tiers.get(variant).thresholds(kind).is_none() {
                    return Err(TierError::MissingThresholds { kind, variant }.into());
                }
            }
        }
        Ok(())
    }
}

fn parse_f64(key: &str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim().parse::<f64>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = RankingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold_variant, ThresholdVariant::Standard);
    }

    #[test]
    fn test_env_overrides() {
        let config = RankingConfig::from_lookup(lookup(&[
            (ENV_TIER_VARIANT, "low"),
            (ENV_INITIAL_SCORE, "5.5"),
            (ENV_SCORE_STEP, " 0.25 "),
        ]))
        .unwrap();
        assert_eq!(config.threshold_variant, ThresholdVariant::Low);
        assert_eq!(config.score.initial_score, 5.5);
        assert_eq!(config.score.extreme_step, 0.25);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let err = RankingConfig::from_lookup(lookup(&[(ENV_TIER_VARIANT, "ultra")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = RankingConfig::from_lookup(lookup(&[(ENV_SCORE_STEP, "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = RankingConfig::from_lookup(lookup(&[(ENV_SCORE_STEP, "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Score(ScoreError::InvalidPolicy(_))));
    }

    #[test]
    fn test_json_partial_document() {
        let config = RankingConfig::from_json(r#"{"threshold_variant":"low"}"#).unwrap();
        assert_eq!(config.threshold_variant, ThresholdVariant::Low);
        assert_eq!(config.score, ScorePolicy::default());
    }

    #[test]
    fn test_json_partial_score_policy() {
        let config = RankingConfig::from_json(r#"{"score":{"initial_score":5.0}}"#).unwrap();
        assert_eq!(config.score.initial_score, 5.0);
        assert_eq!(config.score.extreme_step, ScorePolicy::default().extreme_step);
        assert_eq!(config.score.version, ScorePolicy::default().version);
    }

    #[test]
    fn test_json_rejects_incomplete_tables() {
        let json = r#"{
            "tiers": {
                "low": {"track": [1,2,3,4,5,6,7,8,9,10,11]},
                "standard": {"track": [1,2,3,4,5,6,7,8,9,10,11]}
            }
        }"#;
        let err = RankingConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Tier(TierError::MissingThresholds { .. })));
    }

    #[test]
    fn test_json_rejects_malformed_tables() {
        let json = r#"{"tiers": {"low": {"track": [3,2,1]}, "standard": {}}}"#;
        assert!(matches!(RankingConfig::from_json(json), Err(ConfigError::Json(_))));
    }
}
