//! Recommender configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Files are validated when loaded: a bad budget table fails here rather than
//! producing empty selections later.
//!
//! ```json
//! {
//!   "embedding": { "dimension": 128, "cache": true },
//!   "scoring": { "title_weight": 0.3, "summary_weight": 1.0, "arcs_weight": 0.4 },
//!   "budget": { "kind": "table", "levels": { "5": 8 } },
//!   "fill_policy": "fill_to_budget",
//!   "reasons": { "high": 0.25, "moderate": 0.05 },
//!   "parallel_seasons": true
//! }
//! ```

use crate::reason::ReasonThresholds;
use embeddings::{CachedEmbedder, EmbeddingError, EmbeddingProvider, HashEmbedder};
use pipeline::{BudgetError, BudgetPolicy, CoveragePlanner, FillPolicy};
use scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid budget: {0}")]
    Budget(#[from] BudgetError),

    #[error("Invalid embedding settings: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for the built-in embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    /// Memoize vectors by exact text across requests
    pub cache: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: embeddings::hashed::DEFAULT_DIMENSION,
            cache: true,
        }
    }
}

/// Top-level configuration for `RecommendationOrchestrator`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub embedding: EmbeddingConfig,
    pub scoring: ScoringConfig,
    pub budget: BudgetPolicy,
    pub fill_policy: FillPolicy,
    pub reasons: ReasonThresholds,
    /// Plan seasons on the rayon pool instead of one after another
    pub parallel_seasons: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            scoring: ScoringConfig::default(),
            budget: BudgetPolicy::default(),
            fill_policy: FillPolicy::default(),
            reasons: ReasonThresholds::default(),
            parallel_seasons: true,
        }
    }
}

impl RecommenderConfig {
    /// Load and validate a JSON config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded recommender config from {}", path.display());
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }

        let weights = [
            ("title_weight", self.scoring.title_weight),
            ("summary_weight", self.scoring.summary_weight),
            ("arcs_weight", self.scoring.arcs_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "scoring.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        self.budget.validate()?;
        self.reasons.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Build the embedder described by `embedding`
    pub fn build_embedder(&self) -> Result<Arc<dyn EmbeddingProvider>, ConfigError> {
        let embedder = HashEmbedder::new(self.embedding.dimension)?;
        if self.embedding.cache {
            Ok(Arc::new(CachedEmbedder::new(embedder)))
        } else {
            Ok(Arc::new(embedder))
        }
    }

    pub fn planner(&self) -> CoveragePlanner {
        CoveragePlanner::new()
            .with_budget_policy(self.budget)
            .with_fill_policy(self.fill_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{BudgetTable, ImmersionLevel};

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = RecommenderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RecommenderConfig::default());
        assert_eq!(config.embedding.dimension, 128);
        assert!(config.parallel_seasons);
        assert_eq!(config.fill_policy, FillPolicy::FillToBudget);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "embedding": { "dimension": 32, "cache": false },
            "scoring": { "arcs_weight": 0.0 },
            "budget": { "kind": "table", "levels": { "4": 5, "5": 8 } },
            "fill_policy": "stop_when_covered",
            "reasons": { "high": 0.5, "moderate": 0.1 },
            "parallel_seasons": false
        }"#;

        let config = RecommenderConfig::from_json_str(json).unwrap();

        assert_eq!(config.embedding.dimension, 32);
        assert!(!config.embedding.cache);
        assert_eq!(config.scoring.arcs_weight, 0.0);
        assert_eq!(config.scoring.summary_weight, 1.0);
        assert_eq!(
            config.budget,
            BudgetPolicy::Table {
                levels: BudgetTable::new([1, 2, 3, 5, 8]).unwrap()
            }
        );
        assert_eq!(config.fill_policy, FillPolicy::StopWhenCovered);
        assert!(!config.parallel_seasons);
        assert_eq!(config.build_embedder().unwrap().dimension(), 32);
    }

    #[test]
    fn test_proportional_budget() {
        let json = r#"{ "budget": { "kind": "proportional", "max_per_season": 8 } }"#;
        let config = RecommenderConfig::from_json_str(json).unwrap();
        assert_eq!(config.planner().budget_for(ImmersionLevel::clamped(3), 10), 4);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let zero_budget = r#"{ "budget": { "kind": "table", "levels": { "1": 0 } } }"#;
        assert!(matches!(
            RecommenderConfig::from_json_str(zero_budget),
            Err(ConfigError::Parse(_))
        ));

        let zero_max = r#"{ "budget": { "kind": "proportional", "max_per_season": 0 } }"#;
        assert!(matches!(
            RecommenderConfig::from_json_str(zero_max),
            Err(ConfigError::Budget(BudgetError::ZeroMaximum))
        ));

        let zero_dim = r#"{ "embedding": { "dimension": 0 } }"#;
        assert!(matches!(
            RecommenderConfig::from_json_str(zero_dim),
            Err(ConfigError::Invalid(_))
        ));

        let negative = r#"{ "scoring": { "title_weight": -1.0 } }"#;
        assert!(RecommenderConfig::from_json_str(negative).is_err());

        let inverted = r#"{ "reasons": { "high": 0.1, "moderate": 0.5 } }"#;
        assert!(RecommenderConfig::from_json_str(inverted).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recommender.json");
        fs::write(&path, r#"{ "fill_policy": "stop_when_covered" }"#).unwrap();

        let config = RecommenderConfig::load_from_file(&path).unwrap();
        assert_eq!(config.fill_policy, FillPolicy::StopWhenCovered);

        let missing = RecommenderConfig::load_from_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
