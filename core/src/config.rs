//! Defaults for every tunable parameter and the JSON-loadable [`EngineConfig`].
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```json
//! { "okapi": { "k": 1.5 }, "pagerank": { "seeds": 20 } }
//! ```

use crate::model::ModelSpec;
use crate::weighting::WeightingScheme;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Jelinek-Mercer interpolation weight of the document model.
pub const DEFAULT_LAMBDA: f64 = 0.8;
/// BM25 term frequency saturation.
pub const DEFAULT_BM25_K: f64 = 1.2;
/// BM25 document length normalization.
pub const DEFAULT_BM25_B: f64 = 0.75;

/// Number of top-ranked documents seeding the PageRank subgraph.
pub const DEFAULT_SEEDS: usize = 30;
/// Inbound citers sampled per seed.
pub const DEFAULT_CITERS: usize = 30;
pub const DEFAULT_DAMPING: f64 = 0.8;
/// Mean absolute change between iterations below which PageRank stops.
pub const DEFAULT_EPS: f64 = 1e-5;
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Grid step for lambda, k and b.
pub const DEFAULT_STEP: f64 = 0.1;
/// Share of queries used for training in a grid search.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.7;
pub const DEFAULT_FOLDS: usize = 10;
/// Okapi k is searched over `[K_GRID_MIN, K_GRID_MAX]`.
pub const K_GRID_MIN: f64 = 0.7;
pub const K_GRID_MAX: f64 = 1.7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub language: LanguageConfig,
    pub okapi: OkapiConfig,
    pub vector: VectorConfig,
    pub pagerank: PageRankConfig,
    pub tuning: TuningConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub lambda: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self { Self { lambda: DEFAULT_LAMBDA } }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OkapiConfig {
    pub k: f64,
    pub b: f64,
}

impl Default for OkapiConfig {
    fn default() -> Self { Self { k: DEFAULT_BM25_K, b: DEFAULT_BM25_B } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub scheme: WeightingScheme,
    pub normalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub seeds: usize,
    pub citers: usize,
    pub damping: f64,
    pub eps: f64,
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS,
            citers: DEFAULT_CITERS,
            damping: DEFAULT_DAMPING,
            eps: DEFAULT_EPS,
            max_iter: DEFAULT_MAX_ITER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub step: f64,
    pub ratio: f64,
    pub folds: usize,
    /// Fixed seed for query shuffling and graph sampling; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for TuningConfig {
    fn default() -> Self { Self { step: DEFAULT_STEP, ratio: DEFAULT_TRAIN_RATIO, folds: DEFAULT_FOLDS, seed: None } }
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ModelSpec::Language { lambda: self.language.lambda }.validate()?;
        ModelSpec::Okapi { k: self.okapi.k, b: self.okapi.b }.validate()?;
        self.pagerank.validate()?;
        check(self.tuning.step > 0.0 && self.tuning.step <= 1.0, "tuning.step must be in (0, 1]")?;
        check(self.tuning.ratio > 0.0 && self.tuning.ratio <= 1.0, "tuning.ratio must be in (0, 1]")?;
        check(self.tuning.folds >= 2, "tuning.folds must be at least 2")
    }
}

impl PageRankConfig {
    pub fn validate(&self) -> Result<()> {
        check(self.damping > 0.0 && self.damping < 1.0, "pagerank.damping must be in (0, 1)")?;
        check(self.eps > 0.0, "pagerank.eps must be positive")?;
        check(self.max_iter > 0, "pagerank.max_iter must be positive")
    }
}

pub(crate) fn check(ok: bool, message: &str) -> Result<()> {
    if ok { Ok(()) } else { Err(Error::InvalidConfig(message.to_string())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "okapi": { "k": 1.5 } }"#).unwrap();
        assert_eq!(config.okapi.k, 1.5);
        assert_eq!(config.okapi.b, DEFAULT_BM25_B);
        assert_eq!(config.pagerank.max_iter, DEFAULT_MAX_ITER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scheme_is_kebab_case() {
        let config: EngineConfig = serde_json::from_str(r#"{ "vector": { "scheme": "idf-query" } }"#).unwrap();
        assert_eq!(config.vector.scheme, WeightingScheme::IdfQuery);
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let mut config = EngineConfig::default();
        config.pagerank.damping = 1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_negative_bm25_k() {
        let config: EngineConfig = serde_json::from_str(r#"{ "okapi": { "k": -0.5 } }"#).unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
