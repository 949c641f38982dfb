//! Ranking models: each scores every document of an [`Index`] against a
//! free-text query and orders the positive scores.

mod language;
mod okapi;
mod vector;

pub use language::LanguageModel;
pub use okapi::Okapi;
pub use vector::VectorSpace;

use crate::config::{check, DEFAULT_BM25_B, DEFAULT_BM25_K, DEFAULT_LAMBDA};
use crate::index::Index;
use crate::weighting::WeightingScheme;
use crate::{DocId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Doc id -> score. Documents no query term reached may be present with a zero score.
pub type Scores = BTreeMap<DocId, f64>;

pub trait RankingModel: Send + Sync {
    fn scores(&self, query: &str) -> Scores;

    /// Documents with a positive score, best first. Ties keep ascending doc id order.
    fn ranked(&self, query: &str) -> Vec<(DocId, f64)> { rank(self.scores(query)) }

    fn ranking(&self, query: &str) -> Vec<DocId> {
        self.ranked(query).into_iter().map(|(doc_id, _)| doc_id).collect()
    }
}

/// Drops non-positive scores and sorts the rest in decreasing order.
pub fn rank(scores: Scores) -> Vec<(DocId, f64)> {
    let mut ranked: Vec<(DocId, f64)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
    // stable: equal scores stay in ascending id order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Query stems in a fixed order so that floating-point accumulation is reproducible.
pub(crate) fn sorted_query_stems(index: &Index, query: &str) -> Vec<String> {
    let mut stems: Vec<String> = index.query_stems(query).into_keys().collect();
    stems.sort_unstable();
    stems
}

/// A ranking model and its hyperparameters, buildable against any index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum ModelSpec {
    Vector { scheme: WeightingScheme, normalized: bool },
    Language { lambda: f64 },
    Okapi { k: f64, b: f64 },
}

impl ModelSpec {
    pub fn language() -> Self { ModelSpec::Language { lambda: DEFAULT_LAMBDA } }

    pub fn okapi() -> Self { ModelSpec::Okapi { k: DEFAULT_BM25_K, b: DEFAULT_BM25_B } }

    /// lambda and b must lie in [0, 1], k must be non-negative and finite.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ModelSpec::Vector { .. } => Ok(()),
            ModelSpec::Language { lambda } => check((0.0..=1.0).contains(&lambda), "language.lambda must be in [0, 1]"),
            ModelSpec::Okapi { k, b } => {
                check(k.is_finite() && k >= 0.0, "okapi.k must be non-negative")?;
                check((0.0..=1.0).contains(&b), "okapi.b must be in [0, 1]")
            }
        }
    }

    /// Fails with `InvalidConfig` for out-of-range hyperparameters.
    pub fn build<'a>(&self, index: &'a Index) -> Result<Box<dyn RankingModel + 'a>> {
        self.validate()?;
        Ok(match *self {
            ModelSpec::Vector { scheme, normalized } => {
                Box::new(VectorSpace::new(index, scheme.build(index), normalized)?)
            }
            ModelSpec::Language { lambda } => Box::new(LanguageModel::new(index, lambda)),
            ModelSpec::Okapi { k, b } => Box::new(Okapi::new(index, k, b)),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Vector { scheme, normalized: true } => write!(f, "vector({}, cosine)", scheme.name()),
            ModelSpec::Vector { scheme, normalized: false } => write!(f, "vector({})", scheme.name()),
            ModelSpec::Language { lambda } => write!(f, "language(lambda={lambda:.3})"),
            ModelSpec::Okapi { k, b } => write!(f, "okapi(k={k:.3}, b={b:.3})"),
        }
    }
}
