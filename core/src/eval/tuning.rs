//! Grid search and k-fold cross-validation over the language model's lambda
//! and Okapi's (k, b).
//!
//! Every grid point is a fresh, cheap model over the same borrowed [`Index`];
//! grid points are evaluated in parallel.

use super::evaluator::Evaluator;
use super::metrics::Metric;
use crate::config::{K_GRID_MAX, K_GRID_MIN};
use crate::index::Index;
use crate::model::ModelSpec;
use crate::{Error, Query, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    Language,
    Okapi,
}

/// `bins` evenly spaced values from `lo` to `hi`, both included.
fn linspace(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    if bins <= 1 {
        return vec![lo];
    }
    (0..bins).map(|i| lo + (hi - lo) * i as f64 / (bins - 1) as f64).collect()
}

impl ModelFamily {
    /// lambda in [0, 1]; k in [0.7, 1.7] crossed with b in [0, 1].
    pub fn grid(self, step: f64) -> Vec<ModelSpec> {
        let bins = (1.0 / step).round() as usize + 1;
        match self {
            ModelFamily::Language => linspace(0.0, 1.0, bins).into_iter().map(|lambda| ModelSpec::Language { lambda }).collect(),
            ModelFamily::Okapi => {
                let bs = linspace(0.0, 1.0, bins);
                linspace(K_GRID_MIN, K_GRID_MAX, bins)
                    .into_iter()
                    .flat_map(|k| bs.iter().map(move |&b| ModelSpec::Okapi { k, b }))
                    .collect()
            }
        }
    }

    /// Parameter-wise mean of several specs of this family.
    fn mean_spec(self, specs: &[ModelSpec]) -> Option<ModelSpec> {
        if specs.is_empty() {
            return None;
        }
        let n = specs.len() as f64;
        Some(match self {
            ModelFamily::Language => {
                let lambda = specs.iter().map(|s| if let ModelSpec::Language { lambda } = s { *lambda } else { 0.0 }).sum::<f64>();
                ModelSpec::Language { lambda: lambda / n }
            }
            ModelFamily::Okapi => {
                let (k, b) = specs.iter().fold((0.0, 0.0), |(ks, bs), s| match s {
                    ModelSpec::Okapi { k, b } => (ks + k, bs + b),
                    _ => (ks, bs),
                });
                ModelSpec::Okapi { k: k / n, b: b / n }
            }
        })
    }
}

/// Shuffles the queries and keeps the first `ratio` share for training.
pub fn split_queries<R: Rng + ?Sized>(queries: &[Query], ratio: f64, rng: &mut R) -> (Vec<Query>, Vec<Query>) {
    let mut shuffled = queries.to_vec();
    shuffled.shuffle(rng);
    let split = ((shuffled.len() as f64) * ratio) as usize;
    let test = shuffled.split_off(split.min(shuffled.len()));
    (shuffled, test)
}

/// `k` consecutive folds whose sizes differ by at most one, larger folds first.
pub fn fold_queries<R: Rng + ?Sized>(queries: &[Query], k: usize, rng: &mut R) -> Vec<Vec<Query>> {
    let k = k.max(1);
    let mut shuffled = queries.to_vec();
    shuffled.shuffle(rng);
    let base = shuffled.len() / k;
    let extra = shuffled.len() % k;
    let mut rest = shuffled.into_iter();
    (0..k).map(|i| rest.by_ref().take(base + usize::from(i < extra)).collect()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSearchReport {
    pub best: ModelSpec,
    pub train_score: f64,
    pub test_score: f64,
    pub train_queries: usize,
    pub test_queries: usize,
}

pub struct GridSearch<'a> {
    index: &'a Index,
    metric: &'a dyn Metric,
    step: f64,
}

impl<'a> GridSearch<'a> {
    pub fn new(index: &'a Index, metric: &'a dyn Metric, step: f64) -> Result<Self> {
        if !(step > 0.0 && step <= 1.0) {
            return Err(Error::InvalidConfig(format!("grid step must be in (0, 1], got {step}")));
        }
        Ok(Self { index, metric, step })
    }

    /// Mean metric value of `spec` over `queries`.
    pub fn evaluate(&self, spec: &ModelSpec, queries: &[Query]) -> Result<f64> {
        let model = spec.build(self.index)?;
        Ok(Evaluator::new(queries).summarize(model.as_ref(), self.metric).mean)
    }

    /// The grid point with the best mean on `train`; the first one wins ties.
    pub fn best_params(&self, family: ModelFamily, train: &[Query]) -> Result<(ModelSpec, f64)> {
        let grid = family.grid(self.step);
        let scored: Vec<(ModelSpec, f64)> = grid
            .par_iter()
            .map(|spec| self.evaluate(spec, train).map(|score| (*spec, score)))
            .collect::<Result<_>>()?;

        let higher = self.metric.higher_is_better();
        let mut best = scored[0];
        for &(spec, score) in &scored[1..] {
            let better = if higher { score > best.1 } else { score < best.1 };
            if better {
                best = (spec, score);
            }
        }
        tracing::info!(grid = scored.len(), best = %best.0, score = best.1, "grid search done");
        Ok(best)
    }

    /// Train/test split, grid search on train, single evaluation on test.
    pub fn run<R: Rng + ?Sized>(&self, family: ModelFamily, queries: &[Query], ratio: f64, rng: &mut R) -> Result<GridSearchReport> {
        let (train, test) = split_queries(queries, ratio, rng);
        let (best, train_score) = self.best_params(family, &train)?;
        let test_score = self.evaluate(&best, &test)?;
        Ok(GridSearchReport { best, train_score, test_score, train_queries: train.len(), test_queries: test.len() })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub best: ModelSpec,
    pub test_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    /// Parameter-wise mean of each fold's selection.
    pub mean_params: ModelSpec,
    pub mean_test_score: f64,
}

pub struct CrossValidation<'a> {
    grid: GridSearch<'a>,
    folds: usize,
}

impl<'a> CrossValidation<'a> {
    pub fn new(grid: GridSearch<'a>, folds: usize) -> Result<Self> {
        if folds < 2 {
            return Err(Error::InvalidConfig(format!("cross-validation needs at least 2 folds, got {folds}")));
        }
        Ok(Self { grid, folds })
    }

    pub fn run<R: Rng + ?Sized>(&self, family: ModelFamily, queries: &[Query], rng: &mut R) -> Result<CrossValidationReport> {
        let folds = fold_queries(queries, self.folds, rng);
        let mut results = Vec::with_capacity(folds.len());
        for (i, test) in folds.iter().enumerate() {
            let train: Vec<Query> = folds
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, fold)| fold.iter().cloned())
                .collect();
            let (best, _) = self.grid.best_params(family, &train)?;
            let test_score = self.grid.evaluate(&best, test)?;
            tracing::info!(fold = i, best = %best, test_score, "fold evaluated");
            results.push(FoldResult { best, test_score });
        }

        let specs: Vec<ModelSpec> = results.iter().map(|r| r.best).collect();
        let mean_params = family
            .mean_spec(&specs)
            .ok_or_else(|| Error::InvalidConfig("no folds to average".into()))?;
        let mean_test_score = results.iter().map(|r| r.test_score).sum::<f64>() / results.len() as f64;
        Ok(CrossValidationReport { folds: results, mean_params, mean_test_score })
    }
}
