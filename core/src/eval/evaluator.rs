use super::metrics::Metric;
use crate::model::RankingModel;
use crate::{Query, QueryId};
use rayon::prelude::*;
use serde::Serialize;

/// Mean and population standard deviation of a measure over a query set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub queries: usize,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, std: var.sqrt(), queries: values.len() }
    }
}

/// Scores one model's rankings against judged queries. Queries run in parallel.
pub struct Evaluator<'a> {
    queries: &'a [Query],
}

impl<'a> Evaluator<'a> {
    pub fn new(queries: &'a [Query]) -> Self { Self { queries } }

    pub fn evaluate_query(model: &dyn RankingModel, metric: &dyn Metric, query: &Query) -> f64 {
        let ranking = model.ranking(&query.text);
        metric.evaluate(&ranking, query)
    }

    pub fn per_query(&self, model: &dyn RankingModel, metric: &dyn Metric) -> Vec<(QueryId, f64)> {
        self.queries
            .par_iter()
            .map(|q| (q.id, Self::evaluate_query(model, metric, q)))
            .collect()
    }

    pub fn summarize(&self, model: &dyn RankingModel, metric: &dyn Metric) -> Summary {
        let values: Vec<f64> = self.per_query(model, metric).into_iter().map(|(_, v)| v).collect();
        Summary::from_values(&values)
    }
}
