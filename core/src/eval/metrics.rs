//! Per-query evaluation measures. Every measure takes a ranking (best first)
//! and the judged query, and returns 0 for an empty ranking or a query
//! without judgments.

use crate::{DocId, Query};
use serde::{Deserialize, Serialize};

pub trait Metric: Send + Sync {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64;

    /// `false` for rank positions, where smaller values are better.
    fn higher_is_better(&self) -> bool { true }
}

/// Number of positions a cutoff keeps, `None` meaning the whole ranking.
fn cutoff(k: Option<usize>, len: usize) -> usize { k.map_or(len, |k| k.min(len)) }

fn relevant_in_top(ranking: &[DocId], query: &Query, k: usize) -> usize {
    ranking[..k].iter().filter(|d| query.is_relevant(**d)).count()
}

/// Share of the first `k` documents that are relevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Precision {
    pub k: Option<usize>,
}

impl Metric for Precision {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        let k = cutoff(self.k, ranking.len());
        if k == 0 || query.relevant.is_empty() {
            return 0.0;
        }
        relevant_in_top(ranking, query, k) as f64 / k as f64
    }
}

/// Share of the relevant documents found in the first `k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recall {
    pub k: Option<usize>,
}

impl Metric for Recall {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        let k = cutoff(self.k, ranking.len());
        if k == 0 || query.relevant.is_empty() {
            return 0.0;
        }
        relevant_in_top(ranking, query, k) as f64 / query.relevant.len() as f64
    }
}

/// Weighted harmonic mean of precision and recall at `k`.
/// `beta < 1` favours precision, `beta > 1` recall.
#[derive(Debug, Clone, Copy)]
pub struct FMeasure {
    pub k: Option<usize>,
    pub beta: f64,
}

impl Default for FMeasure {
    fn default() -> Self { Self { k: None, beta: 0.5 } }
}

impl Metric for FMeasure {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        let p = Precision { k: self.k }.evaluate(ranking, query);
        let r = Recall { k: self.k }.evaluate(ranking, query);
        let b2 = self.beta * self.beta;
        if b2 * p + r == 0.0 {
            return 0.0;
        }
        (1.0 + b2) * p * r / (b2 * p + r)
    }
}

/// Mean of the precision at each rank holding a relevant document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragePrecision;

impl Metric for AveragePrecision {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        let mut found = 0usize;
        let mut sum = 0.0;
        for (i, doc) in ranking.iter().enumerate() {
            if query.is_relevant(*doc) {
                found += 1;
                sum += found as f64 / (i + 1) as f64;
            }
        }
        if found == 0 { 0.0 } else { sum / found as f64 }
    }
}

fn first_relevant(ranking: &[DocId], query: &Query) -> Option<usize> {
    ranking.iter().position(|d| query.is_relevant(*d))
}

/// `1 / rank` of the first relevant document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReciprocalRank;

impl Metric for ReciprocalRank {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        first_relevant(ranking, query).map_or(0.0, |i| 1.0 / (i + 1) as f64)
    }
}

/// Zero-based position of the first relevant document, or the ranking length
/// when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstRelevantRank;

impl Metric for FirstRelevantRank {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        first_relevant(ranking, query).unwrap_or(ranking.len()) as f64
    }

    fn higher_is_better(&self) -> bool { false }
}

/// Discounted cumulative gain over the first `p` positions; gain is `grade + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dcg {
    pub p: Option<usize>,
}

impl Metric for Dcg {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        let p = cutoff(self.p, ranking.len());
        ranking[..p]
            .iter()
            .enumerate()
            .filter_map(|(i, d)| query.relevant.get(d).map(|grade| (grade + 1.0) / ((i + 2) as f64).log2()))
            .sum()
    }
}

/// DCG divided by the DCG of the judged documents sorted by grade.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ndcg {
    pub p: Option<usize>,
}

impl Metric for Ndcg {
    fn evaluate(&self, ranking: &[DocId], query: &Query) -> f64 {
        if ranking.is_empty() || query.relevant.is_empty() {
            return 0.0;
        }
        let mut ideal: Vec<(DocId, f64)> = query.relevant.iter().map(|(&d, &g)| (d, g)).collect();
        ideal.sort_by(|a, b| b.1.total_cmp(&a.1));
        let ideal: Vec<DocId> = ideal.into_iter().map(|(d, _)| d).collect();

        let dcg = Dcg { p: self.p };
        let idcg = dcg.evaluate(&ideal, query);
        if idcg == 0.0 { 0.0 } else { dcg.evaluate(ranking, query) / idcg }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    Precision,
    Recall,
    FMeasure,
    AvgP,
    ReciprocalRank,
    FirstRelevantRank,
    Dcg,
    Ndcg,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::FMeasure,
        MetricKind::AvgP,
        MetricKind::ReciprocalRank,
        MetricKind::FirstRelevantRank,
        MetricKind::Dcg,
        MetricKind::Ndcg,
    ];

    /// `cutoff` is the `k`/`p` of measures that take one and is ignored by the rest.
    pub fn build(self, cutoff: Option<usize>) -> Box<dyn Metric> {
        match self {
            MetricKind::Precision => Box::new(Precision { k: cutoff }),
            MetricKind::Recall => Box::new(Recall { k: cutoff }),
            MetricKind::FMeasure => Box::new(FMeasure { k: cutoff, ..FMeasure::default() }),
            MetricKind::AvgP => Box::new(AveragePrecision),
            MetricKind::ReciprocalRank => Box::new(ReciprocalRank),
            MetricKind::FirstRelevantRank => Box::new(FirstRelevantRank),
            MetricKind::Dcg => Box::new(Dcg { p: cutoff }),
            MetricKind::Ndcg => Box::new(Ndcg { p: cutoff }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Precision => "precision",
            MetricKind::Recall => "recall",
            MetricKind::FMeasure => "f-measure",
            MetricKind::AvgP => "avg-p",
            MetricKind::ReciprocalRank => "reciprocal-rank",
            MetricKind::FirstRelevantRank => "first-relevant-rank",
            MetricKind::Dcg => "dcg",
            MetricKind::Ndcg => "ndcg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> Query {
        Query::new(1, "q").with_relevant(2, 1.0).with_relevant(4, 0.0).with_relevant(9, 0.0)
    }

    #[test]
    fn precision_and_recall_at_k() {
        let ranking = [1, 2, 3, 4];
        assert_eq!(Precision { k: Some(2) }.evaluate(&ranking, &query()), 0.5);
        assert_eq!(Precision { k: None }.evaluate(&ranking, &query()), 0.5);
        assert!((Recall { k: None }.evaluate(&ranking, &query()) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(Precision { k: Some(0) }.evaluate(&ranking, &query()), 0.0);
    }

    #[test]
    fn f_measure_zero_when_nothing_relevant() {
        assert_eq!(FMeasure::default().evaluate(&[5, 6], &query()), 0.0);
    }

    #[test]
    fn average_precision() {
        // relevant at ranks 2 and 4: (1/2 + 2/4) / 2
        assert_eq!(AveragePrecision.evaluate(&[1, 2, 3, 4], &query()), 0.5);
    }

    #[test]
    fn rank_measures() {
        assert_eq!(ReciprocalRank.evaluate(&[1, 2], &query()), 0.5);
        assert_eq!(FirstRelevantRank.evaluate(&[1, 2], &query()), 1.0);
        assert_eq!(FirstRelevantRank.evaluate(&[1, 3], &query()), 2.0);
        assert!(!FirstRelevantRank.higher_is_better());
    }

    #[test]
    fn ndcg_is_one_for_ideal_order() {
        let q = query();
        assert!((Ndcg { p: None }.evaluate(&[2, 4, 9], &q) - 1.0).abs() < 1e-12);
        assert!(Ndcg { p: None }.evaluate(&[4, 2, 9], &q) < 1.0);
        let dcg = Dcg { p: None }.evaluate(&[2], &q);
        assert_eq!(dcg, 2.0);
    }

    #[test]
    fn empty_judgments_score_zero() {
        let q = Query::new(1, "q");
        for kind in MetricKind::ALL {
            assert_eq!(kind.build(None).evaluate(&[1, 2], &q), if kind == MetricKind::FirstRelevantRank { 2.0 } else { 0.0 });
        }
    }
}
