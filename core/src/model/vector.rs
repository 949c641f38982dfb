use super::{sorted_query_stems, RankingModel, Scores};
use crate::index::Index;
use crate::weighting::Weighter;
use crate::{DocId, Result};
use std::collections::BTreeMap;

/// Dot product between query and document weight vectors.
///
/// With `normalized`, the dot product is divided by
/// `sqrt(|q|) + sqrt(|d|)` where `|.|` is the Euclidean norm. This is a sum of
/// square-rooted norms, not cosine similarity.
pub struct VectorSpace<'a> {
    index: &'a Index,
    weighter: Box<dyn Weighter + 'a>,
    normalized: bool,
    doc_norms: BTreeMap<DocId, f64>,
}

impl<'a> VectorSpace<'a> {
    pub fn new(index: &'a Index, weighter: Box<dyn Weighter + 'a>, normalized: bool) -> Result<Self> {
        let mut doc_norms = BTreeMap::new();
        for doc_id in index.doc_ids() {
            let weights = weighter.weights_for_doc(doc_id)?;
            doc_norms.insert(doc_id, euclidean_norm(weights.values().copied()));
        }
        Ok(Self { index, weighter, normalized, doc_norms })
    }

    pub fn doc_norm(&self, doc_id: DocId) -> Option<f64> { self.doc_norms.get(&doc_id).copied() }
}

fn euclidean_norm(weights: impl Iterator<Item = f64>) -> f64 {
    weights.map(|w| w * w).sum::<f64>().sqrt()
}

impl RankingModel for VectorSpace<'_> {
    fn scores(&self, query: &str) -> Scores {
        let query_weights = self.weighter.weights_for_query(query);
        if query_weights.is_empty() {
            return Scores::new();
        }
        let mut scores: Scores = self.index.doc_ids().map(|d| (d, 0.0)).collect();

        let mut matched: Vec<DocId> = Vec::new();
        for stem in sorted_query_stems(self.index, query) {
            let Some(&wq) = query_weights.get(&stem) else { continue };
            for (doc_id, wd) in self.weighter.weights_for_stem(&stem) {
                if let Some(score) = scores.get_mut(&doc_id) {
                    *score += wd * wq;
                    matched.push(doc_id);
                }
            }
        }

        if self.normalized {
            let query_norm = euclidean_norm(query_weights.values().copied());
            matched.sort_unstable();
            matched.dedup();
            for doc_id in matched {
                let denom = query_norm.sqrt() + self.doc_norms[&doc_id].sqrt();
                if denom > 0.0 {
                    if let Some(score) = scores.get_mut(&doc_id) {
                        *score /= denom;
                    }
                }
            }
        }
        tracing::debug!(query, normalized = self.normalized, "vector scores computed");
        scores
    }
}
