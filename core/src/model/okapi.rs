use super::{sorted_query_stems, RankingModel, Scores};
use crate::index::Index;

/// Okapi BM25. `k` controls tf saturation, `b` document length normalization.
pub struct Okapi<'a> {
    index: &'a Index,
    k: f64,
    b: f64,
    avg_len: f64,
}

impl<'a> Okapi<'a> {
    pub fn new(index: &'a Index, k: f64, b: f64) -> Self {
        Self { index, k, b, avg_len: index.average_document_length() }
    }

    pub fn params(&self) -> (f64, f64) { (self.k, self.b) }

    /// Contribution of one term to one document.
    pub fn term_score(&self, idf: f64, tf: f64, doc_len: f64) -> f64 {
        let len_norm = if self.avg_len > 0.0 { doc_len / self.avg_len } else { 0.0 };
        idf * tf / (tf + self.k * (1.0 - self.b + self.b * len_norm))
    }
}

impl RankingModel for Okapi<'_> {
    fn scores(&self, query: &str) -> Scores {
        let stems = sorted_query_stems(self.index, query);
        if stems.is_empty() {
            return Scores::new();
        }
        let lengths = self.index.lengths();
        let mut scores: Scores = lengths.keys().map(|&d| (d, 0.0)).collect();
        for stem in stems {
            let Some(idf) = self.index.idf_of(&stem) else { continue };
            for (doc_id, &tf) in self.index.postings_for(&stem) {
                if let Some(score) = scores.get_mut(doc_id) {
                    *score += self.term_score(idf, tf as f64, lengths[doc_id] as f64);
                }
            }
        }
        tracing::debug!(query, k = self.k, b = self.b, "okapi scores computed");
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Whitespace;
    use crate::TermFrequencies;
    use std::sync::Arc;

    fn index() -> Index {
        let doc = |pairs: &[(&str, u32)]| -> TermFrequencies {
            pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
        };
        Index::from_term_frequencies(
            vec![(1, doc(&[("a", 2), ("b", 1)])), (2, doc(&[("a", 1), ("c", 3)])), (3, doc(&[("b", 2), ("c", 1)]))],
            Arc::new(Whitespace),
        )
    }

    #[test]
    fn bm25_sum() {
        let index = index();
        let model = Okapi::new(&index, 1.2, 0.75);
        let idf = (4.0f64 / 3.0).ln();
        let avg = 10.0 / 3.0;
        let expected = idf * 2.0 / (2.0 + 1.2 * (0.25 + 0.75 * 3.0 / avg))
            + idf * 1.0 / (1.0 + 1.2 * (0.25 + 0.75 * 3.0 / avg));
        assert!((model.scores("a b")[&1] - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_terms_score_nothing() {
        let index = index();
        assert!(Okapi::new(&index, 1.2, 0.75).ranking("zzz").is_empty());
    }

    #[test]
    fn b_zero_ignores_length() {
        let index = index();
        let model = Okapi::new(&index, 1.2, 0.0);
        assert_eq!(model.term_score(1.0, 2.0, 3.0), model.term_score(1.0, 2.0, 300.0));
    }
}
