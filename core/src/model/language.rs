use super::{sorted_query_stems, RankingModel, Scores};
use crate::index::Index;
use crate::DocId;
use std::collections::BTreeMap;

/// Query likelihood with Jelinek-Mercer smoothing.
///
/// Each query stem known to the collection multiplies a document's score by
/// `(1 - lambda) * p(t|C) + lambda * p(t|d)`. Higher `lambda` trusts the
/// document more; short queries do well around 0.8, long ones nearer 0.2.
pub struct LanguageModel<'a> {
    index: &'a Index,
    lambda: f64,
    total_occurrences: u64,
}

impl<'a> LanguageModel<'a> {
    pub fn new(index: &'a Index, lambda: f64) -> Self {
        Self { index, lambda, total_occurrences: index.total_occurrences() }
    }

    pub fn lambda(&self) -> f64 { self.lambda }

    /// `p(t|C)`: share of all collection occurrences that are `stem`.
    pub fn collection_probability(&self, stem: &str) -> f64 {
        if self.total_occurrences == 0 {
            return 0.0;
        }
        self.index.collection_frequency(stem) as f64 / self.total_occurrences as f64
    }
}

impl RankingModel for LanguageModel<'_> {
    fn scores(&self, query: &str) -> Scores {
        if self.total_occurrences == 0 {
            tracing::debug!("empty collection, no language model scores");
            return Scores::new();
        }
        let stems = sorted_query_stems(self.index, query);
        if stems.is_empty() {
            return Scores::new();
        }

        let lengths = self.index.lengths();
        let mut scores: Vec<(DocId, f64)> = lengths.keys().map(|&d| (d, 0.0)).collect();
        let mut touched = vec![false; scores.len()];

        for stem in stems {
            let postings = self.index.postings_for(&stem);
            if postings.is_empty() {
                continue;
            }
            let background = (1.0 - self.lambda) * self.collection_probability(&stem);
            for ((doc_id, score), seen) in scores.iter_mut().zip(touched.iter_mut()) {
                let doc_id = *doc_id;
                if !*seen {
                    *score = 1.0;
                    *seen = true;
                }
                *score *= match postings.get(&doc_id) {
                    Some(&tf) => background + self.lambda * tf as f64 / lengths[&doc_id] as f64,
                    None => background,
                };
            }
        }
        tracing::debug!(query, lambda = self.lambda, "language model scores computed");
        scores.into_iter().collect::<BTreeMap<_, _>>()
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
    fn smoothed_product_over_terms() {
        let index = index();
        let model = LanguageModel::new(&index, 0.8);
        let scores = model.scores("a b");
        // total = 10, cf(a) = 3, cf(b) = 3
        let pa = 0.2 * 0.3;
        let pb = 0.2 * 0.3;
        let d1 = (pa + 0.8 * 2.0 / 3.0) * (pb + 0.8 * 1.0 / 3.0);
        let d2 = (pa + 0.8 * 1.0 / 4.0) * pb;
        assert!((scores[&1] - d1).abs() < 1e-12);
        assert!((scores[&2] - d2).abs() < 1e-12);
        assert_eq!(model.ranking("a b")[0], 1);
    }

    #[test]
    fn untouched_documents_stay_at_zero() {
        let index = index();
        let scores = LanguageModel::new(&index, 0.8).scores("nothing here");
        assert!(scores.values().all(|&s| s == 0.0));
    }

    #[test]
    fn lambda_one_zeroes_non_matching_documents() {
        let index = index();
        let ranking = LanguageModel::new(&index, 1.0).ranking("c");
        assert_eq!(ranking, vec![2, 3]);
    }

    #[test]
    fn empty_collection_is_empty_ranking() {
        let index = Index::from_term_frequencies(Vec::new(), Arc::new(Whitespace));
        assert!(LanguageModel::new(&index, 0.5).scores("a").is_empty());
    }
}
