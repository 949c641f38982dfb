//! Term-weighting strategies used by the vector-space model.
//!
//! | scheme            | document weight     | query weight        |
//! |-------------------|---------------------|---------------------|
//! | `BinaryQuery`     | tf                  | 1                   |
//! | `Raw`             | tf                  | tf                  |
//! | `IdfQuery`        | tf                  | idf                 |
//! | `LogTfIdfQuery`   | 1 + ln(tf)          | idf                 |
//! | `LogTfIdf`        | (1 + ln(tf)) * idf  | (1 + ln(tf)) * idf  |
//!
//! Idf-based query vectors only keep stems the collection contains.

use crate::index::Index;
use crate::{DocId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type WeightVector = HashMap<String, f64>;

pub trait Weighter: Send + Sync {
    /// Weight of every stem of a document. Fails for an unknown document.
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector>;
    /// Weight of `stem` in each document that contains it.
    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64>;
    fn weights_for_query(&self, text: &str) -> WeightVector;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightingScheme {
    BinaryQuery,
    Raw,
    IdfQuery,
    LogTfIdfQuery,
    #[default]
    LogTfIdf,
}

impl WeightingScheme {
    pub const ALL: [WeightingScheme; 5] = [
        WeightingScheme::BinaryQuery,
        WeightingScheme::Raw,
        WeightingScheme::IdfQuery,
        WeightingScheme::LogTfIdfQuery,
        WeightingScheme::LogTfIdf,
    ];

    pub fn build<'a>(self, index: &'a Index) -> Box<dyn Weighter + 'a> {
        match self {
            WeightingScheme::BinaryQuery => Box::new(BinaryQuery { index }),
            WeightingScheme::Raw => Box::new(Raw { index }),
            WeightingScheme::IdfQuery => Box::new(IdfQuery { index }),
            WeightingScheme::LogTfIdfQuery => Box::new(LogTfIdfQuery { index }),
            WeightingScheme::LogTfIdf => Box::new(LogTfIdf { index }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeightingScheme::BinaryQuery => "binary-query",
            WeightingScheme::Raw => "raw",
            WeightingScheme::IdfQuery => "idf-query",
            WeightingScheme::LogTfIdfQuery => "log-tf-idf-query",
            WeightingScheme::LogTfIdf => "log-tf-idf",
        }
    }
}

fn log_tf(tf: u32) -> f64 { 1.0 + (tf as f64).ln() }

fn raw_doc_weights(index: &Index, doc_id: DocId) -> Result<WeightVector> {
    Ok(index.term_frequencies(doc_id)?.iter().map(|(s, &tf)| (s.clone(), tf as f64)).collect())
}

fn raw_stem_weights(index: &Index, stem: &str) -> BTreeMap<DocId, f64> {
    index.postings_for(stem).iter().map(|(&d, &tf)| (d, tf as f64)).collect()
}

/// idf of every query stem the collection knows about.
fn idf_query_weights(index: &Index, text: &str) -> WeightVector {
    let idf = index.idf();
    index
        .query_stems(text)
        .into_keys()
        .filter_map(|stem| idf.get(&stem).map(|&w| (stem, w)))
        .collect()
}

pub struct BinaryQuery<'a> {
    index: &'a Index,
}

impl Weighter for BinaryQuery<'_> {
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector> { raw_doc_weights(self.index, doc_id) }

    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> { raw_stem_weights(self.index, stem) }

    fn weights_for_query(&self, text: &str) -> WeightVector {
        self.index.query_stems(text).into_keys().map(|stem| (stem, 1.0)).collect()
    }
}

pub struct Raw<'a> {
    index: &'a Index,
}

impl Weighter for Raw<'_> {
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector> { raw_doc_weights(self.index, doc_id) }

    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> { raw_stem_weights(self.index, stem) }

    fn weights_for_query(&self, text: &str) -> WeightVector {
        self.index.query_stems(text).into_iter().map(|(stem, tf)| (stem, tf as f64)).collect()
    }
}

pub struct IdfQuery<'a> {
    index: &'a Index,
}

impl Weighter for IdfQuery<'_> {
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector> { raw_doc_weights(self.index, doc_id) }

    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> { raw_stem_weights(self.index, stem) }

    fn weights_for_query(&self, text: &str) -> WeightVector { idf_query_weights(self.index, text) }
}

pub struct LogTfIdfQuery<'a> {
    index: &'a Index,
}

impl Weighter for LogTfIdfQuery<'_> {
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector> {
        Ok(self.index.term_frequencies(doc_id)?.iter().map(|(s, &tf)| (s.clone(), log_tf(tf))).collect())
    }

    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> {
        self.index.postings_for(stem).iter().map(|(&d, &tf)| (d, log_tf(tf))).collect()
    }

    fn weights_for_query(&self, text: &str) -> WeightVector { idf_query_weights(self.index, text) }
}

pub struct LogTfIdf<'a> {
    index: &'a Index,
}

impl Weighter for LogTfIdf<'_> {
    fn weights_for_doc(&self, doc_id: DocId) -> Result<WeightVector> {
        let idf = self.index.idf();
        Ok(self
            .index
            .term_frequencies(doc_id)?
            .iter()
            .map(|(s, &tf)| (s.clone(), log_tf(tf) * idf[s]))
            .collect())
    }

    fn weights_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> {
        let idf = self.index.idf_of(stem).unwrap_or(0.0);
        self.index.postings_for(stem).iter().map(|(&d, &tf)| (d, log_tf(tf) * idf)).collect()
    }

    /// Stems with an idf of exactly zero (present in every document) are dropped too.
    fn weights_for_query(&self, text: &str) -> WeightVector {
        let idf = self.index.idf();
        self.index
            .query_stems(text)
            .into_iter()
            .filter_map(|(stem, tf)| match idf.get(&stem) {
                Some(&w) if w != 0.0 => Some((stem, log_tf(tf) * w)),
                _ => None,
            })
            .collect()
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
    fn binary_query_keeps_unknown_terms() {
        let index = index();
        let w = WeightingScheme::BinaryQuery.build(&index).weights_for_query("a zzz a");
        assert_eq!(w.len(), 2);
        assert_eq!(w["a"], 1.0);
    }

    #[test]
    fn idf_query_drops_unknown_terms() {
        let index = index();
        for scheme in [WeightingScheme::IdfQuery, WeightingScheme::LogTfIdfQuery, WeightingScheme::LogTfIdf] {
            let w = scheme.build(&index).weights_for_query("a zzz");
            assert!(!w.contains_key("zzz"), "{}", scheme.name());
            assert!(w.contains_key("a"), "{}", scheme.name());
        }
    }

    #[test]
    fn log_tf_doc_weights() {
        let index = index();
        let w = WeightingScheme::LogTfIdfQuery.build(&index).weights_for_doc(2).unwrap();
        assert!((w["c"] - (1.0 + 3f64.ln())).abs() < 1e-12);
        assert_eq!(w["a"], 1.0);
    }

    #[test]
    fn stem_and_doc_views_agree() {
        let index = index();
        for scheme in WeightingScheme::ALL {
            let weighter = scheme.build(&index);
            for (doc, w) in weighter.weights_for_stem("c") {
                assert_eq!(weighter.weights_for_doc(doc).unwrap()["c"], w, "{}", scheme.name());
            }
        }
    }

    #[test]
    fn log_tf_idf_drops_zero_idf_query_terms() {
        let index = Index::from_term_frequencies(
            vec![
                (1, [("x".to_string(), 1)].into_iter().collect()),
                (2, [("x".to_string(), 1)].into_iter().collect()),
            ],
            Arc::new(Whitespace),
        );
        // idf(x) = ln(3/3) = 0
        assert!(WeightingScheme::LogTfIdf.build(&index).weights_for_query("x").is_empty());
        assert_eq!(WeightingScheme::IdfQuery.build(&index).weights_for_query("x").len(), 1);
    }
}
