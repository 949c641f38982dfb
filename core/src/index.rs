//! Forward and inverted term indexes over a [`Collection`].
//!
//! Both indexes are built in a single pass and never change afterwards, so an
//! [`Index`] can be shared by reference between any number of ranking models
//! and threads.

use crate::tokenizer::{EnglishStemmer, Tokenizer};
use crate::{Collection, DocId, Error, Result, TermFrequencies};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Doc id -> term frequency for one stem.
pub type Postings = BTreeMap<DocId, u32>;

static NO_POSTINGS: Postings = BTreeMap::new();

pub struct Index {
    forward: BTreeMap<DocId, TermFrequencies>,
    inverted: HashMap<String, Postings>,
    lengths: BTreeMap<DocId, u64>,
    total_occurrences: u64,
    idf: OnceCell<HashMap<String, f64>>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Index {
    /// Indexes the text of every document with the default English stemmer.
    pub fn build(collection: &Collection) -> Self {
        Self::with_tokenizer(collection, Arc::new(EnglishStemmer))
    }

    pub fn with_tokenizer(collection: &Collection, tokenizer: Arc<dyn Tokenizer>) -> Self {
        let docs: Vec<(DocId, TermFrequencies)> = collection
            .iter()
            .map(|doc| (doc.id, tokenizer.stems_of(&doc.text)))
            .collect();
        Self::from_term_frequencies(docs, tokenizer)
    }

    /// Builds the index from already-tokenized documents. Zero counts are dropped
    /// so that every posting has `tf >= 1`.
    pub fn from_term_frequencies<I>(docs: I, tokenizer: Arc<dyn Tokenizer>) -> Self
    where
        I: IntoIterator<Item = (DocId, TermFrequencies)>,
    {
        // Later entries for the same id replace earlier ones.
        let mut forward: BTreeMap<DocId, TermFrequencies> = docs.into_iter().collect();
        let mut inverted: HashMap<String, Postings> = HashMap::new();
        let mut lengths: BTreeMap<DocId, u64> = BTreeMap::new();
        let mut total_occurrences = 0u64;

        for (&doc_id, tfs) in forward.iter_mut() {
            tfs.retain(|_, tf| *tf > 0);
            let mut len = 0u64;
            for (stem, &tf) in tfs.iter() {
                inverted.entry(stem.clone()).or_default().insert(doc_id, tf);
                len += tf as u64;
            }
            lengths.insert(doc_id, len);
            total_occurrences += len;
        }

        tracing::info!(num_docs = forward.len(), num_stems = inverted.len(), total_occurrences, "index built");
        Self { forward, inverted, lengths, total_occurrences, idf: OnceCell::new(), tokenizer }
    }

    pub fn term_frequencies(&self, doc_id: DocId) -> Result<&TermFrequencies> {
        self.forward.get(&doc_id).ok_or(Error::NotFound(doc_id))
    }

    /// Postings of `stem`; empty for a stem the collection never contained.
    pub fn postings_for(&self, stem: &str) -> &Postings {
        self.inverted.get(stem).unwrap_or(&NO_POSTINGS)
    }

    pub fn contains_stem(&self, stem: &str) -> bool { self.inverted.contains_key(stem) }

    /// Number of documents containing each stem, counted over the forward index.
    pub fn document_frequency(&self) -> HashMap<String, u32> {
        let mut df: HashMap<String, u32> = HashMap::new();
        for tfs in self.forward.values() {
            for stem in tfs.keys() {
                *df.entry(stem.clone()).or_insert(0) += 1;
            }
        }
        df
    }

    /// `ln((1 + N) / (1 + df))` per stem, computed on first use.
    pub fn idf(&self) -> &HashMap<String, f64> {
        self.idf.get_or_init(|| {
            let n = self.forward.len() as f64;
            self.document_frequency()
                .into_iter()
                .map(|(stem, df)| (stem, ((1.0 + n) / (1.0 + df as f64)).ln()))
                .collect()
        })
    }

    pub fn idf_of(&self, stem: &str) -> Option<f64> { self.idf().get(stem).copied() }

    pub fn tf_idf(&self, doc_id: DocId) -> Result<HashMap<String, f64>> {
        let idf = self.idf();
        Ok(self
            .term_frequencies(doc_id)?
            .iter()
            .map(|(stem, &tf)| (stem.clone(), tf as f64 * idf[stem]))
            .collect())
    }

    /// tf-idf of `stem` in every document that contains it.
    pub fn tf_idf_for_stem(&self, stem: &str) -> BTreeMap<DocId, f64> {
        let idf = self.idf_of(stem).unwrap_or(0.0);
        self.postings_for(stem).iter().map(|(&d, &tf)| (d, tf as f64 * idf)).collect()
    }

    /// Sum of the document's term frequencies.
    pub fn document_length(&self, doc_id: DocId) -> Result<u64> {
        self.lengths.get(&doc_id).copied().ok_or(Error::NotFound(doc_id))
    }

    pub(crate) fn lengths(&self) -> &BTreeMap<DocId, u64> { &self.lengths }

    /// Occurrences of every stem across the whole collection.
    pub fn total_occurrences(&self) -> u64 { self.total_occurrences }

    /// Occurrences of `stem` across the whole collection.
    pub fn collection_frequency(&self, stem: &str) -> u64 {
        self.postings_for(stem).values().map(|&tf| tf as u64).sum()
    }

    pub fn average_document_length(&self) -> f64 {
        if self.forward.is_empty() {
            return 0.0;
        }
        self.total_occurrences as f64 / self.forward.len() as f64
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ { self.forward.keys().copied() }

    pub fn num_docs(&self) -> usize { self.forward.len() }

    pub fn num_stems(&self) -> usize { self.inverted.len() }

    /// Stems of a query, produced by the same tokenizer the documents went through.
    pub fn query_stems(&self, text: &str) -> TermFrequencies { self.tokenizer.stems_of(text) }
}
