pub mod config;
pub mod error;
pub mod eval;
pub mod graph;
pub mod index;
pub mod model;
pub mod pagerank;
pub mod parser;
pub mod tokenizer;
pub mod weighting;

pub use error::{Error, Result};
pub use graph::CitationGraph;
pub use index::Index;
pub use model::{ModelSpec, RankingModel};
pub use weighting::{Weighter, WeightingScheme};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;
pub type QueryId = u32;

/// Stem -> number of occurrences, as produced by a [`tokenizer::Tokenizer`].
pub type TermFrequencies = HashMap<String, u32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub date: String,
    pub author: String,
    pub keywords: String,
    /// Indexed body. Only this field feeds the index.
    pub text: String,
    /// Outbound citations in file order. Repeats count as stronger citations.
    pub links: Option<Vec<DocId>>,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), ..Self::default() }
    }

    pub fn with_links(mut self, links: Vec<DocId>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn outbound(&self) -> &[DocId] {
        self.links.as_deref().unwrap_or(&[])
    }
}

/// Documents keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    docs: BTreeMap<DocId, Document>,
}

impl Collection {
    pub fn new() -> Self { Self::default() }

    pub fn from_documents<I: IntoIterator<Item = Document>>(docs: I) -> Self {
        Self { docs: docs.into_iter().map(|d| (d.id, d)).collect() }
    }

    /// Inserts a document, returning the one it replaced if the id was taken.
    pub fn insert(&mut self, doc: Document) -> Option<Document> {
        self.docs.insert(doc.id, doc)
    }

    pub fn get(&self, id: DocId) -> Option<&Document> { self.docs.get(&id) }

    pub fn iter(&self) -> impl Iterator<Item = &Document> { self.docs.values() }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub text: String,
    /// Judged-relevant documents and their grade. Absent means not relevant.
    pub relevant: BTreeMap<DocId, f64>,
}

impl Query {
    pub fn new(id: QueryId, text: impl Into<String>) -> Self {
        Self { id, text: text.into(), relevant: BTreeMap::new() }
    }

    pub fn with_relevant(mut self, doc_id: DocId, grade: f64) -> Self {
        self.relevant.insert(doc_id, grade);
        self
    }

    pub fn is_relevant(&self, doc_id: DocId) -> bool { self.relevant.contains_key(&doc_id) }
}
