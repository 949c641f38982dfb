use crate::{Collection, DocId};
use std::collections::BTreeMap;

/// Citer -> number of times it cites a document.
pub type Citers = BTreeMap<DocId, u32>;

static NO_CITERS: Citers = BTreeMap::new();

/// Who cites whom, with multiplicities. Built once from document links.
#[derive(Debug, Clone, Default)]
pub struct CitationGraph {
    links_from: BTreeMap<DocId, Vec<DocId>>,
    links_to: BTreeMap<DocId, Citers>,
}

impl CitationGraph {
    pub fn from_collection(collection: &Collection) -> Self {
        Self::from_links(collection.iter().map(|doc| (doc.id, doc.outbound().to_vec())))
    }

    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (DocId, Vec<DocId>)>,
    {
        let links_from: BTreeMap<DocId, Vec<DocId>> = links.into_iter().collect();
        let mut links_to: BTreeMap<DocId, Citers> = BTreeMap::new();
        for (&from, cited) in &links_from {
            for &to in cited {
                *links_to.entry(to).or_default().entry(from).or_insert(0) += 1;
            }
        }
        Self { links_from, links_to }
    }

    /// Documents cited by `doc_id`, in file order, repeats included.
    pub fn cited_by(&self, doc_id: DocId) -> &[DocId] {
        self.links_from.get(&doc_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents citing `doc_id` and how many times each does.
    pub fn citers_of(&self, doc_id: DocId) -> &Citers {
        self.links_to.get(&doc_id).unwrap_or(&NO_CITERS)
    }

    /// Citers of `doc_id` with each citer repeated once per citation.
    pub fn citer_multiset(&self, doc_id: DocId) -> Vec<DocId> {
        self.citers_of(doc_id)
            .iter()
            .flat_map(|(&citer, &count)| std::iter::repeat(citer).take(count as usize))
            .collect()
    }

    pub fn num_citations(&self) -> usize { self.links_from.values().map(Vec::len).sum() }
}
