//! PageRank over a citation subgraph sampled around the top of a ranking.
//!
//! The full citation graph is never materialized: seeds come from a
//! [`RankingModel`], each seed contributes its outbound citations plus a
//! random sample of its citers, and the stationary distribution is computed
//! by power iteration on that subgraph only.

use crate::config::PageRankConfig;
use crate::graph::CitationGraph;
use crate::model::RankingModel;
use crate::{DocId, Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Directed multigraph: source -> targets, repeats meaning parallel edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    edges: BTreeMap<DocId, Vec<DocId>>,
}

impl Subgraph {
    /// Every outbound citation of each seed, plus up to `citers` citers per seed
    /// drawn without replacement from the citation multiset.
    pub fn sample<R: Rng + ?Sized>(seeds: &[DocId], graph: &CitationGraph, citers: usize, rng: &mut R) -> Self {
        let mut subgraph = Subgraph::default();
        for &seed in seeds {
            let out = subgraph.edges.entry(seed).or_default();
            out.extend_from_slice(graph.cited_by(seed));

            let pool = graph.citer_multiset(seed);
            let picked: Vec<DocId> = pool.choose_multiple(rng, citers.min(pool.len())).copied().collect();
            for citer in picked {
                subgraph.add_edge(citer, seed);
            }
        }
        subgraph
    }

    pub fn from_edges<I: IntoIterator<Item = (DocId, DocId)>>(edges: I) -> Self {
        let mut subgraph = Subgraph::default();
        for (from, to) in edges {
            subgraph.add_edge(from, to);
        }
        subgraph
    }

    pub fn add_edge(&mut self, from: DocId, to: DocId) {
        self.edges.entry(from).or_default().push(to);
    }

    pub fn edges_from(&self, node: DocId) -> &[DocId] {
        self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sources and targets, ascending.
    pub fn nodes(&self) -> Vec<DocId> {
        let mut nodes: BTreeSet<DocId> = self.edges.keys().copied().collect();
        nodes.extend(self.edges.values().flatten().copied());
        nodes.into_iter().collect()
    }

    pub fn num_edges(&self) -> usize { self.edges.values().map(Vec::len).sum() }
}

/// Row-stochastic matrix over the sorted nodes of a [`Subgraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    nodes: Vec<DocId>,
    rows: Vec<Vec<f64>>,
    sinks: usize,
}

impl TransitionMatrix {
    /// Row `i` holds edge counts from node `i`, normalized to sum to one.
    /// A node without outgoing edges jumps uniformly to every node.
    pub fn from_subgraph(subgraph: &Subgraph) -> Self {
        let nodes = subgraph.nodes();
        let n = nodes.len();
        let position: BTreeMap<DocId, usize> = nodes.iter().enumerate().map(|(i, &d)| (d, i)).collect();

        let mut sinks = 0;
        let rows = nodes
            .iter()
            .map(|&node| {
                let targets = subgraph.edges_from(node);
                if targets.is_empty() {
                    sinks += 1;
                    return vec![1.0 / n as f64; n];
                }
                let mut row = vec![0.0; n];
                for to in targets {
                    row[position[to]] += 1.0;
                }
                let total = targets.len() as f64;
                row.iter_mut().for_each(|p| *p /= total);
                row
            })
            .collect();
        if sinks > 0 {
            tracing::debug!(sinks, nodes = n, "sink rows redistributed uniformly");
        }
        Self { nodes, rows, sinks }
    }

    pub fn nodes(&self) -> &[DocId] { &self.nodes }

    pub fn row(&self, i: usize) -> &[f64] { &self.rows[i] }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Rows that had no outgoing edge before correction.
    pub fn sinks(&self) -> usize { self.sinks }

    /// Power iteration `s' = d * P^T s + (1 - d) * prior`, renormalized each step.
    ///
    /// `prior` defaults to uniform and must have one entry per node. Reaching
    /// `max_iter` is not an error; the result reports `converged = false`.
    pub fn stationary(&self, config: &PageRankConfig, prior: Option<&[f64]>) -> Result<Stationary> {
        let n = self.len();
        let prior: Vec<f64> = match prior {
            Some(p) => check_prior(p, n)?.to_vec(),
            None => vec![1.0 / n.max(1) as f64; n],
        };
        if n == 0 {
            return Ok(Stationary { scores: Vec::new(), iterations: 0, delta: 0.0, converged: true });
        }

        let d = config.damping;
        let mut current = vec![1.0 / n as f64; n];
        let mut iterations = 0;
        let mut delta;
        loop {
            let mut next: Vec<f64> = prior.iter().map(|a| (1.0 - d) * a).collect();
            for (row, &s) in self.rows.iter().zip(current.iter()) {
                for (j, &p) in row.iter().enumerate() {
                    next[j] += d * p * s;
                }
            }
            let total: f64 = next.iter().sum();
            if total > 0.0 {
                next.iter_mut().for_each(|x| *x /= total);
            }
            delta = next.iter().zip(current.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>() / n as f64;
            current = next;
            iterations += 1;
            if delta <= config.eps || iterations >= config.max_iter {
                break;
            }
        }

        let converged = delta <= config.eps;
        if converged {
            tracing::info!(iterations, nodes = n, "pagerank converged");
        } else {
            tracing::warn!(iterations, delta, "pagerank stopped at max_iter before converging");
        }

        let mut scores: Vec<(DocId, f64)> = self.nodes.iter().copied().zip(current).collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(Stationary { scores, iterations, delta, converged })
    }
}

/// One finite, non-negative weight per node, with a positive sum.
fn check_prior(prior: &[f64], n: usize) -> Result<&[f64]> {
    if prior.len() != n {
        return Err(Error::InvalidPrior(format!("{} entries for {n} nodes", prior.len())));
    }
    if let Some(w) = prior.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvalidPrior(format!("weight {w} is not a finite non-negative number")));
    }
    if n > 0 && prior.iter().sum::<f64>() <= 0.0 {
        return Err(Error::InvalidPrior("weights sum to zero".into()));
    }
    Ok(prior)
}

/// Stationary distribution, best node first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stationary {
    pub scores: Vec<(DocId, f64)>,
    pub iterations: usize,
    /// Mean absolute change of the last iteration.
    pub delta: f64,
    pub converged: bool,
}

impl Stationary {
    pub fn score(&self, node: DocId) -> Option<f64> {
        self.scores.iter().find(|(d, _)| *d == node).map(|(_, s)| *s)
    }

    pub fn total(&self) -> f64 { self.scores.iter().map(|(_, s)| s).sum() }
}

/// Reranks the top of a model's ranking by citation popularity.
pub struct PageRank<'a> {
    model: &'a dyn RankingModel,
    graph: &'a CitationGraph,
    config: PageRankConfig,
}

impl<'a> PageRank<'a> {
    pub fn new(model: &'a dyn RankingModel, graph: &'a CitationGraph, config: PageRankConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, graph, config })
    }

    pub fn subgraph<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Subgraph {
        let seeds: Vec<DocId> = self.model.ranking(query).into_iter().take(self.config.seeds).collect();
        tracing::debug!(seeds = seeds.len(), query, "seeding pagerank subgraph");
        Subgraph::sample(&seeds, self.graph, self.config.citers, rng)
    }

    pub fn run<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Result<Stationary> {
        self.run_with_prior(query, None, rng)
    }

    pub fn run_with_prior<R: Rng + ?Sized>(&self, query: &str, prior: Option<&[f64]>, rng: &mut R) -> Result<Stationary> {
        let subgraph = self.subgraph(query, rng);
        let matrix = TransitionMatrix::from_subgraph(&subgraph);
        matrix.stationary(&self.config, prior)
    }
}
