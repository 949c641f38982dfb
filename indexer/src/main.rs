use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ri_core::config::EngineConfig;
use ri_core::eval::{CrossValidation, Evaluator, GridSearch, MetricKind, ModelFamily};
use ri_core::pagerank::PageRank;
use ri_core::parser::{load_collection, load_queries};
use ri_core::{CitationGraph, Collection, DocId, Index, ModelSpec, Query, QueryId, RankingModel, WeightingScheme};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Index a tagged-field collection, rank queries and evaluate ranking models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Collection file (.I/.T/.W/.X records)
    #[arg(long)]
    docs: PathBuf,
    /// JSON engine config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct Judgments {
    /// Query file
    #[arg(long)]
    qry: PathBuf,
    /// Relevance judgments (`queryId docId _ grade`)
    #[arg(long)]
    rel: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Vector,
    Language,
    Okapi,
}

#[derive(Clone, Copy, ValueEnum)]
enum FamilyArg {
    Language,
    Okapi,
}

impl From<FamilyArg> for ModelFamily {
    fn from(f: FamilyArg) -> Self {
        match f {
            FamilyArg::Language => ModelFamily::Language,
            FamilyArg::Okapi => ModelFamily::Okapi,
        }
    }
}

#[derive(Args)]
struct ModelOpts {
    #[arg(long, value_enum, default_value_t = ModelArg::Okapi)]
    model: ModelArg,
    /// Weighting scheme of the vector model (binary-query, raw, idf-query, log-tf-idf-query, log-tf-idf)
    #[arg(long, value_parser = parse_scheme)]
    scheme: Option<WeightingScheme>,
    /// Cosine-normalize vector model scores
    #[arg(long)]
    normalized: Option<bool>,
    #[arg(long)]
    lambda: Option<f64>,
    #[arg(long)]
    k: Option<f64>,
    #[arg(long)]
    b: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collection statistics, or the index entries of one document or stem
    Stats {
        #[command(flatten)]
        common: Common,
        #[arg(long)]
        doc: Option<DocId>,
        /// Already-stemmed term
        #[arg(long)]
        stem: Option<String>,
    },
    /// Rank documents for a query
    Search {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        model: ModelOpts,
        #[arg(long, conflicts_with = "query_id")]
        query: Option<String>,
        /// Query from --qry (requires --qry and --rel)
        #[arg(long, requires_all = ["qry", "rel"])]
        query_id: Option<QueryId>,
        #[arg(long)]
        qry: Option<PathBuf>,
        #[arg(long)]
        rel: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Evaluate every model under every metric
    Eval {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        judgments: Judgments,
        /// k of precision/recall/f-measure and p of dcg/ndcg
        #[arg(long)]
        cutoff: Option<usize>,
    },
    /// Grid search, or cross-validation with --folds
    Tune {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        judgments: Judgments,
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long, value_parser = parse_metric, default_value = "avg-p")]
        metric: MetricKind,
        #[arg(long)]
        cutoff: Option<usize>,
        #[arg(long)]
        step: Option<f64>,
        /// Train share of the queries
        #[arg(long, conflicts_with = "folds")]
        ratio: Option<f64>,
        #[arg(long)]
        folds: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// PageRank over the citation neighbourhood of a query's top results
    Pagerank {
        #[command(flatten)]
        common: Common,
        #[command(flatten)]
        model: ModelOpts,
        #[arg(long)]
        query: String,
        #[arg(long)]
        seeds: Option<usize>,
        #[arg(long)]
        citers: Option<usize>,
        #[arg(long)]
        damping: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { common, doc, stem } => stats(&common, doc, stem.as_deref()),
        Commands::Search { common, model, query, query_id, qry, rel, top } => {
            let text = match (query, query_id, qry, rel) {
                (Some(text), _, _, _) => text,
                (None, Some(id), Some(qry), Some(rel)) => {
                    let queries = load_queries(&qry, &rel).with_context(|| format!("loading {}", qry.display()))?;
                    queries.get(&id).map(|q| q.text.clone()).with_context(|| format!("no query {id}"))?
                }
                _ => bail!("pass --query or --query-id with --qry and --rel"),
            };
            search(&common, &model, &text, top)
        }
        Commands::Eval { common, judgments, cutoff } => evaluate(&common, &judgments, cutoff),
        Commands::Tune { common, judgments, family, metric, cutoff, step, ratio, folds, seed } => {
            let mut config = load_config(&common)?;
            config.tuning.step = step.unwrap_or(config.tuning.step);
            config.tuning.ratio = ratio.unwrap_or(config.tuning.ratio);
            config.tuning.seed = seed.or(config.tuning.seed);
            if let Some(folds) = folds {
                config.tuning.folds = folds;
            }
            config.validate()?;
            tune(&common, &judgments, &config, family.into(), metric, cutoff, folds.is_some())
        }
        Commands::Pagerank { common, model, query, seeds, citers, damping, seed, top } => {
            let mut config = load_config(&common)?;
            config.pagerank.seeds = seeds.unwrap_or(config.pagerank.seeds);
            config.pagerank.citers = citers.unwrap_or(config.pagerank.citers);
            config.pagerank.damping = damping.unwrap_or(config.pagerank.damping);
            config.tuning.seed = seed.or(config.tuning.seed);
            config.validate()?;
            pagerank(&common, &config, &model, &query, top)
        }
    }
}

fn parse_scheme(s: &str) -> std::result::Result<WeightingScheme, String> {
    WeightingScheme::ALL
        .into_iter()
        .find(|scheme| scheme.name() == s)
        .ok_or_else(|| format!("unknown weighting scheme {s:?}"))
}

fn parse_metric(s: &str) -> std::result::Result<MetricKind, String> {
    MetricKind::ALL
        .into_iter()
        .find(|metric| metric.name() == s)
        .ok_or_else(|| format!("unknown metric {s:?}"))
}

fn load_config(common: &Common) -> Result<EngineConfig> {
    match &common.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_docs(common: &Common) -> Result<Collection> {
    load_collection(&common.docs).with_context(|| format!("loading collection {}", common.docs.display()))
}

fn load_judged(judgments: &Judgments) -> Result<Vec<Query>> {
    let queries = load_queries(&judgments.qry, &judgments.rel)
        .with_context(|| format!("loading queries {}", judgments.qry.display()))?;
    Ok(queries.into_values().collect())
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Config values first, then whatever the flags set.
fn model_spec(config: &EngineConfig, opts: &ModelOpts) -> ModelSpec {
    match opts.model {
        ModelArg::Vector => ModelSpec::Vector {
            scheme: opts.scheme.unwrap_or(config.vector.scheme),
            normalized: opts.normalized.unwrap_or(config.vector.normalized),
        },
        ModelArg::Language => ModelSpec::Language { lambda: opts.lambda.unwrap_or(config.language.lambda) },
        ModelArg::Okapi => ModelSpec::Okapi {
            k: opts.k.unwrap_or(config.okapi.k),
            b: opts.b.unwrap_or(config.okapi.b),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn stats(common: &Common, doc: Option<DocId>, stem: Option<&str>) -> Result<()> {
    let collection = load_docs(common)?;
    let index = Index::build(&collection);
    if let Some(doc_id) = doc {
        return print_json(&json!({
            "doc": doc_id,
            "length": index.document_length(doc_id)?,
            "tf": index.term_frequencies(doc_id)?,
            "tf_idf": index.tf_idf(doc_id)?,
        }));
    }
    if let Some(stem) = stem {
        return print_json(&json!({
            "stem": stem,
            "idf": index.idf_of(stem),
            "postings": index.postings_for(stem),
            "tf_idf": index.tf_idf_for_stem(stem),
        }));
    }
    let graph = CitationGraph::from_collection(&collection);
    print_json(&json!({
        "documents": index.num_docs(),
        "stems": index.num_stems(),
        "occurrences": index.total_occurrences(),
        "average_length": index.average_document_length(),
        "citations": graph.num_citations(),
    }))
}

fn search(common: &Common, opts: &ModelOpts, query: &str, top: usize) -> Result<()> {
    let config = load_config(common)?;
    let collection = load_docs(common)?;
    let index = Index::build(&collection);
    let spec = model_spec(&config, opts);
    let model = spec.build(&index)?;
    let results: Vec<_> = model
        .ranked(query)
        .into_iter()
        .take(top)
        .map(|(doc_id, score)| {
            let title = collection.get(doc_id).map(|d| d.title.as_str()).unwrap_or_default();
            json!({ "doc": doc_id, "score": score, "title": title })
        })
        .collect();
    tracing::info!(model = %spec, hits = results.len(), "search done");
    print_json(&json!({ "model": spec, "query": query, "results": results }))
}

fn evaluate(common: &Common, judgments: &Judgments, cutoff: Option<usize>) -> Result<()> {
    let config = load_config(common)?;
    let index = Index::build(&load_docs(common)?);
    let queries = load_judged(judgments)?;
    let evaluator = Evaluator::new(&queries);

    let mut specs: Vec<ModelSpec> = WeightingScheme::ALL
        .into_iter()
        .map(|scheme| ModelSpec::Vector { scheme, normalized: config.vector.normalized })
        .collect();
    specs.push(ModelSpec::Language { lambda: config.language.lambda });
    specs.push(ModelSpec::Okapi { k: config.okapi.k, b: config.okapi.b });

    let mut rows = Vec::with_capacity(specs.len());
    for spec in specs {
        let model = spec.build(&index)?;
        let metrics: serde_json::Map<String, serde_json::Value> = MetricKind::ALL
            .into_iter()
            .map(|kind| {
                let summary = evaluator.summarize(model.as_ref(), kind.build(cutoff).as_ref());
                Ok((kind.name().to_string(), serde_json::to_value(summary)?))
            })
            .collect::<Result<_>>()?;
        tracing::info!(model = %spec, "evaluated");
        rows.push(json!({ "model": spec, "label": spec.to_string(), "metrics": metrics }));
    }
    print_json(&rows)
}

fn tune(
    common: &Common,
    judgments: &Judgments,
    config: &EngineConfig,
    family: ModelFamily,
    metric: MetricKind,
    cutoff: Option<usize>,
    cross_validate: bool,
) -> Result<()> {
    let index = Index::build(&load_docs(common)?);
    let queries = load_judged(judgments)?;
    let metric = metric.build(cutoff);
    let search = GridSearch::new(&index, metric.as_ref(), config.tuning.step)?;
    let mut rng = rng_for(config.tuning.seed);
    if cross_validate {
        let report = CrossValidation::new(search, config.tuning.folds)?.run(family, &queries, &mut rng)?;
        print_json(&report)
    } else {
        let report = search.run(family, &queries, config.tuning.ratio, &mut rng)?;
        print_json(&report)
    }
}

fn pagerank(common: &Common, config: &EngineConfig, opts: &ModelOpts, query: &str, top: usize) -> Result<()> {
    let collection = load_docs(common)?;
    let index = Index::build(&collection);
    let graph = CitationGraph::from_collection(&collection);
    let spec = model_spec(config, opts);
    let model = spec.build(&index)?;
    let pagerank = PageRank::new(model.as_ref(), &graph, config.pagerank)?;
    let mut rng = rng_for(config.tuning.seed);
    let stationary = pagerank.run(query, &mut rng)?;
    let results: Vec<_> = stationary
        .scores
        .iter()
        .take(top)
        .map(|(doc_id, score)| json!({ "doc": doc_id, "score": score }))
        .collect();
    print_json(&json!({
        "model": spec,
        "query": query,
        "nodes": stationary.scores.len(),
        "iterations": stationary.iterations,
        "delta": stationary.delta,
        "converged": stationary.converged,
        "results": results,
    }))
}
