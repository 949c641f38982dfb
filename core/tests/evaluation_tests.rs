use rand::rngs::StdRng;
use rand::SeedableRng;
use ri_core::eval::metrics::{AveragePrecision, FirstRelevantRank};
use ri_core::eval::{CrossValidation, Evaluator, GridSearch, MetricKind, ModelFamily};
use ri_core::parser::{load_collection, load_queries};
use ri_core::{CitationGraph, Index, ModelSpec, Query};
use std::fs;
use tempfile::tempdir;

const DOCS: &str = "\
.I 1
.T
Sorting networks
.W
sorting networks sort keys in parallel
.X
2\t5\t1
3\t5\t1
.I 2
.W
parallel sorting algorithms and sorting networks
.X
3\t5\t2
.I 3
.W
compilers translate programming languages
.I 4
.W
parsing programming languages with grammars
.X
3\t5\t4
3\t5\t4
.I 5
.W
hash tables and search trees
";

const QRY: &str = "\
.I 1
.W
parallel sorting
.I 2
.W
programming language compilers
.I 3
.W
search trees
";

const REL: &str = "\
01 1 0 0
01 2 0 1
02 3 0 0
02 4 0 0
03 5 0 0
";

fn fixtures() -> (ri_core::Collection, Vec<Query>) {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("docs.txt");
    let qry = dir.path().join("docs.qry");
    let rel = dir.path().join("docs.rel");
    fs::write(&docs, DOCS).unwrap();
    fs::write(&qry, QRY).unwrap();
    fs::write(&rel, REL).unwrap();
    let collection = load_collection(&docs).unwrap();
    let queries = load_queries(&qry, &rel).unwrap().into_values().collect();
    (collection, queries)
}

#[test]
fn parses_files_from_disk() {
    let (collection, queries) = fixtures();
    assert_eq!(collection.len(), 5);
    assert_eq!(collection.get(4).unwrap().outbound(), &[3, 3]);
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[0].relevant.get(&2), Some(&1.0));

    let graph = CitationGraph::from_collection(&collection);
    assert_eq!(graph.citer_multiset(3), vec![1, 2, 4, 4]);
}

#[test]
fn models_retrieve_judged_documents() {
    let (collection, queries) = fixtures();
    let index = Index::build(&collection);
    let evaluator = Evaluator::new(&queries);
    for spec in [ModelSpec::language(), ModelSpec::okapi()] {
        let model = spec.build(&index).unwrap();
        let summary = evaluator.summarize(model.as_ref(), &AveragePrecision);
        assert_eq!(summary.queries, 3);
        assert!(summary.mean > 0.9, "{spec}: {summary:?}");
        let ranks = evaluator.per_query(model.as_ref(), &FirstRelevantRank);
        assert!(ranks.iter().all(|(_, r)| *r == 0.0), "{spec}: {ranks:?}");
    }
}

#[test]
fn grid_search_picks_a_grid_point() {
    let (collection, queries) = fixtures();
    let index = Index::build(&collection);
    let metric = MetricKind::Ndcg.build(None);
    let search = GridSearch::new(&index, metric.as_ref(), 0.5).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let report = search.run(ModelFamily::Okapi, &queries, 0.7, &mut rng).unwrap();
    assert_eq!(report.train_queries + report.test_queries, 3);
    assert!(matches!(report.best, ModelSpec::Okapi { .. }));
    assert!(ModelFamily::Okapi.grid(0.5).contains(&report.best));
}

#[test]
fn rank_metrics_are_minimized() {
    let (collection, queries) = fixtures();
    let index = Index::build(&collection);
    let metric = FirstRelevantRank;
    let search = GridSearch::new(&index, &metric, 0.5).unwrap();
    let (_, score) = search.best_params(ModelFamily::Language, &queries).unwrap();
    assert_eq!(score, 0.0);
}

#[test]
fn cross_validation_averages_fold_choices() {
    let (collection, queries) = fixtures();
    let index = Index::build(&collection);
    let metric = MetricKind::AvgP.build(None);
    let search = GridSearch::new(&index, metric.as_ref(), 0.25).unwrap();
    let cv = CrossValidation::new(search, 3).unwrap();
    let report = cv.run(ModelFamily::Language, &queries, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(report.folds.len(), 3);
    match report.mean_params {
        ModelSpec::Language { lambda } => assert!((0.0..=1.0).contains(&lambda)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn invalid_harness_settings_are_errors() {
    let (collection, _) = fixtures();
    let index = Index::build(&collection);
    let metric = MetricKind::Precision.build(Some(5));
    assert!(GridSearch::new(&index, metric.as_ref(), 0.0).is_err());
    let search = GridSearch::new(&index, metric.as_ref(), 0.5).unwrap();
    assert!(CrossValidation::new(search, 1).is_err());
}
