use proptest::prelude::*;
use ri_core::model::{LanguageModel, Okapi, VectorSpace};
use ri_core::tokenizer::Whitespace;
use ri_core::{Error, Index, ModelSpec, RankingModel, TermFrequencies, WeightingScheme};
use std::sync::Arc;

fn tfs(pairs: &[(&str, u32)]) -> TermFrequencies {
    pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
}

fn index_of(docs: Vec<(u32, TermFrequencies)>) -> Index {
    Index::from_term_frequencies(docs, Arc::new(Whitespace))
}

fn three_docs() -> Index {
    index_of(vec![
        (1, tfs(&[("a", 2), ("b", 1)])),
        (2, tfs(&[("a", 1), ("c", 3)])),
        (3, tfs(&[("b", 2), ("c", 1)])),
    ])
}

#[test]
fn raw_vector_ranks_document_sharing_both_terms_first() {
    let index = three_docs();
    let model = ModelSpec::Vector { scheme: WeightingScheme::Raw, normalized: false }.build(&index).unwrap();
    assert_eq!(model.ranking("a b")[0], 1);
}

#[test]
fn every_model_prefers_d1_for_a_b() {
    let index = three_docs();
    let specs = [ModelSpec::language(), ModelSpec::okapi(), ModelSpec::Vector { scheme: WeightingScheme::LogTfIdf, normalized: true }];
    for spec in specs {
        assert_eq!(spec.build(&index).unwrap().ranking("a b")[0], 1, "{spec}");
    }
}

#[test]
fn out_of_range_hyperparameters_do_not_build() {
    let index = index_of(vec![
        (1, tfs(&[("a", 1), ("b", 1)])),
        (2, tfs(&[("x", 5)])),
        (3, tfs(&[("a", 1), ("y", 4)])),
    ]);
    let bad = [
        ModelSpec::Language { lambda: 2.0 },
        ModelSpec::Language { lambda: -0.5 },
        ModelSpec::Okapi { k: -1.0, b: 0.0 },
        ModelSpec::Okapi { k: 1.2, b: 1.5 },
    ];
    for spec in bad {
        assert!(matches!(spec.build(&index), Err(Error::InvalidConfig(_))), "{spec}");
    }
    // boundaries stay valid; lambda = 1 drops documents missing a query stem
    let model = ModelSpec::Language { lambda: 1.0 }.build(&index).unwrap();
    assert_eq!(model.ranking("a b"), vec![1]);
}

#[test]
fn empty_query_scores_nothing() {
    let index = three_docs();
    let mut specs: Vec<ModelSpec> = WeightingScheme::ALL
        .into_iter()
        .map(|scheme| ModelSpec::Vector { scheme, normalized: true })
        .collect();
    specs.extend([ModelSpec::language(), ModelSpec::okapi()]);
    for spec in specs {
        let model = spec.build(&index).unwrap();
        assert!(model.scores("").is_empty(), "{spec}");
        assert!(model.scores("   ").is_empty(), "{spec}");
    }
}

#[test]
fn binary_query_on_unit_tf_counts_overlap() {
    let index = index_of(vec![
        (1, tfs(&[("a", 1), ("x", 1)])),
        (2, tfs(&[("a", 1), ("b", 1), ("c", 1)])),
        (3, tfs(&[("a", 1), ("b", 1), ("y", 1)])),
        (4, tfs(&[("z", 1)])),
    ]);
    let model = VectorSpace::new(&index, WeightingScheme::BinaryQuery.build(&index), false).unwrap();
    let scores = model.scores("a b c");
    assert_eq!(scores[&1], 1.0);
    assert_eq!(scores[&2], 3.0);
    assert_eq!(scores[&3], 2.0);
    assert_eq!(model.ranking("a b c"), vec![2, 3, 1]);
}

#[test]
fn document_length_is_sum_of_term_frequencies() {
    let index = three_docs();
    for doc in index.doc_ids() {
        let sum: u64 = index.term_frequencies(doc).unwrap().values().map(|&tf| tf as u64).sum();
        assert_eq!(sum, index.document_length(doc).unwrap());
    }
    assert_eq!(index.total_occurrences(), 10);
}

#[test]
fn postings_agree_with_document_frequency() {
    let index = three_docs();
    let df = index.document_frequency();
    for (stem, count) in &df {
        assert_eq!(index.postings_for(stem).len() as u32, *count);
        let occurrences: u64 = index.postings_for(stem).values().map(|&tf| tf as u64).sum();
        assert_eq!(occurrences, index.collection_frequency(stem));
    }
}

#[test]
fn models_share_one_index_across_threads() {
    let index = three_docs();
    let models: Vec<Box<dyn RankingModel + '_>> =
        vec![ModelSpec::language().build(&index).unwrap(), ModelSpec::okapi().build(&index).unwrap()];
    std::thread::scope(|s| {
        for model in &models {
            s.spawn(move || assert!(!model.ranking("c").is_empty()));
        }
    });
}

fn doc_strategy() -> impl Strategy<Value = TermFrequencies> {
    prop::collection::hash_map("[a-e]", 1u32..6, 1..5)
}

proptest! {
    #[test]
    fn idf_is_never_negative(docs in prop::collection::vec(doc_strategy(), 1..12)) {
        let index = index_of(docs.into_iter().enumerate().map(|(i, d)| (i as u32 + 1, d)).collect());
        for idf in index.idf().values() {
            prop_assert!(*idf >= 0.0);
        }
    }

    #[test]
    fn okapi_is_monotone_in_tf(tf in 1u32..50, extra in 1u32..50, k in 0.1f64..3.0, b in 0.0f64..=1.0) {
        let index = three_docs();
        let model = Okapi::new(&index, k, b);
        let idf = index.idf_of("a").unwrap();
        let low = model.term_score(idf, tf as f64, 4.0);
        let high = model.term_score(idf, (tf + extra) as f64, 4.0);
        prop_assert!(high >= low);
    }

    #[test]
    fn language_model_monotone_in_lambda(l1 in 0.0f64..=1.0, l2 in 0.0f64..=1.0) {
        let (lo, hi) = if l1 <= l2 { (l1, l2) } else { (l2, l1) };
        // doc 1 is all query terms: p(t|d) > p(t|C) for both; doc 3 has none of them
        let index = index_of(vec![
            (1, tfs(&[("a", 3), ("b", 3)])),
            (2, tfs(&[("a", 1), ("x", 9)])),
            (3, tfs(&[("y", 5), ("z", 5)])),
        ]);
        let low = LanguageModel::new(&index, lo).scores("a b");
        let high = LanguageModel::new(&index, hi).scores("a b");
        prop_assert!(high[&1] + 1e-12 >= low[&1]);
        prop_assert!(high[&3] <= low[&3] + 1e-12);
    }
}
