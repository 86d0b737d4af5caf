use vsm_core::observer::{Recorder, TraceSelection};
use vsm_core::tokenizer::{StandardTokenizer, WhitespaceTokenizer};
use vsm_core::{DocId, Index, IndexBuilder, SearchEngine, WeightingOptions};

fn build(docs: &[(DocId, &str)]) -> Index {
    let mut builder = IndexBuilder::new();
    for (id, text) in docs {
        builder.add_document(*id, text.split_whitespace()).unwrap();
    }
    builder.build(&WeightingOptions::default()).unwrap()
}

#[test]
fn rare_term_ranks_its_document_first() {
    // "cat" is in A and B (df 2), "dog" only in C (df 1)
    let index = build(&[(0, "cat sat on the mat"), (1, "the cat ran"), (2, "the dog barked")]);
    let results = index.search_tokens(&["dog"], 3);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document(), Some(2));
    assert!(results[0].score() > results[1].score());
    assert!(results[0].score() > results[2].score());
}

#[test]
fn unique_term_query_hits_its_only_document() {
    let docs = [
        (10, "alpha beta gamma"),
        (11, "beta gamma delta"),
        (12, "gamma delta epsilon zeta"),
        (13, "alpha delta"),
        (14, "beta epsilon"),
    ];
    let index = build(&docs);
    let results = index.search_tokens(&["zeta"], 5);
    assert_eq!(results[0].document(), Some(12));
    assert!(results[1..].iter().all(|r| r.score() == 0.0));
}

#[test]
fn unrecognized_query_scores_nan_without_failing() {
    let index = build(&[(0, "cat"), (1, "dog")]);
    let results = index.search_tokens(&["zebra", "unicorn"], 10);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.score().is_nan()));

    let none: [&str; 0] = [];
    assert_eq!(index.query_vector(&none).norm(), 0.0);
    assert!(index.search_tokens(&none, 10).iter().all(|r| !r.is_defined()));
}

#[test]
fn zero_norm_documents_sort_last() {
    // doc 2 only holds a term present everywhere, so its vector is empty
    let index = build(&[(0, "common red"), (1, "common blue"), (2, "common")]);
    let results = index.search_tokens(&["red", "common"], 3);
    assert_eq!(results[0].document(), Some(0));
    assert_eq!(results[1].score(), 0.0);
    assert_eq!(results[2].document(), Some(2));
    assert!(results[2].score().is_nan());
}

#[test]
fn top_k_keeps_the_best_scores() {
    let docs: Vec<(DocId, String)> = (0..50u32)
        .map(|i| (i, format!("w{} w{} w{}", i % 3, i % 5, i % 11)))
        .collect();
    let mut builder = IndexBuilder::new();
    for (id, text) in &docs {
        builder.add_document(*id, text.split_whitespace()).unwrap();
    }
    let index = builder.build(&WeightingOptions::default()).unwrap();
    let query = ["w1", "w4", "w7"];

    let all = index.search_tokens(&query, usize::MAX);
    assert_eq!(all.len(), 50);
    for k in [0, 1, 5, 17, 50, 80] {
        let top = index.search_tokens(&query, k);
        assert_eq!(top.len(), k.min(50));
        assert_eq!(&top[..], &all[..top.len()]);
    }
}

#[test]
fn unknown_document_is_absent() {
    let index = build(&[(0, "cat")]);
    assert!(index.vector_for(0).is_some());
    assert!(index.vector_for(1).is_none());
}

#[test]
fn tracing_a_single_document_leaves_results_unchanged() {
    let texts = [(1788, "library information services"), (1789, "information retrieval systems"), (1790, "retrieval evaluation")];
    let plain = build(&texts);

    let mut builder = IndexBuilder::new();
    for (id, text) in texts {
        builder.add_document(id, text.split_whitespace()).unwrap();
    }
    let recorder = Recorder::new();
    let options = WeightingOptions { trace: TraceSelection::only([1789]), ..Default::default() };
    let traced = builder.build_observed(&options, &recorder).unwrap();

    assert_eq!(recorder.traced().iter().map(|t| t.doc_id).collect::<Vec<_>>(), vec![1789]);
    for (a, b) in plain.store().iter().zip(traced.store().iter()) {
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.norm(), b.norm());
    }
}

#[test]
fn engines_share_the_index_pipeline() {
    let mut builder = IndexBuilder::new();
    let texts = [(0, "Searching the indexed libraries"), (1, "Library science and information"), (2, "Cooking with herbs")];
    for (id, text) in texts {
        builder.add_document(id, vsm_core::tokenizer::analyze(text)).unwrap();
    }
    let index = builder.build(&WeightingOptions::default()).unwrap();

    let engine = SearchEngine::new(index.clone(), StandardTokenizer);
    let results = engine.search("library", 2);
    assert_eq!(results.len(), 2);
    assert!(results[0].document() == Some(0) || results[0].document() == Some(1));
    assert!(results[0].score() > 0.0);

    // raw tokens are not analyzed, so "Library" misses the stemmed vocabulary
    let raw = SearchEngine::new(index, WhitespaceTokenizer);
    assert!(raw.search("Library", 3).iter().all(|r| r.score().is_nan()));
}
