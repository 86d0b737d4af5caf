//! Cosine scoring and result ordering.
//!
//! Ordering rule: defined scores descending, then every NaN score. NaN means
//! "no meaningful relation" and must never sort among real scores, so it is
//! matched explicitly rather than left to float comparison.

use crate::store::DocumentStore;
use crate::vector::{cosine, SparseVector};
use crate::DocId;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchResult {
    document: Option<DocId>,
    score: f64,
}

impl SearchResult {
    pub fn new(document: Option<DocId>, score: f64) -> Self { Self { document, score } }

    /// A result with no document attached, for callers that only need scores.
    pub fn placeholder(score: f64) -> Self { Self { document: None, score } }

    pub fn document(&self) -> Option<DocId> { self.document }

    pub fn score(&self) -> f64 { self.score }

    pub fn is_defined(&self) -> bool { !self.score.is_nan() }
}

/// Descending by score with NaN last. Equal scores fall back to the document
/// reference so the order is total.
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    compare_scores(a.score, b.score).then_with(|| a.document.cmp(&b.document))
}

/// Descending order over scores with every NaN after every number.
pub fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Orders `results` and keeps the first `k`.
pub fn rank(mut results: Vec<SearchResult>, k: usize) -> Vec<SearchResult> {
    if k == 0 {
        return Vec::new();
    }
    if k < results.len() {
        // Partition around the k-th element first; the comparator is total,
        // so the kept prefix is exactly what a full sort would keep.
        results.select_nth_unstable_by(k - 1, compare_results);
        results.truncate(k);
    }
    results.sort_unstable_by(compare_results);
    results
}

/// Scores every stored document against `query`, in store order.
pub fn score_all(store: &DocumentStore, query: &SparseVector) -> Vec<SearchResult> {
    (0..store.len())
        .into_par_iter()
        .filter_map(|pos| store.get(pos))
        .map(|doc| SearchResult::new(Some(doc.doc_id()), cosine(query, doc)))
        .collect()
}

/// Top `k` documents for `query`.
pub fn search(store: &DocumentStore, query: &SparseVector, k: usize) -> Vec<SearchResult> {
    rank(score_all(store, query), k)
}
