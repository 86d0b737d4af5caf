//! Jaccard similarity between the query's and each document's term sets.
//!
//! `|Q ∩ D| / |Q ∪ D|`, counting distinct terms only. Query tokens missing
//! from the vocabulary can never intersect but still widen the union. Two
//! empty sets have no defined similarity and score NaN.

use crate::counts::{DocumentCounts, TermCountStore};
use crate::rank::SearchResult;
use crate::terms::Vocabulary;
use crate::TermId;
use rayon::prelude::*;
use std::collections::BTreeSet;

struct QuerySet {
    known: Vec<TermId>,
    unknown: usize,
}

impl QuerySet {
    fn new<S: AsRef<str>>(vocabulary: &Vocabulary, tokens: &[S]) -> Self {
        let mut known = BTreeSet::new();
        let mut unknown = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref();
            match vocabulary.lookup(token) {
                Some(term) => known.insert(term),
                None => unknown.insert(token),
            };
        }
        Self { known: known.into_iter().collect(), unknown: unknown.len() }
    }

    fn similarity(&self, doc: DocumentCounts<'_>) -> f64 {
        let shared = self.known.iter().filter(|&&term| doc.count(term) > 0).count();
        let union = self.known.len() + self.unknown + doc.distinct() - shared;
        if union == 0 {
            return f64::NAN;
        }
        shared as f64 / union as f64
    }
}

/// Unordered Jaccard scores for every stored document.
pub fn score_all<S: AsRef<str>>(vocabulary: &Vocabulary, store: &TermCountStore, tokens: &[S]) -> Vec<SearchResult> {
    let query = QuerySet::new(vocabulary, tokens);
    (0..store.len())
        .into_par_iter()
        .filter_map(|pos| store.get(pos))
        .map(|doc| SearchResult::new(Some(doc.doc_id()), query.similarity(doc)))
        .collect()
}
