//! Sparse TF-IDF vectors and the similarity math over them.
//!
//! Weights are kept sorted by term id. Every sum below walks that order, so
//! the same weights always produce bit-identical norms and dot products.

use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: TermId,
    pub weight: f64,
}

impl TermWeight {
    pub fn new(term: TermId, weight: f64) -> Self { Self { term, weight } }
}

/// Owned sparse vector: a query vector, or a document vector before it is
/// published to the store. The norm is derived from the weights at
/// construction and there is no way to change one without the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: Vec<TermWeight>,
    norm: f64,
}

impl SparseVector {
    /// Builds a vector from unordered weights. Zero weights are dropped;
    /// duplicate term ids are summed.
    pub fn from_weights(mut weights: Vec<TermWeight>) -> Self {
        weights.retain(|w| w.weight != 0.0);
        weights.sort_by_key(|w| w.term);
        weights.dedup_by(|next, kept| {
            if next.term == kept.term {
                kept.weight += next.weight;
                true
            } else {
                false
            }
        });
        weights.retain(|w| w.weight != 0.0);
        let norm = norm(&weights);
        Self { weights, norm }
    }

    pub fn empty() -> Self { Self::default() }

    pub fn weights(&self) -> &[TermWeight] { &self.weights }

    pub fn norm(&self) -> f64 { self.norm }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    /// Weight of `term`, 0 when absent.
    pub fn weight(&self, term: TermId) -> f64 { weight_of(&self.weights, term) }

    /// Borrows this vector as the document `doc_id`.
    pub fn as_document(&self, doc_id: DocId) -> DocumentVector<'_> {
        DocumentVector { doc_id, weights: &self.weights, norm: self.norm }
    }

    pub(crate) fn into_parts(self) -> (Vec<TermWeight>, f64) { (self.weights, self.norm) }
}

/// Read-only view of a finished document vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentVector<'a> {
    pub(crate) doc_id: DocId,
    pub(crate) weights: &'a [TermWeight],
    pub(crate) norm: f64,
}

impl<'a> DocumentVector<'a> {
    pub fn doc_id(&self) -> DocId { self.doc_id }

    pub fn weights(&self) -> &'a [TermWeight] { self.weights }

    pub fn norm(&self) -> f64 { self.norm }

    pub fn weight(&self, term: TermId) -> f64 { weight_of(self.weights, term) }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }
}

fn weight_of(weights: &[TermWeight], term: TermId) -> f64 {
    weights
        .binary_search_by_key(&term, |w| w.term)
        .map_or(0.0, |i| weights[i].weight)
}

/// Euclidean length of `weights`. Empty input has norm 0.
pub fn norm(weights: &[TermWeight]) -> f64 {
    weights.iter().map(|w| w.weight * w.weight).sum::<f64>().sqrt()
}

/// Dot product of two term-sorted weight slices.
pub fn dot(a: &[TermWeight], b: &[TermWeight]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].term.cmp(&b[j].term) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].weight * b[j].weight;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Cosine similarity. NaN when either vector has norm 0: there is no
/// meaningful angle to a zero vector.
pub fn cosine(query: &SparseVector, doc: DocumentVector<'_>) -> f64 {
    if query.norm == 0.0 || doc.norm == 0.0 {
        return f64::NAN;
    }
    dot(&query.weights, doc.weights) / (query.norm * doc.norm)
}
