//! Finished document vectors, packed into one arena.
//!
//! All weights live in a single `Vec<TermWeight>`; each document owns a
//! contiguous span of it. The store is filled once after weighting and only
//! read afterwards.

use crate::vector::{norm, DocumentVector, SparseVector, TermWeight};
use crate::DocId;
use anyhow::{bail, ensure, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Span {
    doc_id: DocId,
    start: usize,
    len: usize,
    norm: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawStore")]
pub struct DocumentStore {
    weights: Vec<TermWeight>,
    spans: Vec<Span>,
    #[serde(skip)]
    positions: HashMap<DocId, usize>,
}

/// Serialized shape of [`DocumentStore`], checked before it becomes one.
#[derive(Deserialize)]
struct RawStore {
    weights: Vec<TermWeight>,
    spans: Vec<Span>,
}

impl TryFrom<RawStore> for DocumentStore {
    type Error = Error;

    /// Every span must lie inside the arena, hold weights sorted by term id
    /// and carry the norm those weights produce.
    fn try_from(raw: RawStore) -> Result<Self> {
        let mut positions = HashMap::with_capacity(raw.spans.len());
        for (pos, span) in raw.spans.iter().enumerate() {
            let end = span.start.checked_add(span.len);
            let Some(weights) = end.and_then(|end| raw.weights.get(span.start..end)) else {
                bail!(
                    "document {} spans {}+{} past {} stored weights",
                    span.doc_id,
                    span.start,
                    span.len,
                    raw.weights.len()
                );
            };
            ensure!(
                weights.windows(2).all(|w| w[0].term < w[1].term),
                "document {} weights are not sorted by term",
                span.doc_id
            );
            ensure!(
                norm(weights).to_bits() == span.norm.to_bits(),
                "document {} norm {} does not match its weights",
                span.doc_id,
                span.norm
            );
            if positions.insert(span.doc_id, pos).is_some() {
                bail!("document {} is stored twice", span.doc_id);
            }
        }
        Ok(Self { weights: raw.weights, spans: raw.spans, positions })
    }
}

impl DocumentStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(docs: usize, weights: usize) -> Self {
        Self {
            weights: Vec::with_capacity(weights),
            spans: Vec::with_capacity(docs),
            positions: HashMap::with_capacity(docs),
        }
    }

    /// Publishes a finished vector. Each document id may be stored once.
    pub fn insert(&mut self, doc_id: DocId, vector: SparseVector) -> Result<()> {
        if self.positions.contains_key(&doc_id) {
            bail!("document {doc_id} is already stored");
        }
        let (weights, norm) = vector.into_parts();
        let start = self.weights.len();
        self.weights.extend(weights);
        self.positions.insert(doc_id, self.spans.len());
        self.spans.push(Span { doc_id, start, len: self.weights.len() - start, norm });
        Ok(())
    }

    /// The finished vector for `doc_id`, or `None` when it was never indexed.
    pub fn vector_for(&self, doc_id: DocId) -> Option<DocumentVector<'_>> {
        let &pos = self.positions.get(&doc_id)?;
        Some(self.view(&self.spans[pos]))
    }

    /// Vectors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = DocumentVector<'_>> + '_ {
        self.spans.iter().map(move |span| self.view(span))
    }

    /// Vector at insertion position `pos`.
    pub fn get(&self, pos: usize) -> Option<DocumentVector<'_>> {
        self.spans.get(pos).map(|span| self.view(span))
    }

    pub fn len(&self) -> usize { self.spans.len() }

    pub fn is_empty(&self) -> bool { self.spans.is_empty() }

    /// Total number of stored (term, weight) pairs.
    pub fn total_weights(&self) -> usize { self.weights.len() }

    fn view(&self, span: &Span) -> DocumentVector<'_> {
        DocumentVector {
            doc_id: span.doc_id,
            weights: &self.weights[span.start..span.start + span.len],
            norm: span.norm,
        }
    }
}
