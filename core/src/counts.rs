//! Raw term counts per document, packed like the vector store.
//!
//! TF-IDF vectors drop terms whose weight is zero, so the count-based models
//! (BM25, Jaccard) read from this arena instead. Each document keeps every
//! distinct term it contains and its length in tokens.

use crate::weighting::TermCount;
use crate::{DocId, TermId};
use anyhow::{bail, ensure, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Span {
    doc_id: DocId,
    start: usize,
    len: usize,
    length: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCounts")]
pub struct TermCountStore {
    counts: Vec<TermCount>,
    spans: Vec<Span>,
    #[serde(skip)]
    positions: HashMap<DocId, usize>,
    #[serde(skip)]
    total_length: u64,
}

#[derive(Deserialize)]
struct RawCounts {
    counts: Vec<TermCount>,
    spans: Vec<Span>,
}

impl TryFrom<RawCounts> for TermCountStore {
    type Error = Error;

    fn try_from(raw: RawCounts) -> Result<Self> {
        let mut store = Self { counts: raw.counts, spans: Vec::with_capacity(raw.spans.len()), ..Self::default() };
        for span in raw.spans {
            let end = span.start.checked_add(span.len);
            let Some(counts) = end.and_then(|end| store.counts.get(span.start..end)) else {
                bail!("document {} spans {}+{} past {} stored counts", span.doc_id, span.start, span.len, store.counts.len());
            };
            check_counts(span.doc_id, counts, span.length)?;
            store.push_span(span)?;
        }
        Ok(store)
    }
}

/// Counts must be strictly sorted by term, non-zero, and sum to the length.
fn check_counts(doc_id: DocId, counts: &[TermCount], length: u32) -> Result<()> {
    ensure!(
        counts.windows(2).all(|c| c[0].term < c[1].term),
        "document {doc_id} counts are not sorted by term"
    );
    ensure!(counts.iter().all(|c| c.count > 0), "document {doc_id} has a zero count");
    let total: u64 = counts.iter().map(|c| u64::from(c.count)).sum();
    ensure!(total == u64::from(length), "document {doc_id} length {length} does not match its counts ({total})");
    Ok(())
}

impl TermCountStore {
    pub fn new() -> Self { Self::default() }

    /// Stores the sorted counts of one document. Each id may be stored once.
    pub fn insert(&mut self, doc_id: DocId, counts: Vec<TermCount>) -> Result<()> {
        let length = counts.iter().map(|c| c.count).sum();
        check_counts(doc_id, &counts, length)?;
        let start = self.counts.len();
        let len = counts.len();
        self.counts.extend(counts);
        if let Err(err) = self.push_span(Span { doc_id, start, len, length }) {
            self.counts.truncate(start);
            return Err(err);
        }
        Ok(())
    }

    fn push_span(&mut self, span: Span) -> Result<()> {
        if self.positions.contains_key(&span.doc_id) {
            bail!("document {} is already stored", span.doc_id);
        }
        self.positions.insert(span.doc_id, self.spans.len());
        self.total_length += u64::from(span.length);
        self.spans.push(span);
        Ok(())
    }

    pub fn counts_for(&self, doc_id: DocId) -> Option<DocumentCounts<'_>> {
        let &pos = self.positions.get(&doc_id)?;
        Some(self.view(&self.spans[pos]))
    }

    /// Documents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = DocumentCounts<'_>> + '_ {
        self.spans.iter().map(move |span| self.view(span))
    }

    pub fn get(&self, pos: usize) -> Option<DocumentCounts<'_>> {
        self.spans.get(pos).map(|span| self.view(span))
    }

    pub fn len(&self) -> usize { self.spans.len() }

    pub fn is_empty(&self) -> bool { self.spans.is_empty() }

    /// Mean document length in tokens, 0 for an empty store.
    pub fn average_length(&self) -> f64 {
        if self.spans.is_empty() {
            0.0
        } else {
            self.total_length as f64 / self.spans.len() as f64
        }
    }

    fn view(&self, span: &Span) -> DocumentCounts<'_> {
        DocumentCounts { doc_id: span.doc_id, counts: &self.counts[span.start..span.start + span.len], length: span.length }
    }
}

/// One document's term counts, sorted by term id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentCounts<'a> {
    doc_id: DocId,
    counts: &'a [TermCount],
    length: u32,
}

impl<'a> DocumentCounts<'a> {
    pub fn doc_id(&self) -> DocId { self.doc_id }

    pub fn counts(&self) -> &'a [TermCount] { self.counts }

    /// Number of tokens in the document.
    pub fn length(&self) -> u32 { self.length }

    /// Number of distinct terms.
    pub fn distinct(&self) -> usize { self.counts.len() }

    pub fn count(&self, term: TermId) -> u32 {
        self.counts
            .binary_search_by_key(&term, |c| c.term)
            .map_or(0, |i| self.counts[i].count)
    }
}
