//! Term interning and document-frequency bookkeeping.
//!
//! [`TermIndex`] is the append-only structure filled during ingestion. Once
//! every document has been seen it is frozen into a [`Vocabulary`], which is
//! what weighting and querying read.

use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable term dictionary used while the corpus is being ingested.
#[derive(Debug, Default)]
pub struct TermIndex {
    dictionary: HashMap<String, TermId>,
    // Per term: sorted, deduplicated ids of documents containing it.
    postings: Vec<Vec<DocId>>,
}

impl TermIndex {
    pub fn new() -> Self { Self::default() }

    /// Returns the id for `token`, assigning the next free id on first sighting.
    pub fn intern(&mut self, token: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(token) {
            return tid;
        }
        let tid = self.postings.len() as TermId;
        self.dictionary.insert(token.to_owned(), tid);
        self.postings.push(Vec::new());
        tid
    }

    pub fn lookup(&self, token: &str) -> Option<TermId> {
        self.dictionary.get(token).copied()
    }

    /// Marks `doc_id` as containing `term_id`. Repeated calls for the same
    /// pair are no-ops. Returns true when the pair was new.
    pub fn record_document_contains_term(&mut self, term_id: TermId, doc_id: DocId) -> bool {
        let Some(docs) = self.postings.get_mut(term_id as usize) else {
            return false;
        };
        // Ingestion usually walks documents in ascending order, so check the tail first.
        match docs.last() {
            Some(&last) if last == doc_id => false,
            Some(&last) if last < doc_id => {
                docs.push(doc_id);
                true
            }
            None => {
                docs.push(doc_id);
                true
            }
            Some(_) => match docs.binary_search(&doc_id) {
                Ok(_) => false,
                Err(pos) => {
                    docs.insert(pos, doc_id);
                    true
                }
            },
        }
    }

    /// Number of distinct documents recorded for `term_id`; 0 when unknown.
    pub fn document_frequency(&self, term_id: TermId) -> u32 {
        self.postings.get(term_id as usize).map_or(0, |docs| docs.len() as u32)
    }

    pub fn len(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }

    /// Ends ingestion: keeps the dictionary and collapses postings into counts.
    pub fn freeze(self) -> Vocabulary {
        let df = self.postings.iter().map(|docs| docs.len() as u32).collect();
        Vocabulary { dictionary: self.dictionary, df: DocumentFrequencies(df) }
    }
}

/// Document frequency per term id. Unknown ids read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFrequencies(Vec<u32>);

impl DocumentFrequencies {
    #[inline]
    pub fn get(&self, term_id: TermId) -> u32 {
        self.0.get(term_id as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, u32)> + '_ {
        self.0.iter().enumerate().map(|(tid, &df)| (tid as TermId, df))
    }
}

impl From<Vec<u32>> for DocumentFrequencies {
    fn from(df: Vec<u32>) -> Self { Self(df) }
}

/// Frozen term dictionary plus document frequencies. Read-only after ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    dictionary: HashMap<String, TermId>,
    df: DocumentFrequencies,
}

impl Vocabulary {
    pub fn lookup(&self, token: &str) -> Option<TermId> {
        self.dictionary.get(token).copied()
    }

    pub fn document_frequency(&self, term_id: TermId) -> u32 { self.df.get(term_id) }

    pub fn frequencies(&self) -> &DocumentFrequencies { &self.df }

    pub fn len(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.dictionary.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut terms = TermIndex::new();
        let cat = terms.intern("cat");
        let dog = terms.intern("dog");
        assert_ne!(cat, dog);
        assert_eq!(terms.intern("cat"), cat);
        assert_eq!(terms.lookup("dog"), Some(dog));
        assert_eq!(terms.lookup("bird"), None);
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn recording_containment_is_idempotent() {
        let mut terms = TermIndex::new();
        let cat = terms.intern("cat");
        assert!(terms.record_document_contains_term(cat, 3));
        assert!(!terms.record_document_contains_term(cat, 3));
        assert!(terms.record_document_contains_term(cat, 7));
        // out of order revisit of an already recorded document
        assert!(!terms.record_document_contains_term(cat, 3));
        assert!(terms.record_document_contains_term(cat, 1));
        assert_eq!(terms.document_frequency(cat), 3);
    }

    #[test]
    fn unknown_terms_have_zero_frequency() {
        let mut terms = TermIndex::new();
        assert_eq!(terms.document_frequency(42), 0);
        assert!(!terms.record_document_contains_term(42, 0));

        let vocab = terms.freeze();
        assert_eq!(vocab.document_frequency(42), 0);
        assert_eq!(vocab.frequencies().get(42), 0);
    }

    #[test]
    fn freeze_keeps_ids_and_counts() {
        let mut terms = TermIndex::new();
        let cat = terms.intern("cat");
        let dog = terms.intern("dog");
        terms.record_document_contains_term(cat, 0);
        terms.record_document_contains_term(cat, 1);
        terms.record_document_contains_term(dog, 2);

        let vocab = terms.freeze();
        assert_eq!(vocab.lookup("cat"), Some(cat));
        assert_eq!(vocab.document_frequency(cat), 2);
        assert_eq!(vocab.document_frequency(dog), 1);
        assert_eq!(vocab.frequencies().iter().collect::<Vec<_>>(), vec![(cat, 2), (dog, 1)]);
    }
}
