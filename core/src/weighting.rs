//! TF-IDF weighting shared by documents and queries.

use crate::observer::{TraceSelection, WeightObserver};
use crate::terms::DocumentFrequencies;
use crate::vector::{SparseVector, TermWeight};
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};

/// Raw occurrence count of one term inside one document or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: TermId,
    pub count: u32,
}

/// Collapses a multiset of term ids into counts sorted by term id.
pub fn count_terms(term_ids: &[TermId]) -> Vec<TermCount> {
    let mut sorted = term_ids.to_vec();
    sorted.sort_unstable();
    let mut counts: Vec<TermCount> = Vec::new();
    for term in sorted {
        match counts.last_mut() {
            Some(last) if last.term == term => last.count += 1,
            _ => counts.push(TermCount { term, count: 1 }),
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfScheme {
    /// `tf = count`
    #[default]
    Raw,
    /// `tf = 1 + ln(count)`
    Log,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfScheme {
    /// `idf = ln(N / df)`
    #[default]
    Standard,
    /// `idf = ln(1 + N / df)`
    Smoothed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightingScheme {
    pub tf: TfScheme,
    pub idf: IdfScheme,
}

impl WeightingScheme {
    pub fn tf(&self, count: u32) -> f64 {
        if count == 0 {
            return 0.0;
        }
        match self.tf {
            TfScheme::Raw => count as f64,
            TfScheme::Log => 1.0 + (count as f64).ln(),
        }
    }

    /// Inverse document frequency. An empty corpus or a term no document
    /// contains contributes nothing instead of dividing by zero.
    pub fn idf(&self, total_docs: u32, df: u32) -> f64 {
        if total_docs == 0 || df == 0 {
            return 0.0;
        }
        let ratio = total_docs as f64 / df as f64;
        match self.idf {
            IdfScheme::Standard => ratio.ln(),
            IdfScheme::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Per-build weighting configuration.
#[derive(Debug, Clone, Default)]
pub struct WeightingOptions {
    pub scheme: WeightingScheme,
    /// Documents that get the detailed `on_calculation` hook.
    pub trace: TraceSelection,
}

/// Turns term multisets into TF-IDF vectors against a frozen frequency table.
#[derive(Debug, Clone, Copy)]
pub struct WeightCalculator<'a> {
    scheme: WeightingScheme,
    total_docs: u32,
    df: &'a DocumentFrequencies,
}

impl<'a> WeightCalculator<'a> {
    pub fn new(scheme: WeightingScheme, total_docs: u32, df: &'a DocumentFrequencies) -> Self {
        Self { scheme, total_docs, df }
    }

    pub fn scheme(&self) -> WeightingScheme { self.scheme }

    pub fn total_docs(&self) -> u32 { self.total_docs }

    /// Weighs one term multiset with no observation. Used for queries.
    pub fn weigh(&self, term_ids: &[TermId]) -> SparseVector {
        self.weigh_counts(&count_terms(term_ids))
    }

    /// Weighs one document, firing `observer` hooks as selected by `trace`.
    pub fn weigh_document<O: WeightObserver>(
        &self,
        doc_id: DocId,
        term_ids: &[TermId],
        trace: &TraceSelection,
        observer: &O,
    ) -> SparseVector {
        self.weigh_document_counts(doc_id, &count_terms(term_ids), trace, observer)
    }

    /// Same as [`weigh_document`](Self::weigh_document) for already counted terms.
    pub fn weigh_document_counts<O: WeightObserver>(
        &self,
        doc_id: DocId,
        counts: &[TermCount],
        trace: &TraceSelection,
        observer: &O,
    ) -> SparseVector {
        if O::ACTIVE && trace.selects(doc_id) {
            observer.on_calculation(doc_id, counts, self.total_docs, self.df);
        }
        let vector = self.weigh_counts(counts);
        if O::ACTIVE {
            observer.on_calculated(vector.as_document(doc_id));
        }
        vector
    }

    fn weigh_counts(&self, counts: &[TermCount]) -> SparseVector {
        let weights = counts
            .iter()
            .map(|c| {
                let idf = self.scheme.idf(self.total_docs, self.df.get(c.term));
                TermWeight::new(c.term, self.scheme.tf(c.count) * idf)
            })
            .collect();
        SparseVector::from_weights(weights)
    }
}
