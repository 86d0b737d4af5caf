//! Observation hooks for the weighting pass.
//!
//! Observers only ever see borrowed data; nothing they do can change a
//! computed weight or norm. The calculator is generic over the observer, so
//! [`NoopObserver`] costs nothing: its `ACTIVE` flag is `false` and the trace
//! selection is never consulted.

use crate::terms::DocumentFrequencies;
use crate::vector::{DocumentVector, TermWeight};
use crate::weighting::TermCount;
use crate::DocId;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub trait WeightObserver: Sync {
    /// `false` lets the calculator skip every hook and the trace check.
    const ACTIVE: bool = true;

    /// Called with the raw term counts of a traced document, before any
    /// weight is computed.
    fn on_calculation(
        &self,
        _doc_id: DocId,
        _counts: &[TermCount],
        _total_docs: u32,
        _df: &DocumentFrequencies,
    ) {
    }

    /// Called once per document after its weights and norm are final.
    fn on_calculated(&self, _vector: DocumentVector<'_>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WeightObserver for NoopObserver {
    const ACTIVE: bool = false;
}

impl<O: WeightObserver> WeightObserver for &O {
    const ACTIVE: bool = O::ACTIVE;

    fn on_calculation(&self, doc_id: DocId, counts: &[TermCount], total_docs: u32, df: &DocumentFrequencies) {
        (**self).on_calculation(doc_id, counts, total_docs, df)
    }

    fn on_calculated(&self, vector: DocumentVector<'_>) { (**self).on_calculated(vector) }
}

/// Which documents get the detailed `on_calculation` hook.
#[derive(Clone, Default)]
pub enum TraceSelection {
    #[default]
    None,
    All,
    Only(BTreeSet<DocId>),
    /// Any rule over document ids. Called from the weighting threads.
    Predicate(Arc<dyn Fn(DocId) -> bool + Send + Sync>),
}

impl fmt::Debug for TraceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceSelection::None => f.write_str("None"),
            TraceSelection::All => f.write_str("All"),
            TraceSelection::Only(ids) => f.debug_tuple("Only").field(ids).finish(),
            TraceSelection::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl TraceSelection {
    pub fn only<I: IntoIterator<Item = DocId>>(ids: I) -> Self { Self::Only(ids.into_iter().collect()) }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(DocId) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    #[inline]
    pub fn selects(&self, doc_id: DocId) -> bool {
        match self {
            TraceSelection::None => false,
            TraceSelection::All => true,
            TraceSelection::Only(ids) => ids.contains(&doc_id),
            TraceSelection::Predicate(f) => f(doc_id),
        }
    }
}

/// Writes hook invocations as `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl WeightObserver for LogObserver {
    fn on_calculation(&self, doc_id: DocId, counts: &[TermCount], total_docs: u32, df: &DocumentFrequencies) {
        tracing::debug!(doc_id, total_docs, terms = counts.len(), "weighting document");
        for c in counts {
            tracing::debug!(doc_id, term_id = c.term, tf = c.count, df = df.get(c.term), "term count");
        }
    }

    fn on_calculated(&self, vector: DocumentVector<'_>) {
        tracing::debug!(doc_id = vector.doc_id(), norm = vector.norm(), terms = vector.len(), "document weighted");
    }
}

/// What a [`Recorder`] saw for one traced document.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedCounts {
    pub doc_id: DocId,
    pub counts: Vec<TermCount>,
    pub total_docs: u32,
}

/// What a [`Recorder`] saw for one finished document.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedVector {
    pub doc_id: DocId,
    pub weights: Vec<TermWeight>,
    pub norm: f64,
}

/// Keeps copies of everything it observes. Safe to share across the
/// parallel weighting workers.
#[derive(Debug, Default)]
pub struct Recorder {
    traced: Mutex<Vec<TracedCounts>>,
    finished: Mutex<Vec<FinishedVector>>,
}

impl Recorder {
    pub fn new() -> Self { Self::default() }

    /// Traced documents, ordered by id.
    pub fn traced(&self) -> Vec<TracedCounts> {
        let mut out = self.traced.lock().clone();
        out.sort_by_key(|t| t.doc_id);
        out
    }

    /// Finished documents, ordered by id.
    pub fn finished(&self) -> Vec<FinishedVector> {
        let mut out = self.finished.lock().clone();
        out.sort_by_key(|f| f.doc_id);
        out
    }
}

impl WeightObserver for Recorder {
    fn on_calculation(&self, doc_id: DocId, counts: &[TermCount], total_docs: u32, _df: &DocumentFrequencies) {
        self.traced.lock().push(TracedCounts { doc_id, counts: counts.to_vec(), total_docs });
    }

    fn on_calculated(&self, vector: DocumentVector<'_>) {
        self.finished.lock().push(FinishedVector {
            doc_id: vector.doc_id(),
            weights: vector.weights().to_vec(),
            norm: vector.norm(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_matches_ids() {
        assert!(!TraceSelection::None.selects(1789));
        assert!(TraceSelection::All.selects(1789));
        let only = TraceSelection::only([1789]);
        assert!(only.selects(1789));
        assert!(!only.selects(1790));
    }

    #[test]
    fn predicate_selects_by_rule() {
        let even = TraceSelection::predicate(|id| id % 2 == 0);
        assert!(even.selects(1788));
        assert!(!even.selects(1789));
        assert_eq!(format!("{even:?}"), "Predicate(..)");
        assert_eq!(format!("{:?}", TraceSelection::only([3])), "Only({3})");
    }

    #[test]
    fn noop_is_inactive() {
        assert!(!<NoopObserver as WeightObserver>::ACTIVE);
        assert!(!<&NoopObserver as WeightObserver>::ACTIVE);
        assert!(<Recorder as WeightObserver>::ACTIVE);
    }
}
