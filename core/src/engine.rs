//! The two-pass build and the query-time entry points.
//!
//! Pass 1 ([`IndexBuilder::add_document`]) interns tokens and records
//! document frequencies. Pass 2 ([`IndexBuilder::build`]) freezes the
//! vocabulary and weighs every document in parallel against it. The raw
//! counts of pass 2 are kept as well, for the count-based models.

use crate::bm25::{self, Bm25Params};
use crate::counts::TermCountStore;
use crate::jaccard;
use crate::observer::{NoopObserver, WeightObserver};
use crate::query::QueryProcessor;
use crate::rank::{self, SearchResult};
use crate::store::DocumentStore;
use crate::terms::{TermIndex, Vocabulary};
use crate::tokenizer::{StandardTokenizer, Tokenize};
use crate::vector::{DocumentVector, SparseVector};
use crate::weighting::{count_terms, TermCount, WeightCalculator, WeightingOptions, WeightingScheme};
use crate::{DocId, TermId};
use anyhow::{bail, Result};
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct IndexBuilder {
    terms: TermIndex,
    docs: Vec<(DocId, Vec<TermId>)>,
    seen: HashSet<DocId>,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Ingests one document's token stream. Document ids must be unique.
    pub fn add_document<I, S>(&mut self, doc_id: DocId, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.seen.insert(doc_id) {
            bail!("duplicate document id {doc_id}");
        }
        let mut term_ids = Vec::new();
        for token in tokens {
            let tid = self.terms.intern(token.as_ref());
            self.terms.record_document_contains_term(tid, doc_id);
            term_ids.push(tid);
        }
        self.docs.push((doc_id, term_ids));
        Ok(())
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn terms(&self) -> &TermIndex { &self.terms }

    /// Weighs every document without observation.
    pub fn build(self, options: &WeightingOptions) -> Result<Index> {
        self.build_observed(options, &NoopObserver)
    }

    /// Freezes the vocabulary and weighs every document, reporting to `observer`.
    pub fn build_observed<O: WeightObserver>(self, options: &WeightingOptions, observer: &O) -> Result<Index> {
        let vocabulary = self.terms.freeze();
        let total_docs = self.docs.len() as u32;
        let calc = WeightCalculator::new(options.scheme, total_docs, vocabulary.frequencies());

        let weighed: Vec<(DocId, Vec<TermCount>, SparseVector)> = self
            .docs
            .par_iter()
            .map(|(doc_id, term_ids)| {
                let counts = count_terms(term_ids);
                let vector = calc.weigh_document_counts(*doc_id, &counts, &options.trace, observer);
                (*doc_id, counts, vector)
            })
            .collect();

        let total_weights = weighed.iter().map(|(_, _, v)| v.weights().len()).sum();
        let mut store = DocumentStore::with_capacity(weighed.len(), total_weights);
        let mut counts = TermCountStore::new();
        for (doc_id, doc_counts, vector) in weighed {
            store.insert(doc_id, vector)?;
            counts.insert(doc_id, doc_counts)?;
        }
        tracing::info!(num_docs = total_docs, num_terms = vocabulary.len(), total_weights, "weighted documents");
        Ok(Index { vocabulary, store, counts, scheme: options.scheme })
    }
}

/// Which similarity ranks the documents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Model {
    /// Cosine over TF-IDF vectors.
    #[default]
    TfIdf,
    Jaccard,
    Bm25(Bm25Params),
}

/// A fully built, read-only index. Safe to share between concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct Index {
    vocabulary: Vocabulary,
    store: DocumentStore,
    counts: TermCountStore,
    scheme: WeightingScheme,
}

impl Index {
    /// Reassembles a loaded index. Both stores must hold the same documents.
    pub fn from_parts(
        vocabulary: Vocabulary,
        store: DocumentStore,
        counts: TermCountStore,
        scheme: WeightingScheme,
    ) -> Result<Self> {
        if store.len() != counts.len() {
            bail!("{} document vectors but {} term count entries", store.len(), counts.len());
        }
        if let Some(v) = store.iter().find(|v| counts.counts_for(v.doc_id()).is_none()) {
            bail!("document {} has a vector but no term counts", v.doc_id());
        }
        Ok(Self { vocabulary, store, counts, scheme })
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn store(&self) -> &DocumentStore { &self.store }

    pub fn counts(&self) -> &TermCountStore { &self.counts }

    pub fn scheme(&self) -> WeightingScheme { self.scheme }

    pub fn num_docs(&self) -> u32 { self.store.len() as u32 }

    pub fn vector_for(&self, doc_id: DocId) -> Option<DocumentVector<'_>> { self.store.vector_for(doc_id) }

    pub fn query_processor(&self) -> QueryProcessor<'_> {
        QueryProcessor::new(&self.vocabulary, self.scheme, self.num_docs())
    }

    pub fn query_vector<S: AsRef<str>>(&self, tokens: &[S]) -> SparseVector {
        self.query_processor().vectorize(tokens)
    }

    /// Unordered scores for every document.
    pub fn score_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<SearchResult> {
        rank::score_all(&self.store, &self.query_vector(tokens))
    }

    pub fn search_tokens<S: AsRef<str>>(&self, tokens: &[S], k: usize) -> Vec<SearchResult> {
        rank::search(&self.store, &self.query_vector(tokens), k)
    }

    /// Unordered scores for every document under `model`.
    pub fn score_tokens_with<S: AsRef<str>>(&self, model: Model, tokens: &[S]) -> Vec<SearchResult> {
        match model {
            Model::TfIdf => self.score_tokens(tokens),
            Model::Jaccard => jaccard::score_all(&self.vocabulary, &self.counts, tokens),
            Model::Bm25(params) => bm25::score_all(&self.vocabulary, &self.counts, tokens, params),
        }
    }

    pub fn search_tokens_with<S: AsRef<str>>(&self, model: Model, tokens: &[S], k: usize) -> Vec<SearchResult> {
        rank::rank(self.score_tokens_with(model, tokens), k)
    }
}

/// An index paired with the tokenizer used to build it.
#[derive(Debug, Clone)]
pub struct SearchEngine<T = StandardTokenizer> {
    index: Index,
    tokenizer: T,
}

impl<T: Tokenize> SearchEngine<T> {
    pub fn new(index: Index, tokenizer: T) -> Self { Self { index, tokenizer } }

    pub fn index(&self) -> &Index { &self.index }

    pub fn tokenizer(&self) -> &T { &self.tokenizer }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchResult> {
        self.index.search_tokens(&self.tokenizer.tokens(query), k)
    }

    pub fn score(&self, query: &str) -> Vec<SearchResult> {
        self.index.score_tokens(&self.tokenizer.tokens(query))
    }

    pub fn search_with(&self, model: Model, query: &str, k: usize) -> Vec<SearchResult> {
        self.index.search_tokens_with(model, &self.tokenizer.tokens(query), k)
    }

    /// This engine fixed to one model, usable wherever a `Retriever` is.
    pub fn with_model(&self, model: Model) -> ModelSearcher<'_, T> {
        ModelSearcher { engine: self, model }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ModelSearcher<'a, T = StandardTokenizer> {
    engine: &'a SearchEngine<T>,
    model: Model,
}

impl<T: Tokenize> ModelSearcher<'_, T> {
    pub fn model(&self) -> Model { self.model }

    pub fn search(&self, query: &str, k: usize) -> Vec<SearchResult> {
        self.engine.search_with(self.model, query, k)
    }
}
