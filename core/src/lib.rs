//! TF-IDF vector-space retrieval: term interning, document weighting,
//! cosine ranking and the collaborators around them (tokenization,
//! persistence, evaluation). BM25 and Jaccard rank over the same index.

pub mod bm25;
pub mod counts;
pub mod engine;
pub mod eval;
mod index;
pub mod jaccard;
pub mod observer;
pub mod persist;
pub mod query;
pub mod rank;
pub mod store;
pub mod terms;
pub mod tokenizer;
pub mod vector;
pub mod weighting;

pub use bm25::Bm25Params;
pub use engine::{Index, IndexBuilder, Model, ModelSearcher, SearchEngine};
pub use index::{DocId, DocMeta, TermId};
pub use rank::SearchResult;
pub use vector::{DocumentVector, SparseVector, TermWeight};
pub use weighting::{IdfScheme, TfScheme, WeightingOptions, WeightingScheme};
