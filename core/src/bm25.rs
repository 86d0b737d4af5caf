//! Okapi BM25 over the per-document term counts.
//!
//! `score(d, q) = Σ idf(t) · tf·(k1+1) / (tf + k1·(1 − b + b·|d|/avgdl)) · qtf·(k3+1) / (qtf + k3)`
//! with `idf(t) = ln(1 + (N − df + 0.5) / (df + 0.5))`, which never goes
//! negative. Terms the query shares with no document add nothing, so
//! every score is a finite number ≥ 0.

use crate::counts::{DocumentCounts, TermCountStore};
use crate::rank::SearchResult;
use crate::terms::Vocabulary;
use crate::weighting::{count_terms, TermCount};
use rayon::prelude::*;

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization, 0 disables it.
    pub b: f64,
    /// Query term-frequency saturation.
    pub k3: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.2, b: 0.75, k3: 2.0 } }
}

pub fn idf(total_docs: u32, df: u32) -> f64 {
    if total_docs == 0 || df == 0 {
        return 0.0;
    }
    let (n, df) = (total_docs as f64, df as f64);
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

struct QueryTerm {
    count: TermCount,
    idf: f64,
}

/// Unordered BM25 scores for every stored document.
pub fn score_all<S: AsRef<str>>(
    vocabulary: &Vocabulary,
    store: &TermCountStore,
    tokens: &[S],
    params: Bm25Params,
) -> Vec<SearchResult> {
    let term_ids: Vec<_> = tokens.iter().filter_map(|t| vocabulary.lookup(t.as_ref())).collect();
    let total_docs = store.len() as u32;
    let query: Vec<QueryTerm> = count_terms(&term_ids)
        .into_iter()
        .map(|count| QueryTerm { count, idf: idf(total_docs, vocabulary.document_frequency(count.term)) })
        .collect();
    let avgdl = store.average_length();

    (0..store.len())
        .into_par_iter()
        .filter_map(|pos| store.get(pos))
        .map(|doc| SearchResult::new(Some(doc.doc_id()), score(&query, doc, avgdl, params)))
        .collect()
}

fn score(query: &[QueryTerm], doc: DocumentCounts<'_>, avgdl: f64, params: Bm25Params) -> f64 {
    let length_norm = if avgdl > 0.0 {
        1.0 - params.b + params.b * doc.length() as f64 / avgdl
    } else {
        1.0
    };
    query
        .iter()
        .map(|q| {
            let tf = doc.count(q.count.term) as f64;
            if tf == 0.0 {
                return 0.0;
            }
            let qtf = q.count.count as f64;
            let doc_part = tf * (params.k1 + 1.0) / (tf + params.k1 * length_norm);
            let query_part = qtf * (params.k3 + 1.0) / (qtf + params.k3);
            q.idf * doc_part * query_part
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::IndexBuilder;
    use crate::rank::rank;
    use crate::weighting::WeightingOptions;
    use crate::Index;

    fn build(docs: &[&str]) -> Index {
        let mut builder = IndexBuilder::new();
        for (id, text) in docs.iter().enumerate() {
            builder.add_document(id as u32, text.split_whitespace()).unwrap();
        }
        builder.build(&WeightingOptions::default()).unwrap()
    }

    fn scores(index: &Index, query: &str, params: Bm25Params) -> Vec<f64> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        let mut results = score_all(index.vocabulary(), index.counts(), &tokens, params);
        results.sort_by_key(|r| r.document());
        results.iter().map(|r| r.score()).collect()
    }

    #[test]
    fn single_term_matches_the_formula() {
        let index = build(&["cat cat dog", "dog", "bird"]);
        let s = scores(&index, "cat", Bm25Params::default());
        let (k1, b) = (1.2, 0.75);
        let avgdl = 5.0 / 3.0;
        let idf = (1.0f64 + (3.0 - 1.0 + 0.5) / 1.5).ln();
        let expected = idf * 2.0 * (k1 + 1.0) / (2.0 + k1 * (1.0 - b + b * 3.0 / avgdl));
        assert!((s[0] - expected).abs() < 1e-12);
        assert_eq!(s[1], 0.0);
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn term_in_every_document_still_counts() {
        // TF-IDF gives such a term weight 0; BM25's idf stays positive
        let index = build(&["x a", "x b"]);
        let s = scores(&index, "x", Bm25Params::default());
        assert!(s.iter().all(|&v| v > 0.0));
        assert!(idf(2, 2) > 0.0);
    }

    #[test]
    fn shorter_document_wins_at_equal_tf() {
        let index = build(&["rust", "rust filler filler filler", "other"]);
        let ranked = rank(score_all(index.vocabulary(), index.counts(), &["rust"], Bm25Params::default()), 2);
        assert_eq!(ranked[0].document(), Some(0));
        assert_eq!(ranked[1].document(), Some(1));

        let flat = Bm25Params { b: 0.0, ..Default::default() };
        let s = scores(&index, "rust", flat);
        assert_eq!(s[0], s[1]);
    }

    #[test]
    fn term_frequency_saturates() {
        let index = build(&["a", "a a", "a a a a a a a a", "b"]);
        let s = scores(&index, "a", Bm25Params { b: 0.0, ..Default::default() });
        assert!(s[0] < s[1] && s[1] < s[2]);
        assert!(s[2] < idf(4, 3) * (1.2 + 1.0));
    }

    #[test]
    fn repeated_query_terms_use_k3() {
        let index = build(&["a b", "b c", "c d"]);
        let once = scores(&index, "a", Bm25Params::default())[0];
        let twice = scores(&index, "a a", Bm25Params::default())[0];
        assert!((twice / once - 2.0 * 3.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_terms_and_empty_corpus_score_nothing() {
        let index = build(&["a", "b"]);
        assert!(scores(&index, "zebra", Bm25Params::default()).iter().all(|&v| v == 0.0));
        let empty = build(&[]);
        assert!(score_all(empty.vocabulary(), empty.counts(), &["a"], Bm25Params::default()).is_empty());
    }
}
