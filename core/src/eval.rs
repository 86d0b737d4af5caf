//! Precision / recall / F1 of ranked results against relevance judgments.

use crate::engine::{ModelSearcher, SearchEngine};
use crate::rank::SearchResult;
use crate::tokenizer::Tokenize;
use crate::DocId;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Prf {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Prf {
    pub fn new(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall == 0.0 { 0.0 } else { 2.0 * precision * recall / (precision + recall) };
        Self { precision, recall, f1 }
    }
}

/// Anything that turns query text into ranked results.
pub trait Retriever {
    fn retrieve(&self, query: &str, k: usize) -> Vec<SearchResult>;
}

impl<T: Tokenize> Retriever for SearchEngine<T> {
    fn retrieve(&self, query: &str, k: usize) -> Vec<SearchResult> { self.search(query, k) }
}

impl<T: Tokenize> Retriever for ModelSearcher<'_, T> {
    fn retrieve(&self, query: &str, k: usize) -> Vec<SearchResult> { self.search(query, k) }
}

/// Scores one result list. `relevant` holds the judged documents present in
/// the index; `relevant_total` counts every judged document, so judgments
/// that cannot be retrieved still lower recall. Placeholder results (no
/// document) never count as relevant. Empty retrieved or relevant sets give
/// 0 rather than NaN.
pub fn query_prf(results: &[SearchResult], relevant: &HashSet<DocId>, relevant_total: usize) -> Prf {
    let retrieved: HashSet<DocId> = results.iter().filter_map(|r| r.document()).collect();
    let hits = retrieved.intersection(relevant).count() as f64;
    let relevant_total = relevant_total.max(relevant.len());
    let precision = if results.is_empty() { 0.0 } else { hits / results.len() as f64 };
    let recall = if relevant_total == 0 { 0.0 } else { hits / relevant_total as f64 };
    Prf::new(precision, recall)
}

/// Parses `qid<TAB>doc doc doc` lines. Blank lines are skipped.
pub fn parse_relevance(text: &str) -> Result<HashMap<String, Vec<String>>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (qid, docs) = line
            .split_once('\t')
            .with_context(|| format!("relevance line {}: expected `qid<TAB>doc ...`", n + 1))?;
        out.entry(qid.trim().to_string())
            .or_default()
            .extend(docs.split_whitespace().map(str::to_string));
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct JudgedQuery {
    pub id: String,
    pub text: String,
    /// Judged documents that exist in the index.
    pub relevant: HashSet<DocId>,
    /// All distinct judged documents, indexed or not.
    pub relevant_total: usize,
}

impl JudgedQuery {
    /// A query whose judgments all name indexed documents.
    pub fn new(id: impl Into<String>, text: impl Into<String>, relevant: HashSet<DocId>) -> Self {
        let relevant_total = relevant.len();
        Self { id: id.into(), text: text.into(), relevant, relevant_total }
    }

    /// Maps external judged ids through `doc_id_map`. Ids missing from the
    /// index are logged and kept in `relevant_total`.
    pub fn resolve(
        id: impl Into<String>,
        text: impl Into<String>,
        judged: &[String],
        doc_id_map: &HashMap<String, DocId>,
    ) -> Self {
        let id = id.into();
        let judged: HashSet<&str> = judged.iter().map(String::as_str).collect();
        let mut relevant = HashSet::with_capacity(judged.len());
        for ext in &judged {
            match doc_id_map.get(*ext) {
                Some(&doc_id) => {
                    relevant.insert(doc_id);
                }
                None => tracing::warn!(query = %id, doc = %ext, "judged document is not in the index"),
            }
        }
        Self { id, text: text.into(), relevant, relevant_total: judged.len() }
    }

    pub fn prf(&self, results: &[SearchResult]) -> Prf {
        query_prf(results, &self.relevant, self.relevant_total)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    queries: Vec<JudgedQuery>,
}

impl Evaluator {
    pub fn new(queries: Vec<JudgedQuery>) -> Self { Self { queries } }

    pub fn queries(&self) -> &[JudgedQuery] { &self.queries }

    pub fn average_prf<R: Retriever>(&self, retriever: &R, k: usize) -> Prf {
        if self.queries.is_empty() {
            return Prf::default();
        }
        let (mut p, mut r, mut f) = (0.0, 0.0, 0.0);
        for q in &self.queries {
            let prf = q.prf(&retriever.retrieve(&q.text, k));
            p += prf.precision;
            r += prf.recall;
            f += prf.f1;
        }
        let n = self.queries.len() as f64;
        Prf { precision: p / n, recall: r / n, f1: f / n }
    }

    /// Averages for every k in `1..=max_k`.
    pub fn curve<R: Retriever>(&self, retriever: &R, max_k: usize) -> Vec<(usize, Prf)> {
        (1..=max_k).map(|k| (k, self.average_prf(retriever, k))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{IndexBuilder, Model};
    use crate::tokenizer::WhitespaceTokenizer;
    use crate::weighting::WeightingOptions;

    struct Fixed(Vec<SearchResult>);

    impl Retriever for Fixed {
        fn retrieve(&self, _query: &str, k: usize) -> Vec<SearchResult> {
            self.0.iter().take(k).copied().collect()
        }
    }

    fn hits(ids: &[DocId]) -> Vec<SearchResult> {
        ids.iter().enumerate().map(|(i, &d)| SearchResult::new(Some(d), 1.0 / (i + 1) as f64)).collect()
    }

    #[test]
    fn precision_recall_f1() {
        let prf = query_prf(&hits(&[1, 2, 3, 4]), &HashSet::from([2, 4, 9]), 3);
        assert_eq!(prf.precision, 0.5);
        assert!((prf.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((prf.f1 - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_sets_score_zero() {
        assert_eq!(query_prf(&[], &HashSet::from([1]), 1), Prf::default());
        assert_eq!(query_prf(&hits(&[1]), &HashSet::new(), 0), Prf::default());
        let placeholders = vec![SearchResult::placeholder(0.3)];
        assert_eq!(query_prf(&placeholders, &HashSet::from([1]), 1).precision, 0.0);
    }

    #[test]
    fn unindexed_judgments_still_count_against_recall() {
        let mut builder = IndexBuilder::new();
        builder.add_document(0, ["library", "books"]).unwrap();
        builder.add_document(1, ["garden", "tools"]).unwrap();
        let engine = SearchEngine::new(builder.build(&WeightingOptions::default()).unwrap(), WhitespaceTokenizer);
        let doc_id_map = HashMap::from([("1".to_string(), 0), ("2".to_string(), 1)]);

        let judged = JudgedQuery::resolve("q1", "library", &["1".into(), "99".into(), "1".into()], &doc_id_map);
        assert_eq!(judged.relevant, HashSet::from([0]));
        assert_eq!(judged.relevant_total, 2);

        let prf = Evaluator::new(vec![judged]).average_prf(&engine, 1);
        assert_eq!(prf.precision, 1.0);
        assert_eq!(prf.recall, 0.5);
    }

    #[test]
    fn model_searchers_are_retrievers() {
        let mut builder = IndexBuilder::new();
        builder.add_document(0, ["cat", "sat"]).unwrap();
        builder.add_document(1, ["dog"]).unwrap();
        let engine = SearchEngine::new(builder.build(&WeightingOptions::default()).unwrap(), WhitespaceTokenizer);
        let eval = Evaluator::new(vec![JudgedQuery::new("q", "dog", HashSet::from([1]))]);
        for model in [Model::TfIdf, Model::Jaccard, Model::Bm25(Default::default())] {
            assert_eq!(eval.average_prf(&engine.with_model(model), 1).recall, 1.0);
        }
    }

    #[test]
    fn relevance_lines_parse() {
        let rel = parse_relevance("1\t3 4 5\n\n2\t 7\n1\t9\n").unwrap();
        assert_eq!(rel["1"], vec!["3", "4", "5", "9"]);
        assert_eq!(rel["2"], vec!["7"]);
        assert!(parse_relevance("1 3 4").is_err());
    }

    #[test]
    fn averages_and_curve() {
        let eval = Evaluator::new(vec![
            JudgedQuery::new("a", "x", HashSet::from([1])),
            JudgedQuery::new("b", "y", HashSet::from([2])),
        ]);
        let retriever = Fixed(hits(&[1, 2]));
        let at1 = eval.average_prf(&retriever, 1);
        assert_eq!(at1.precision, 0.5);
        assert_eq!(at1.recall, 0.5);

        let curve = eval.curve(&retriever, 2);
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[1].1.recall, 1.0);
        assert_eq!(curve[1].1.precision, 0.5);
        assert_eq!(Evaluator::default().average_prf(&retriever, 3), Prf::default());
    }
}
