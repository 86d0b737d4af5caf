use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use vsm_core::persist::{load_docs, load_index, IndexPaths};
use vsm_core::rank::rank;
use vsm_core::tokenizer::StandardTokenizer;
use vsm_core::{DocId, DocMeta, SearchEngine};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Documents with a positive similarity to the query.
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    /// `None` when the similarity is undefined (zero-norm query or document).
    pub score: Option<f64>,
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_root: PathBuf,
    pub engine: Arc<SearchEngine<StandardTokenizer>>,
    pub docs: Arc<HashMap<DocId, DocMeta>>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let (index, meta) = load_index(&paths)?;
    let docs = load_docs(&paths)?;
    tracing::info!(num_docs = meta.num_docs, created_at = %meta.created_at, "index loaded");
    let state = AppState {
        index_root: PathBuf::from(&index_dir),
        engine: Arc::new(SearchEngine::new(index, StandardTokenizer)),
        docs: Arc::new(docs),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors_from_env());
    Ok(app)
}

/// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_from_env() -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);

    let scored = state.engine.score(&params.q);
    let total_hits = scored.iter().filter(|r| r.score() > 0.0).count();
    let ranked = rank(scored, k);

    let raw_terms: Vec<String> = params.q.split_whitespace().map(str::to_string).collect();
    let mut results = Vec::with_capacity(ranked.len());
    for r in ranked {
        let Some(doc_id) = r.document() else { continue };
        let Some(meta) = state.docs.get(&doc_id) else { continue };
        let snippet = meta
            .text_path
            .as_ref()
            .and_then(|rel| snippet_from_file(&state.index_root.join(rel), &raw_terms));
        results.push(SearchHit {
            doc_id,
            score: r.is_defined().then(|| r.score()),
            title: meta.title.clone(),
            url: meta.url.clone(),
            snippet,
        });
    }

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, total_hits, took_s, "search");
    Json(SearchResponse { query: params.q, took_s, total_hits, results })
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let (Some(meta), Some(vector)) = (state.docs.get(&doc_id), state.engine.index().vector_for(doc_id)) else {
        return Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found")));
    };
    let mut obj = serde_json::json!({
        "doc_id": doc_id,
        "external_id": meta.external_id,
        "title": meta.title,
        "url": meta.url,
        "norm": vector.norm(),
        "terms": vector.len(),
    });
    if let Some(rel) = &meta.text_path {
        if let Ok(text) = std::fs::read_to_string(state.index_root.join(rel)) {
            obj["text"] = serde_json::Value::String(text);
        }
    }
    Ok(Json(obj))
}

fn snippet_from_file(path: &std::path::Path, raw_terms: &[String]) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    if text.is_empty() { return None; }
    let lower = text.to_lowercase();
    // Byte offsets only line up when lowercasing kept the length.
    let first_idx = if lower.len() == text.len() {
        raw_terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .find_map(|t| lower.find(&t.to_lowercase()))
    } else {
        None
    };
    let snippet = match first_idx {
        Some(idx) => {
            let start = floor_char_boundary(&text, idx.saturating_sub(100));
            let end = floor_char_boundary(&text, (idx + 200).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    Some(highlight_terms(&snippet, raw_terms))
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t)).case_insensitive(true).build() else {
            continue;
        };
        s = pat.replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_case_insensitively() {
        let terms = vec!["rust".to_string()];
        assert_eq!(highlight_terms("Rust and rust", &terms), "<em>Rust</em> and <em>rust</em>");
    }

    #[test]
    fn char_boundaries_are_respected() {
        let s = "héllo";
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 3), 3);
    }
}
