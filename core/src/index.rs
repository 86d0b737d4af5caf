use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type DocId = u32;

/// Display metadata for an indexed document. The scoring core never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
    pub url: Option<String>,
    /// Relative path to the stored full text for snippet extraction, e.g., texts/{doc_id}.txt
    pub text_path: Option<String>,
}
