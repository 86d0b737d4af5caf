use crate::counts::TermCountStore;
use crate::engine::Index;
use crate::store::DocumentStore;
use crate::terms::Vocabulary;
use crate::weighting::WeightingScheme;
use crate::{DocId, DocMeta};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub scheme: WeightingScheme,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn vectors(&self) -> PathBuf { self.root.join("vectors.bin") }
    fn term_counts(&self) -> PathBuf { self.root.join("term_counts.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn doc_id_map(&self) -> PathBuf { self.root.join("doc_id_map.bin") }
    pub fn texts_dir(&self) -> PathBuf { self.root.join("texts") }
    /// Path of a document's stored text, relative to the index root.
    pub fn text_rel(doc_id: DocId) -> String { format!("texts/{doc_id}.txt") }
}

fn write_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn read_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = bincode::deserialize_from(BufReader::new(f))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_docs(paths: &IndexPaths, docs: &HashMap<DocId, DocMeta>) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    write_bin(&paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<HashMap<DocId, DocMeta>> { read_bin(&paths.docs()) }

pub fn save_doc_id_map(paths: &IndexPaths, map: &HashMap<String, DocId>) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    write_bin(&paths.doc_id_map(), map)
}

pub fn load_doc_id_map(paths: &IndexPaths) -> Result<HashMap<String, DocId>> { read_bin(&paths.doc_id_map()) }

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(paths.meta(), json)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let text = fs::read_to_string(paths.meta()).with_context(|| format!("reading {}", paths.meta().display()))?;
    let meta: MetaFile = serde_json::from_str(&text)?;
    Ok(meta)
}

/// Writes the vocabulary, both document stores and `meta`. The scheme recorded in
/// `meta` is taken from the index so queries are weighed the same way.
pub fn save_index(paths: &IndexPaths, index: &Index, meta: &MetaFile) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    write_bin(&paths.vocabulary(), index.vocabulary())?;
    write_bin(&paths.vectors(), index.store())?;
    write_bin(&paths.term_counts(), index.counts())?;
    let meta = MetaFile { num_docs: index.num_docs(), scheme: index.scheme(), ..meta.clone() };
    save_meta(paths, &meta)
}

/// Loads everything needed to answer queries.
pub fn load_index(paths: &IndexPaths) -> Result<(Index, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("index format version {} is not supported (expected {FORMAT_VERSION})", meta.version);
    }
    let vocabulary: Vocabulary = read_bin(&paths.vocabulary())?;
    let store: DocumentStore = read_bin(&paths.vectors())?;
    if store.len() as u32 != meta.num_docs {
        bail!("meta.json lists {} documents but the vector store holds {}", meta.num_docs, store.len());
    }
    let counts: TermCountStore = read_bin(&paths.term_counts())?;
    Ok((Index::from_parts(vocabulary, store, counts, meta.scheme)?, meta))
}
