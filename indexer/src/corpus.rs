//! Reads input documents and evaluation queries from JSON / JSONL.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InputQuery {
    pub id: String,
    pub text: String,
}

/// `.json` / `.jsonl` files under `input`, in a stable order.
pub fn input_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    files
}

pub fn load_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for file in input_files(input) {
        let before = docs.len();
        read_records(&file, &mut docs)?;
        tracing::debug!(file = %file.display(), docs = docs.len() - before, "read input file");
    }
    Ok(docs)
}

pub fn load_queries(path: &Path) -> Result<Vec<InputQuery>> {
    let mut queries = Vec::new();
    read_records(path, &mut queries)?;
    Ok(queries)
}

fn read_records<T: DeserializeOwned>(file: &Path, out: &mut Vec<T>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let record = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", file.display(), n + 1))?;
            out.push(record);
        }
        return Ok(());
    }
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping JSON file that is neither an object nor an array"),
    }
    Ok(())
}
