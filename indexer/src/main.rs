mod corpus;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::eval::{parse_relevance, Evaluator, JudgedQuery};
use vsm_core::observer::{LogObserver, TraceSelection};
use vsm_core::persist::{
    load_doc_id_map, load_index, save_doc_id_map, save_docs, save_index, IndexPaths, MetaFile, FORMAT_VERSION,
};
use vsm_core::tokenizer::{StandardTokenizer, Tokenize};
use vsm_core::{
    Bm25Params, DocId, DocMeta, IdfScheme, IndexBuilder, Model, SearchEngine, TfScheme, WeightingOptions, WeightingScheme,
};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and evaluate a TF-IDF vector-space index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use log-scaled TF = 1 + ln(tf) instead of raw counts
        #[arg(long, default_value_t = false)]
        log_tf: bool,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// External document ids whose weighting is logged at debug level
        #[arg(long = "trace-doc")]
        trace_docs: Vec<String>,
    },
    /// Report precision / recall / F1 of an index against relevance judgments
    Eval {
        /// Index directory
        #[arg(long)]
        index: String,
        /// JSONL file of {"id", "text"} queries
        #[arg(long)]
        queries: String,
        /// Relevance judgments, one `qid<TAB>doc doc ...` line per query
        #[arg(long)]
        relevance: String,
        /// Result count per query
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Also print one CSV row per k in 1..=N
        #[arg(long)]
        curve_to: Option<usize>,
        /// Ranking model
        #[arg(long, value_enum, default_value_t = ModelArg::Tfidf)]
        model: ModelArg,
        /// BM25 term-frequency saturation
        #[arg(long, default_value_t = 1.2)]
        k1: f64,
        /// BM25 length normalization
        #[arg(long, default_value_t = 0.75)]
        b: f64,
        /// BM25 query term-frequency saturation
        #[arg(long, default_value_t = 2.0)]
        k3: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    Tfidf,
    Jaccard,
    Bm25,
}

impl ModelArg {
    fn with_params(self, params: Bm25Params) -> Model {
        match self {
            ModelArg::Tfidf => Model::TfIdf,
            ModelArg::Jaccard => Model::Jaccard,
            ModelArg::Bm25 => Model::Bm25(params),
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, log_tf, smoothed_idf, trace_docs } => {
            let scheme = WeightingScheme {
                tf: if log_tf { TfScheme::Log } else { TfScheme::Raw },
                idf: if smoothed_idf { IdfScheme::Smoothed } else { IdfScheme::Standard },
            };
            build_index(Path::new(&input), Path::new(&output), scheme, &trace_docs)
        }
        Commands::Eval { index, queries, relevance, k, curve_to, model, k1, b, k3 } => {
            let model = model.with_params(Bm25Params { k1, b, k3 });
            evaluate(Path::new(&index), Path::new(&queries), Path::new(&relevance), k, curve_to, model)
        }
    }
}

fn build_index(input: &Path, output: &Path, scheme: WeightingScheme, trace_docs: &[String]) -> Result<()> {
    let out_paths = IndexPaths::new(output);
    fs::create_dir_all(out_paths.texts_dir())?;

    let inputs = corpus::load_documents(input)?;
    let tokenizer = StandardTokenizer;
    let mut builder = IndexBuilder::new();
    let mut docs: HashMap<DocId, DocMeta> = HashMap::new();
    let mut doc_id_map: HashMap<String, DocId> = HashMap::new();

    for (n, doc) in inputs.into_iter().enumerate() {
        let doc_id = n as DocId;
        if doc_id_map.insert(doc.id.clone(), doc_id).is_some() {
            bail!("duplicate document id {:?} in input", doc.id);
        }
        builder.add_document(doc_id, tokenizer.tokens(&doc.body))?;

        // Write text for snippet extraction
        let text_rel = IndexPaths::text_rel(doc_id);
        fs::write(out_paths.root.join(&text_rel), &doc.body)?;
        docs.insert(doc_id, DocMeta { external_id: doc.id, title: doc.title, url: doc.url, text_path: Some(text_rel) });
    }
    tracing::info!(num_docs = builder.num_docs(), num_terms = builder.terms().len(), "ingested documents");

    let mut traced = Vec::new();
    for ext in trace_docs {
        match doc_id_map.get(ext) {
            Some(&id) => traced.push(id),
            None => tracing::warn!(external_id = %ext, "trace requested for unknown document"),
        }
    }
    let options = WeightingOptions {
        scheme,
        trace: if traced.is_empty() { TraceSelection::None } else { TraceSelection::only(traced) },
    };
    let index = if matches!(options.trace, TraceSelection::None) {
        builder.build(&options)?
    } else {
        builder.build_observed(&options, &LogObserver)?
    };

    let meta = MetaFile {
        num_docs: index.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
        scheme,
    };
    save_index(&out_paths, &index, &meta)?;
    save_docs(&out_paths, &docs)?;
    save_doc_id_map(&out_paths, &doc_id_map)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

fn evaluate(
    index_dir: &Path,
    queries: &Path,
    relevance: &Path,
    k: usize,
    curve_to: Option<usize>,
    model: Model,
) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let (index, _meta) = load_index(&paths)?;
    let doc_id_map = load_doc_id_map(&paths)?;
    let engine = SearchEngine::new(index, StandardTokenizer);

    let judgments = parse_relevance(
        &fs::read_to_string(relevance).with_context(|| format!("reading {}", relevance.display()))?,
    )?;
    let mut judged = Vec::new();
    for q in corpus::load_queries(queries)? {
        let Some(external) = judgments.get(&q.id) else {
            tracing::warn!(query = %q.id, "no relevance judgments; skipping query");
            continue;
        };
        judged.push(JudgedQuery::resolve(q.id, q.text, external, &doc_id_map));
    }
    let evaluator = Evaluator::new(judged);
    tracing::info!(queries = evaluator.queries().len(), ?model, "evaluating");

    let retriever = engine.with_model(model);
    let prf = evaluator.average_prf(&retriever, k);
    println!("precision@{k}={:.4} recall@{k}={:.4} f1@{k}={:.4}", prf.precision, prf.recall, prf.f1);

    if let Some(max_k) = curve_to {
        println!("k,precision,recall,f1");
        for (k, prf) in evaluator.curve(&retriever, max_k) {
            println!("{k},{},{},{}", prf.precision, prf.recall, prf.f1);
        }
    }
    Ok(())
}
