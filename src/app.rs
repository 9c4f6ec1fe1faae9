//! Wiring: builds stores and pipelines from a [`Config`] and runs sessions
//!
//! Index time happens once per session; the query loop then reuses the
//! built components for every question.

use crate::config::Config;
use crate::document::{convert_files_to_docs, Document};
use crate::embedding::{build_provider, Embedder};
use crate::error::{QaError, Result};
use crate::output::{print_answers, print_documents, print_prediction_summary, Details};
use crate::pipeline::Prediction;
use crate::pipeline::{DocumentSearchPipeline, ExtractiveQaPipeline, ReaderPipeline};
use crate::reader::build_reader;
use crate::repl::{run_loop, LoopConfig, LoopStats};
use crate::retrieval::{Bm25Retriever, EmbeddingRetriever};
use crate::store::{DocumentStore, InMemoryDocumentStore, VectorDocumentStore};
use std::io::{BufRead, Write};

/// Convert the configured document directory into documents
pub fn load_documents(config: &Config) -> Result<Vec<Document>> {
    let documents = convert_files_to_docs(&config.data.doc_dir, &config.data.loader)?;
    tracing::info!(
        "Loaded {} documents from {}",
        documents.len(),
        config.data.doc_dir.display()
    );
    Ok(documents)
}

pub fn build_embedder(config: &Config) -> Result<Embedder> {
    let provider = build_provider(&config.embedding)?;
    Ok(Embedder::new(provider, config.embedding.batch_size))
}

/// Load documents, embed them all and persist the store at `store.index_path`
pub fn build_index(config: &Config, embedder: &Embedder) -> Result<VectorDocumentStore> {
    let mut store = VectorDocumentStore::new(&config.store)?;
    store.write_documents(load_documents(config)?)?;
    store.update_embeddings(embedder)?;
    store.save(&config.store.index_path)?;
    Ok(store)
}

/// Open the persisted vector store, building it on first run
///
/// A run is a first run when `rebuild` is set or no index file exists yet.
/// Otherwise the saved store is loaded as is; documents are not re-written.
///
/// # Returns
/// The store and whether it was built in this call
pub fn open_vector_store(
    config: &Config,
    embedder: &Embedder,
    rebuild: bool,
) -> Result<(VectorDocumentStore, bool)> {
    let path = &config.store.index_path;
    if rebuild || !path.exists() {
        tracing::info!("Building index at {}", path.display());
        Ok((build_index(config, embedder)?, true))
    } else {
        tracing::info!("Loading index from {}", path.display());
        Ok((VectorDocumentStore::load(path)?, false))
    }
}

/// Load documents into an in-memory store, with BM25 when `bm25` is set
pub fn build_memory_store(config: &Config, bm25: bool) -> Result<InMemoryDocumentStore> {
    let policy = config.store.duplicate_documents;
    let mut store = if bm25 {
        InMemoryDocumentStore::with_bm25(policy)?
    } else {
        InMemoryDocumentStore::new(policy)
    };
    store.write_documents(load_documents(config)?)?;
    Ok(store)
}

/// Extractive QA: BM25 retrieval, then a reader over the retrieved documents
pub fn run_ask<I: BufRead, O: Write>(config: &Config, input: &mut I, output: &mut O) -> Result<LoopStats> {
    let store = build_memory_store(config, true)?;
    let pipeline = ExtractiveQaPipeline::new(
        Bm25Retriever::new(&store)?,
        build_reader(&config.reader)?,
        config.retriever.bm25_top_k,
        config.reader.top_k,
    );

    let details = config.output.details;
    run_loop(&pipeline, input, output, &loop_config(config, false), |p, out| {
        print_report(p, details, out)
    })
}

/// Semantic search over the persisted vector store; the quit command ends it
pub fn run_search<I: BufRead, O: Write>(
    config: &Config,
    rebuild: bool,
    input: &mut I,
    output: &mut O,
) -> Result<LoopStats> {
    let embedder = build_embedder(config)?;
    let (store, _) = open_vector_store(config, &embedder, rebuild)?;

    writeln!(
        output,
        "Number of documents: {}\nNumber of embeddings: {}",
        store.get_document_count(),
        store.get_embedding_count()
    )
    .map_err(|e| QaError::io(e, "Failed to write results"))?;

    let pipeline = DocumentSearchPipeline::new(
        EmbeddingRetriever::new(&store, embedder)?,
        config.retriever.embedding_top_k,
    );

    let preview_chars = config.output.preview_chars;
    let details = config.output.details;
    run_loop(&pipeline, input, output, &loop_config(config, true), |p, out| {
        print_documents(p, preview_chars, details, out)
    })
}

/// Reader over every loaded document, no retrieval step
pub fn run_read<I: BufRead, O: Write>(config: &Config, input: &mut I, output: &mut O) -> Result<LoopStats> {
    let store = build_memory_store(config, false)?;
    let pipeline = ReaderPipeline::new(
        &store,
        build_reader(&config.reader)?,
        config.reader.standalone_top_k,
    );

    let details = config.output.details;
    run_loop(&pipeline, input, output, &loop_config(config, false), |p, out| {
        print_report(p, details, out)
    })
}

/// Answers at the chosen detail level; `all` is preceded by a prediction summary
fn print_report(prediction: &Prediction, details: Details, out: &mut impl Write) -> Result<()> {
    if details == Details::All {
        print_prediction_summary(prediction, out)?;
    }
    print_answers(prediction, details, out)
}

fn loop_config(config: &Config, with_quit: bool) -> LoopConfig {
    LoopConfig {
        prompt: config.repl.prompt.clone(),
        quit_command: with_quit.then(|| config.repl.quit_command.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> Config {
        let docs = temp.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        std::fs::write(docs.join("sky.txt"), "The sky is blue.").unwrap();
        std::fs::write(docs.join("grass.txt"), "The grass is green.").unwrap();

        let mut config = Config::default();
        config.data.doc_dir = docs;
        config.store.index_path = temp.path().join("idx.path");
        config.embedding.backend = EmbeddingBackend::Hashing;
        config.embedding.dimension = 128;
        config
    }

    #[test]
    fn test_first_run_builds_then_loads() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let embedder = build_embedder(&config).unwrap();

        let (store, built) = open_vector_store(&config, &embedder, false).unwrap();
        assert!(built);
        assert_eq!(store.get_embedding_count(), 2);
        assert!(config.store.index_path.exists());

        // New files are not picked up until a rebuild
        std::fs::write(config.data.doc_dir.join("snow.txt"), "Snow is white.").unwrap();
        let (store, built) = open_vector_store(&config, &embedder, false).unwrap();
        assert!(!built);
        assert_eq!(store.get_document_count(), 2);

        let (store, built) = open_vector_store(&config, &embedder, true).unwrap();
        assert!(built);
        assert_eq!(store.get_document_count(), 3);
    }

    #[test]
    fn test_loop_config() {
        let config = Config::default();
        assert_eq!(loop_config(&config, false).quit_command, None);
        assert_eq!(
            loop_config(&config, true).quit_command.as_deref(),
            Some("quit")
        );
    }

    #[test]
    fn test_print_report_all_starts_with_summary() {
        let prediction = Prediction {
            query: "Why?".to_string(),
            ..Prediction::default()
        };

        let mut out = Vec::new();
        print_report(&prediction, Details::All, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Query: Why? (0 answers, 0 documents)\n"));
        assert!(text.ends_with("No answers found.\n"));

        let mut out = Vec::new();
        print_report(&prediction, Details::Minimum, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Query: Why?\n"));
    }
}
