//! Document ingestion and retrieval.
//!
//! Turns a directory of heterogeneous documents into a chunk corpus and a
//! flat inner-product vector index, then answers questions from it.
//!
//! # Pipeline
//!
//! ```text
//! input_dir --loader/chunker--> chunks.jsonl --embed--> index.bin + docstore.json
//!                                                     |
//!                                query --retrieve-----+--> RagSession::answer
//! ```

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod progress;
pub mod rag;
pub mod retriever;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use corpus::{build_corpus, read_corpus, write_corpus, CorpusStore};
pub use embeddings::{create_provider, Embedder, EmbeddingProvider};
pub use index::{build_index, BuildControl, FlatIpIndex, IndexManifest, IndexSummary};
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{AnswerResult, Latency, RagSession};
pub use retriever::{load_index, load_index_with_embedder, retrieve, LoadedIndex};
pub use types::{Chunk, ChunkMeta, DocstoreEntry, RetrievalResult};

use docrag_core::{AppResult, RagConfig};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File name of the corpus written by [`ingest`].
pub const CORPUS_FILE: &str = "chunks.jsonl";

/// Counters reported by [`ingest`].
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    /// Records written to the corpus, sentinels included
    pub records: usize,
    /// Documents that failed to load
    pub failed_documents: usize,
    pub vectors: usize,
    pub dimensions: usize,
    pub duration_secs: f64,
}

/// Where [`ingest`] put its outputs.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    pub corpus_path: PathBuf,
    pub index_dir: PathBuf,
    pub stats: IngestStats,
}

/// Run the full ingestion pipeline.
///
/// Validates `config` before touching the filesystem, builds the corpus from
/// `input_dir`, writes it to `out_dir/chunks.jsonl`, then embeds it into
/// `index_dir`.
pub async fn ingest(
    input_dir: &Path,
    out_dir: &Path,
    index_dir: &Path,
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
    control: &BuildControl,
) -> AppResult<IngestOutput> {
    config.validate()?;
    let start = Instant::now();

    tracing::info!("Starting ingestion of {:?}", input_dir);

    let corpus = build_corpus(input_dir, &config.ingest, &control.progress).await?;
    let failed_documents = corpus.iter().filter(|c| c.is_sentinel()).count();

    std::fs::create_dir_all(out_dir)?;
    let corpus_path = out_dir.join(CORPUS_FILE);
    write_corpus(&corpus_path, &corpus)?;

    let summary = build_index(
        &corpus_path,
        index_dir,
        &config.embeddings,
        embedder,
        control,
    )
    .await?;

    let duration = start.elapsed();
    tracing::info!(
        "Ingestion completed: {} records, {} vectors in {:.2}s",
        corpus.len(),
        summary.vectors,
        duration.as_secs_f64()
    );

    Ok(IngestOutput {
        corpus_path,
        index_dir: summary.index_dir,
        stats: IngestStats {
            records: corpus.len(),
            failed_documents,
            vectors: summary.vectors,
            dimensions: summary.dimensions,
            duration_secs: duration.as_secs_f64(),
        },
    })
}

/// Summary of a persisted index, read without loading an embedder.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub index_dir: PathBuf,
    pub manifest: Option<IndexManifest>,
    pub chunks: usize,
    pub sources: usize,
}

/// Read the docstore and manifest in `index_dir`.
pub fn index_stats(index_dir: &Path) -> AppResult<IndexStats> {
    let docstore = index::read_docstore(&index_dir.join(index::DOCSTORE_FILE))?;
    let manifest = index::read_manifest(&index_dir.join(index::MANIFEST_FILE))?;

    let sources: BTreeSet<&str> = docstore.iter().map(|e| e.source.as_str()).collect();

    Ok(IndexStats {
        index_dir: index_dir.to_path_buf(),
        manifest,
        chunks: docstore.len(),
        sources: sources.len(),
    })
}
