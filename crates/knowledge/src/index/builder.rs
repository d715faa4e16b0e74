//! Index construction from a corpus file.

use super::{write_docstore, write_manifest, FlatIpIndex, IndexManifest, VectorIndex};
use super::{DOCSTORE_FILE, INDEX_FILE, MANIFEST_FILE};
use crate::corpus::read_corpus;
use crate::embeddings::{embed_in_batches, l2_normalize, EmbeddingProvider};
use crate::progress::ProgressReporter;
use crate::types::DocstoreEntry;
use chrono::Utc;
use docrag_core::config::EmbeddingsConfig;
use docrag_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Progress and cancellation for an index build.
#[derive(Debug, Clone, Default)]
pub struct BuildControl {
    pub progress: ProgressReporter,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BuildControl {
    pub fn new(progress: ProgressReporter) -> Self {
        Self {
            progress,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Outcome of an index build.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub index_dir: PathBuf,
    pub vectors: usize,
    pub dimensions: usize,
    /// Corpus records left out because their text was empty
    pub skipped: usize,
}

/// Embed every non-empty corpus record and persist index, docstore and manifest.
///
/// # Errors
/// - `AppError::EmptyCorpus` if no record has text
/// - `AppError::ModelUnavailable` if the embedder fails or returns vectors
///   of the wrong dimension
/// - `AppError::Cancelled` if the cancel flag is raised between batches
#[tracing::instrument(skip(config, embedder, control), fields(provider = embedder.provider_name()))]
pub async fn build_index(
    corpus_path: &Path,
    index_dir: &Path,
    config: &EmbeddingsConfig,
    embedder: &dyn EmbeddingProvider,
    control: &BuildControl,
) -> AppResult<IndexSummary> {
    let corpus = read_corpus(corpus_path)?;
    let total = corpus.len();

    let (texts, entries): (Vec<String>, Vec<DocstoreEntry>) = corpus
        .into_iter()
        .filter(|chunk| !chunk.text.is_empty())
        .map(|chunk| {
            let entry = chunk.to_docstore_entry();
            (chunk.text, entry)
        })
        .unzip();

    if texts.is_empty() {
        return Err(AppError::EmptyCorpus(format!(
            "No chunks with text in {} ({} records)",
            corpus_path.display(),
            total
        )));
    }

    let skipped = total - texts.len();
    tracing::info!(
        "Embedding {} chunks with {}/{} (batch size {}, {} skipped)",
        texts.len(),
        embedder.provider_name(),
        embedder.model_name(),
        config.batch_size,
        skipped
    );

    let mut vectors = embed_in_batches(
        embedder,
        &texts,
        config.batch_size,
        &control.progress,
        control.cancel.as_ref(),
    )
    .await?;

    if config.normalize {
        for vector in &mut vectors {
            l2_normalize(vector);
        }
    }

    let dim = embedder.dimensions();
    let index = FlatIpIndex::from_vectors(dim, &vectors)?;

    control
        .progress
        .index(index.len() as u64, &index_dir.display().to_string());

    index.save(&index_dir.join(INDEX_FILE))?;
    write_docstore(&index_dir.join(DOCSTORE_FILE), &entries)?;
    write_manifest(
        &index_dir.join(MANIFEST_FILE),
        &IndexManifest {
            provider: embedder.provider_name().to_string(),
            model: embedder.model_name().to_string(),
            dimensions: dim,
            normalize: config.normalize,
            count: index.len(),
            built_at: Utc::now(),
            docrag_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )?;

    tracing::info!("Built index with {} vectors in {:?}", index.len(), index_dir);

    Ok(IndexSummary {
        index_dir: index_dir.to_path_buf(),
        vectors: index.len(),
        dimensions: dim,
        skipped,
    })
}
