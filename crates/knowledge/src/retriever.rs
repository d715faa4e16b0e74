//! Index loading and top-k retrieval.

use crate::embeddings::{create_provider, l2_normalize, Embedder, EmbeddingProvider};
use crate::index::{
    read_docstore, read_manifest, FlatIpIndex, IndexManifest, VectorIndex, DOCSTORE_FILE,
    INDEX_FILE, MANIFEST_FILE,
};
use crate::types::{DocstoreEntry, RetrievalResult};
use docrag_core::{AppError, AppResult, RagConfig};
use std::path::Path;

/// A persisted index loaded for querying.
#[derive(Debug)]
pub struct LoadedIndex {
    pub embedder: Embedder,
    pub normalize: bool,
    pub index: FlatIpIndex,
    pub docstore: Vec<DocstoreEntry>,
    pub manifest: Option<IndexManifest>,
    pub config: RagConfig,
}

impl LoadedIndex {
    /// Retrieve the `top_k` best matches for `query`.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievalResult>> {
        retrieve(
            self.embedder.as_ref(),
            self.normalize,
            &self.index,
            &self.docstore,
            query,
            top_k,
        )
        .await
    }
}

/// Load the index in `index_dir`, creating the embedder from config.
pub fn load_index(config: &RagConfig, index_dir: &Path) -> AppResult<LoadedIndex> {
    let embedder = create_provider(&config.embeddings)?;
    load_index_with_embedder(config, index_dir, embedder)
}

/// Load the index in `index_dir` using an existing embedder handle.
///
/// Nothing is written. Fails with `AppError::IndexLoad` when a file is
/// missing or corrupt, when the index and docstore disagree on row count,
/// or when the index dimension differs from the embedder's.
pub fn load_index_with_embedder(
    config: &RagConfig,
    index_dir: &Path,
    embedder: Embedder,
) -> AppResult<LoadedIndex> {
    let index = FlatIpIndex::load(&index_dir.join(INDEX_FILE))?;
    let docstore = read_docstore(&index_dir.join(DOCSTORE_FILE))?;
    let manifest = read_manifest(&index_dir.join(MANIFEST_FILE))?;

    if index.len() != docstore.len() {
        return Err(AppError::IndexLoad(format!(
            "Index has {} rows but docstore has {} records in {}",
            index.len(),
            docstore.len(),
            index_dir.display()
        )));
    }

    if index.dim() != embedder.dimensions() {
        return Err(AppError::IndexLoad(format!(
            "Index dimension {} does not match embedder {}/{} dimension {}",
            index.dim(),
            embedder.provider_name(),
            embedder.model_name(),
            embedder.dimensions()
        )));
    }

    if let Some(manifest) = &manifest {
        if manifest.count != index.len() {
            return Err(AppError::IndexLoad(format!(
                "Manifest records {} vectors but index has {}",
                manifest.count,
                index.len()
            )));
        }

        if manifest.model != embedder.model_name() || manifest.provider != embedder.provider_name()
        {
            tracing::warn!(
                "Index was built with {}/{} but queries use {}/{}",
                manifest.provider,
                manifest.model,
                embedder.provider_name(),
                embedder.model_name()
            );
        }

        if manifest.normalize != config.embeddings.normalize {
            tracing::warn!(
                "Index was built with normalize={} but config has normalize={}",
                manifest.normalize,
                config.embeddings.normalize
            );
        }
    }

    tracing::debug!(
        "Loaded index from {:?}: {} vectors, dimension {}",
        index_dir,
        index.len(),
        index.dim()
    );

    Ok(LoadedIndex {
        embedder,
        normalize: config.embeddings.normalize,
        index,
        docstore,
        manifest,
        config: config.clone(),
    })
}

/// Embed `query` and return up to `top_k` docstore records with scores.
///
/// Results are ordered by descending score; negative rows and rows outside
/// the docstore are skipped.
pub async fn retrieve(
    embedder: &dyn EmbeddingProvider,
    normalize: bool,
    index: &FlatIpIndex,
    docstore: &[DocstoreEntry],
    query: &str,
    top_k: usize,
) -> AppResult<Vec<RetrievalResult>> {
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let mut query_vector = embedder.embed(query).await?;
    if normalize {
        l2_normalize(&mut query_vector);
    }

    let hits = index.search(&query_vector, top_k)?;

    let results: Vec<RetrievalResult> = hits
        .into_iter()
        .filter_map(|hit| {
            let row = usize::try_from(hit.row).ok()?;
            docstore.get(row).map(|entry| RetrievalResult {
                entry: entry.clone(),
                score: hit.score,
            })
        })
        .collect();

    tracing::debug!(
        "Retrieved {} results for query ({} chars)",
        results.len(),
        query.chars().count()
    );

    Ok(results)
}
