//! Pipeline-level tests spanning ingestion, indexing and answering.

mod answer;
mod rag_ranking;

use docrag_core::RagConfig;
use std::fs;
use std::path::Path;

/// Config with small chunks and the offline trigram embedder.
pub(crate) fn test_config(chunk_size: usize, overlap: usize, min_chars: usize) -> RagConfig {
    let mut config = RagConfig::default();
    config.ingest.chunk_size = chunk_size;
    config.ingest.chunk_overlap = overlap;
    config.ingest.min_chunk_chars = min_chars;
    config.embeddings.batch_size = 2;
    config
}

pub(crate) fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
