//! Pipeline record types shared across ingestion, indexing and retrieval.

use serde::{Deserialize, Serialize};

/// Per-chunk metadata.
///
/// Successful chunks carry their position within the source document;
/// documents that failed to load are represented by a single sentinel
/// record carrying the error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkMeta {
    Chunk {
        /// Source path relative to the ingestion root
        path: String,
        /// 0-based position of the chunk within its document
        chunk_index: usize,
        /// Length of the chunk text in Unicode scalar values
        chars: usize,
    },
    Error {
        error: String,
    },
}

impl ChunkMeta {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<sha256(relative path)>_<index:05>`, or `ERR_<sha256(path)>` for sentinels
    pub chunk_id: String,

    /// Path relative to the ingestion root, `/`-separated
    pub source: String,

    /// Chunk content; empty only for error sentinels
    pub text: String,

    pub meta: ChunkMeta,
}

impl Chunk {
    /// Whether this record stands in for a document that failed to load.
    pub fn is_sentinel(&self) -> bool {
        self.meta.is_error()
    }

    /// Metadata projection stored alongside the index.
    pub fn to_docstore_entry(&self) -> DocstoreEntry {
        DocstoreEntry {
            chunk_id: self.chunk_id.clone(),
            source: self.source.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Index-aligned metadata record; `docstore[i]` describes index row `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocstoreEntry {
    pub chunk_id: String,
    pub source: String,
    pub meta: ChunkMeta,
}

/// A docstore record joined with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    #[serde(flatten)]
    pub entry: DocstoreEntry,

    /// Inner product between query and chunk vectors; higher is more similar
    pub score: f32,
}

impl RetrievalResult {
    pub fn chunk_id(&self) -> &str {
        &self.entry.chunk_id
    }

    pub fn source(&self) -> &str {
        &self.entry.source
    }
}
