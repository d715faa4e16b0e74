//! Vector index, docstore and index build.
//!
//! An index directory holds three files written by [`build_index`]:
//! - `index.bin`: the [`FlatIpIndex`] (bincode)
//! - `docstore.json`: metadata records aligned with index rows
//! - `manifest.json`: how the index was built

pub mod builder;
pub mod docstore;
pub mod flat;

pub use builder::{build_index, BuildControl, IndexSummary};
pub use docstore::{read_docstore, read_manifest, write_docstore, write_manifest, IndexManifest};
pub use flat::FlatIpIndex;

use docrag_core::AppResult;

pub const INDEX_FILE: &str = "index.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A search hit. Backends may report an empty slot as row `-1`; callers
/// skip negative rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub row: i64,
    pub score: f32,
}

/// Trait for vector index backends.
///
/// Rows are numbered in insertion order; that order is what aligns an index
/// with its docstore.
pub trait VectorIndex: Send + Sync {
    /// Dimensionality fixed at construction.
    fn dim(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors as new rows.
    fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()>;

    /// Return up to `k` hits ordered by descending score, ties by row.
    ///
    /// Never returns more hits than there are rows, whatever `k` is.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;
}
