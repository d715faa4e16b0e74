//! Exact inner-product index over a flat row-major buffer.

use super::{SearchHit, VectorIndex};
use crate::storage::write_atomic;
use docrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Brute-force inner-product index.
///
/// With L2-normalized vectors the score is cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Build an index from row vectors.
    pub fn from_vectors(dim: usize, vectors: &[Vec<f32>]) -> AppResult<Self> {
        let mut index = Self::new(dim);
        index.add(vectors)?;
        Ok(index)
    }

    /// Persist as bincode, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        write_atomic(path, |w| {
            bincode::serialize_into(w, self)?;
            Ok(())
        })
    }

    /// Load an index written by [`FlatIpIndex::save`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::IndexLoad(format!("Cannot open index {}: {}", path.display(), e))
        })?;

        let index: Self = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            AppError::IndexLoad(format!("Corrupt index {}: {}", path.display(), e))
        })?;

        if index.dim == 0 || index.data.len() % index.dim != 0 {
            return Err(AppError::IndexLoad(format!(
                "Corrupt index {}: {} values do not form rows of dimension {}",
                path.display(),
                index.data.len(),
                index.dim
            )));
        }

        Ok(index)
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }
}

impl VectorIndex for FlatIpIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(AppError::Other(format!(
                "Cannot add {}-dimensional vector to {}-dimensional index",
                bad.len(),
                self.dim
            )));
        }

        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(AppError::IndexLoad(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dim
            )));
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, vector)| SearchHit {
                row: row as i64,
                score: Self::dot(query, vector),
            })
            .collect();

        hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.row.cmp(&b.row),
            other => other,
        });
        hits.truncate(k);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> FlatIpIndex {
        FlatIpIndex::from_vectors(
            2,
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8], vec![1.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_score_then_row() {
        let hits = sample().search(&[1.0, 0.0], 3).unwrap();
        let rows: Vec<i64> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 3, 2]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_caps_at_row_count() {
        let hits = sample().search(&[0.0, 1.0], 6).unwrap();
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| h.row >= 0));
    }

    #[test]
    fn test_search_huge_k() {
        let index = FlatIpIndex::from_vectors(2, &[vec![1.0, 0.0]]).unwrap();
        let hits = index.search(&[1.0, 0.0], usize::MAX).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row, 0);
    }

    #[test]
    fn test_search_zero_k() {
        assert!(sample().search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_checks() {
        let mut index = FlatIpIndex::new(3);
        assert!(index.add(&[vec![1.0, 2.0]]).is_err());
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_save_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");

        let index = sample();
        index.save(&path).unwrap();
        let loaded = FlatIpIndex::load(&path).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.len(), 4);
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");
        std::fs::write(&path, b"garbage").unwrap();

        let err = FlatIpIndex::load(&path).unwrap_err();
        assert_eq!(err.kind(), "index_load");
    }
}
