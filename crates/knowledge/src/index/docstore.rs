//! Docstore and manifest persistence.

use crate::storage::write_json_pretty;
use crate::types::DocstoreEntry;
use chrono::{DateTime, Utc};
use docrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Build information recorded next to an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub normalize: bool,
    pub count: usize,
    pub built_at: DateTime<Utc>,
    #[serde(default)]
    pub docrag_version: String,
}

pub fn write_docstore(path: &Path, entries: &[DocstoreEntry]) -> AppResult<()> {
    write_json_pretty(path, entries)
}

/// Read a docstore; a missing or malformed file is an `IndexLoad` error.
pub fn read_docstore(path: &Path) -> AppResult<Vec<DocstoreEntry>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::IndexLoad(format!("Cannot read docstore {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        AppError::IndexLoad(format!("Corrupt docstore {}: {}", path.display(), e))
    })
}

pub fn write_manifest(path: &Path, manifest: &IndexManifest) -> AppResult<()> {
    write_json_pretty(path, manifest)
}

/// Read the manifest if present. Indexes built without one load fine.
pub fn read_manifest(path: &Path) -> AppResult<Option<IndexManifest>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::IndexLoad(format!("Cannot read manifest {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&contents).map(Some).map_err(|e| {
        AppError::IndexLoad(format!("Corrupt manifest {}: {}", path.display(), e))
    })
}
