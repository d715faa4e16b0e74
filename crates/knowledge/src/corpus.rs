//! Corpus building: discovery, per-document processing and the JSONL chunk store.

use crate::chunker::{chunk_text, normalize_text, ChunkingParams};
use crate::loader::{is_supported, load_document};
use crate::progress::ProgressReporter;
use crate::storage::{sha256_hex, write_atomic};
use crate::types::{Chunk, ChunkMeta};
use docrag_core::config::IngestConfig;
use docrag_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Recursively find supported documents under `root`, sorted by path.
///
/// Unreadable directory entries are logged and skipped.
pub fn discover_files(root: &Path) -> AppResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input directory not found: {}", root.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
pub fn relative_source(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Deterministic identifier of the `index`-th chunk of a document.
pub fn chunk_id(source: &str, index: usize) -> String {
    format!("{}_{:05}", sha256_hex(source), index)
}

/// Identifier of the sentinel record for a document that failed to load.
pub fn error_chunk_id(path: &Path) -> String {
    format!("ERR_{}", sha256_hex(&path.to_string_lossy()))
}

/// Load, normalize and chunk one document.
///
/// Never fails: a document that cannot be loaded yields a single sentinel
/// record carrying the error message.
pub fn process_document(root: &Path, path: &Path, params: &ChunkingParams) -> Vec<Chunk> {
    let source = relative_source(root, path);

    let result = load_document(path)
        .map(|raw| normalize_text(&raw))
        .and_then(|text| chunk_text(&text, params));

    match result {
        Ok(texts) => texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                chunk_id: chunk_id(&source, index),
                source: source.clone(),
                meta: ChunkMeta::Chunk {
                    path: source.clone(),
                    chunk_index: index,
                    chars: text.chars().count(),
                },
                text,
            })
            .collect(),
        Err(e) => {
            if e.is_per_document() {
                tracing::warn!(kind = e.kind(), "Failed to ingest {:?}: {}", path, e);
            } else {
                tracing::error!(kind = e.kind(), "Unexpected failure ingesting {:?}: {}", path, e);
            }
            vec![Chunk {
                chunk_id: error_chunk_id(path),
                source,
                text: String::new(),
                meta: ChunkMeta::Error {
                    error: e.to_string(),
                },
            }]
        }
    }
}

/// Build the corpus for every supported file under `input_dir`.
///
/// The output order is the sorted file order regardless of `workers`.
#[tracing::instrument(skip(config, progress), fields(workers = config.workers))]
pub async fn build_corpus(
    input_dir: &Path,
    config: &IngestConfig,
    progress: &ProgressReporter,
) -> AppResult<Vec<Chunk>> {
    let params = ChunkingParams::from(config);
    params.validate()?;

    let mut files = discover_files(input_dir)?;
    if let Some(max_docs) = config.max_docs {
        files.truncate(max_docs);
    }

    let total = files.len() as u64;
    progress.discover(total, &input_dir.display().to_string());
    tracing::info!("Ingesting {} files from {:?}", total, input_dir);

    let mut corpus = Vec::new();

    if config.workers <= 1 {
        for (i, path) in files.iter().enumerate() {
            let chunks = process_document(input_dir, path, &params);
            progress.load(i as u64 + 1, total, &path.display().to_string(), chunks.len());
            corpus.extend(chunks);
        }
    } else {
        let root = Arc::new(input_dir.to_path_buf());
        let mut results = stream::iter(files)
            .map(|path| {
                let root = Arc::clone(&root);
                async move {
                    let display = path.display().to_string();
                    tokio::task::spawn_blocking(move || process_document(&root, &path, &params))
                        .await
                        .map(|chunks| (display, chunks))
                        .map_err(|e| AppError::Other(format!("Ingestion worker failed: {}", e)))
                }
            })
            .buffered(config.workers);

        let mut done = 0u64;
        while let Some(result) = results.next().await {
            let (display, chunks) = result?;
            done += 1;
            progress.load(done, total, &display, chunks.len());
            corpus.extend(chunks);
        }
    }

    let failed = corpus.iter().filter(|c| c.is_sentinel()).count();
    tracing::info!(
        "Built corpus: {} records from {} files ({} failed)",
        corpus.len(),
        total,
        failed
    );

    Ok(corpus)
}

/// Write the corpus as JSON lines, replacing any previous file.
pub fn write_corpus(path: &Path, chunks: &[Chunk]) -> AppResult<()> {
    write_atomic(path, |w| {
        for chunk in chunks {
            serde_json::to_writer(&mut *w, chunk)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    })?;

    tracing::info!("Saved {} chunk records to {:?}", chunks.len(), path);
    Ok(())
}

/// Read a JSON-lines corpus; blank lines are skipped.
pub fn read_corpus(path: &Path) -> AppResult<Vec<Chunk>> {
    let file = File::open(path)?;
    let mut chunks = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: Chunk = serde_json::from_str(&line).map_err(|e| {
            AppError::Serialization(format!("{}:{}: {}", path.display(), line_no + 1, e))
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

/// Read-only lookup of chunk text by id.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    texts: HashMap<String, String>,
}

impl CorpusStore {
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        let texts = chunks
            .into_iter()
            .map(|chunk| (chunk.chunk_id, chunk.text))
            .collect();
        Self { texts }
    }

    /// Load the store from a JSON-lines corpus file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let store = Self::from_chunks(read_corpus(path)?);
        tracing::debug!("Loaded {} chunk texts from {:?}", store.len(), path);
        Ok(store)
    }

    pub fn text(&self, chunk_id: &str) -> Option<&str> {
        self.texts.get(chunk_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ingest_config() -> IngestConfig {
        IngestConfig {
            chunk_size: 40,
            chunk_overlap: 10,
            min_chunk_chars: 5,
            ..IngestConfig::default()
        }
    }

    #[test]
    fn test_discover_files_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.md"), "a").unwrap();
        fs::write(temp.path().join("sub").join("c.json"), "{}").unwrap();
        fs::write(temp.path().join("skip.exe"), "x").unwrap();

        let files = discover_files(temp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| relative_source(temp.path(), p))
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt", "sub/c.json"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = discover_files(Path::new("/no/such/dir")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_chunk_id_format() {
        let id = chunk_id("docs/a.txt", 7);
        assert!(id.ends_with("_00007"));
        assert_eq!(id.len(), 64 + 6);
        assert_eq!(id, chunk_id("docs/a.txt", 7));
    }

    #[test]
    fn test_process_document_sentinel() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let chunks = process_document(temp.path(), &path, &ChunkingParams::new(40, 10, 5));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chunk_id.starts_with("ERR_"));
        assert_eq!(chunks[0].source, "bad.json");
        assert!(chunks[0].text.is_empty());
        assert!(chunks[0].is_sentinel());
    }

    #[test]
    fn test_process_document_meta() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        let chunks = process_document(temp.path(), &path, &ChunkingParams::new(40, 10, 5));
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            match &chunk.meta {
                ChunkMeta::Chunk {
                    path,
                    chunk_index,
                    chars,
                } => {
                    assert_eq!(path, "notes.txt");
                    assert_eq!(*chunk_index, i);
                    assert_eq!(*chars, chunk.text.chars().count());
                }
                ChunkMeta::Error { .. } => panic!("unexpected sentinel"),
            }
        }
    }

    #[tokio::test]
    async fn test_build_corpus_max_docs() {
        let temp = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(temp.path().join(name), format!("{} document body text", name)).unwrap();
        }

        let config = IngestConfig {
            max_docs: Some(2),
            ..ingest_config()
        };
        let corpus = build_corpus(temp.path(), &config, &ProgressReporter::noop())
            .await
            .unwrap();

        let sources: Vec<&str> = corpus.iter().map(|c| c.source.as_str()).collect();
        assert_eq!(sources, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_build_corpus_rejects_bad_params() {
        let temp = TempDir::new().unwrap();
        let config = IngestConfig {
            chunk_overlap: 40,
            ..ingest_config()
        };
        let err = build_corpus(temp.path(), &config, &ProgressReporter::noop())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_corpus_roundtrip_and_store() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("processed").join("chunks.jsonl");

        let chunks = vec![
            Chunk {
                chunk_id: chunk_id("a.txt", 0),
                source: "a.txt".to_string(),
                text: "alpha".to_string(),
                meta: ChunkMeta::Chunk {
                    path: "a.txt".to_string(),
                    chunk_index: 0,
                    chars: 5,
                },
            },
            Chunk {
                chunk_id: "ERR_x".to_string(),
                source: "b.pdf".to_string(),
                text: String::new(),
                meta: ChunkMeta::Error {
                    error: "broken".to_string(),
                },
            },
        ];

        write_corpus(&path, &chunks).unwrap();
        assert_eq!(read_corpus(&path).unwrap(), chunks);

        let store = CorpusStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.text(&chunk_id("a.txt", 0)), Some("alpha"));
        assert_eq!(store.text("missing"), None);
    }

    #[test]
    fn test_read_corpus_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chunks.jsonl");
        fs::write(
            &path,
            "\n{\"chunk_id\":\"x_00000\",\"source\":\"x.txt\",\"text\":\"hi\",\"meta\":{\"path\":\"x.txt\",\"chunk_index\":0,\"chars\":2}}\n\n",
        )
        .unwrap();

        let chunks = read_corpus(&path).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hi");
    }
}
