//! Error types for docrag.
//!
//! A single error enum covers every failure category in the pipeline.
//! Per-document ingestion failures (`UnsupportedFormat`, `DocumentRead`)
//! are recorded as sentinel records by the corpus builder; every other
//! variant is fatal to the operation that raised it.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for docrag.
///
/// All fallible functions return `Result<T, AppError>`. Callers that need
/// to branch on the failure category can match on the variant or use
/// [`AppError::kind`] for a stable string tag.
#[derive(Error, Debug)]
pub enum AppError {
    /// The file extension is not one of the recognized document types.
    #[error("Unsupported file type: {extension} ({})", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The document was recognized but could not be parsed.
    #[error("Failed to read document {}: {message}", path.display())]
    DocumentRead { path: PathBuf, message: String },

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index build attempted with no usable chunks
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// Index, docstore or manifest missing or corrupt at load time
    #[error("Index load error: {0}")]
    IndexLoad(String),

    /// Embedding or generation backend unreachable or misconfigured
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Generation backend returned an unusable response
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Index build stopped between batches at the caller's request
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Stable, machine-readable tag for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::DocumentRead { .. } => "document_read",
            Self::Config(_) => "config",
            Self::EmptyCorpus(_) => "empty_corpus",
            Self::IndexLoad(_) => "index_load",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::Llm(_) => "llm",
            Self::Prompt(_) => "prompt",
            Self::Cancelled(_) => "cancelled",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }

    /// Whether the error is isolated to a single document during ingestion.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::DocumentRead { .. }
        )
    }

    /// Shorthand for a [`AppError::DocumentRead`] with any displayable cause.
    pub fn document_read(path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
        Self::DocumentRead {
            path: path.into(),
            message: cause.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(AppError::Config("x".into()).kind(), "config");
        assert_eq!(AppError::EmptyCorpus("x".into()).kind(), "empty_corpus");
        assert_eq!(AppError::IndexLoad("x".into()).kind(), "index_load");
        assert_eq!(
            AppError::ModelUnavailable("x".into()).kind(),
            "model_unavailable"
        );
    }

    #[test]
    fn test_per_document_errors() {
        let unsupported = AppError::UnsupportedFormat {
            path: PathBuf::from("a.exe"),
            extension: ".exe".to_string(),
        };
        assert!(unsupported.is_per_document());
        assert!(unsupported.to_string().contains("Unsupported file type: .exe"));

        let read = AppError::document_read("bad.pdf", "invalid header");
        assert!(read.is_per_document());
        assert_eq!(read.kind(), "document_read");
        assert!(read.to_string().contains("invalid header"));

        assert!(!AppError::Config("x".into()).is_per_document());
    }

    #[test]
    fn test_from_json_error() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "serialization");
    }
}
