//! Source document loading and text extraction.
//!
//! Each supported file type is reduced to plain text. The output is not yet
//! whitespace-normalized; see [`crate::chunker::normalize_text`].

use docrag_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Recognized document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Html,
    Json,
    Csv,
    Pdf,
}

impl DocumentKind {
    /// Detect the document kind from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" | "log" => Some(Self::PlainText),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Html => "html",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }
}

/// Whether the loader recognizes this file.
pub fn is_supported(path: &Path) -> bool {
    DocumentKind::from_path(path).is_some()
}

/// Load a document and extract its text.
///
/// # Errors
/// - `AppError::UnsupportedFormat` for unrecognized extensions
/// - `AppError::DocumentRead` when the file cannot be read or parsed
pub fn load_document(path: &Path) -> AppResult<String> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| AppError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
    })?;

    let bytes = fs::read(path).map_err(|e| AppError::document_read(path, e))?;

    tracing::trace!(kind = kind.as_str(), bytes = bytes.len(), "Loading {:?}", path);

    match kind {
        DocumentKind::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DocumentKind::Html => Ok(extract_html(&String::from_utf8_lossy(&bytes))),
        DocumentKind::Json => extract_json(&bytes).map_err(|e| AppError::document_read(path, e)),
        DocumentKind::Csv => extract_csv(&bytes).map_err(|e| AppError::document_read(path, e)),
        DocumentKind::Pdf => extract_pdf(&bytes).map_err(|e| AppError::document_read(path, e)),
    }
}

/// Collect visible text nodes, one per line.
fn extract_html(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let text: &str = text;
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

/// Re-serialize JSON with two-space indentation, keeping key order.
fn extract_json(bytes: &[u8]) -> Result<String, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    serde_json::to_string_pretty(&value)
}

/// Rewrite CSV as canonical comma-separated text with `\n` line endings.
fn extract_csv(bytes: &[u8]) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    if !headers.is_empty() {
        writer.write_record(&headers).map_err(|e| e.to_string())?;
    }

    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    let buffer = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

/// Extract text page by page; a page that fails to extract contributes "".
fn extract_pdf(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;

    let pages = document
        .get_pages()
        .into_keys()
        .map(|page_number| (page_number, document.extract_text(&[page_number])));

    Ok(join_pages(pages))
}

/// Join per-page extraction results with newlines, in page order.
fn join_pages<E: std::fmt::Display>(
    pages: impl IntoIterator<Item = (u32, Result<String, E>)>,
) -> String {
    pages
        .into_iter()
        .map(|(page_number, result)| match result {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
