//! Whitespace normalization and sliding-window chunking.
//!
//! Windows are measured in Unicode scalar values, never bytes, so slicing
//! can't split a multi-byte character.

use docrag_core::config::IngestConfig;
use docrag_core::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static EXCESS_BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

/// Normalize whitespace in extracted text.
///
/// Carriage returns become newlines, runs of three or more newlines collapse
/// to a blank line, runs of spaces/tabs collapse to a single space, and the
/// result is trimmed. Applying it twice yields the same string.
pub fn normalize_text(text: &str) -> String {
    let text = text.replace('\r', "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    let text = EXCESS_BLANKS.replace_all(&text, " ");
    text.trim().to_string()
}

/// Sliding-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chars: usize,
    pub keep_short_tail: bool,
}

impl ChunkingParams {
    pub fn new(chunk_size: usize, overlap: usize, min_chars: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_chars,
            keep_short_tail: false,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl From<&IngestConfig> for ChunkingParams {
    fn from(config: &IngestConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_chars: config.min_chunk_chars,
            keep_short_tail: config.keep_short_tail,
        }
    }
}

/// A window of text with its character offsets in the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split text into overlapping windows, with offsets.
///
/// Window `[start, start + chunk_size)` is emitted when it holds at least
/// `min_chars` characters; the next window starts `overlap` characters
/// before the previous end. The walk stops once a window reaches the end of
/// the text. With `keep_short_tail`, the final window is always emitted.
pub fn chunk_windows(text: &str, params: &ChunkingParams) -> AppResult<Vec<TextWindow>> {
    params.validate()?;

    // Byte offset of every char, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = boundaries.len() - 1;

    let mut windows = Vec::new();
    if n == 0 {
        return Ok(windows);
    }

    let mut start = 0;
    loop {
        let end = n.min(start + params.chunk_size);
        let is_last = end == n;

        if end - start >= params.min_chars || (is_last && params.keep_short_tail) {
            windows.push(TextWindow {
                start,
                end,
                text: text[boundaries[start]..boundaries[end]].to_string(),
            });
        }

        if is_last {
            break;
        }
        start = end - params.overlap;
    }

    Ok(windows)
}

/// Split text into overlapping chunks.
pub fn chunk_text(text: &str, params: &ChunkingParams) -> AppResult<Vec<String>> {
    let chunks: Vec<String> = chunk_windows(text, params)?
        .into_iter()
        .map(|w| w.text)
        .collect();

    tracing::trace!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        params.chunk_size,
        params.overlap
    );

    Ok(chunks)
}
