//! Retrieval-augmented answering.
//!
//! Joins retrieved chunks back to their text, renders the prompt template
//! and calls the configured generation backend.

pub mod ask;
pub mod types;

pub use ask::{format_context, RagSession};
pub use types::{AnswerResult, Latency};
