//! Prompt templates for docrag.
//!
//! Answer prompts are plain text with `{context}` and `{question}`
//! substitution points, configured under `prompt.template`.

pub mod template;

pub use template::PromptTemplate;

/// Placeholders every answer template must contain.
pub const ANSWER_PLACEHOLDERS: [&str; 2] = ["context", "question"];
