//! Answer types.

use crate::types::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock timings of an answer, in seconds rounded to milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Latency {
    pub total_s: f64,
    pub retrieve_s: f64,
    pub generate_s: f64,
}

impl Latency {
    pub fn new(retrieve: Duration, generate: Duration) -> Self {
        Self {
            total_s: round3((retrieve + generate).as_secs_f64()),
            retrieve_s: round3(retrieve.as_secs_f64()),
            generate_s: round3(generate.as_secs_f64()),
        }
    }
}

fn round3(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub retrieved: Vec<RetrievalResult>,
    pub latency: Latency,
}

impl AnswerResult {
    /// Citation tag for a retrieved chunk, as written into the prompt context.
    pub fn citation(result: &RetrievalResult) -> String {
        format!("[source:{}#{}]", result.source(), result.chunk_id())
    }

    /// Retrieved chunks whose citation tag appears in the answer text.
    pub fn cited(&self) -> Vec<&RetrievalResult> {
        self.retrieved
            .iter()
            .filter(|r| self.answer.contains(&Self::citation(r)))
            .collect()
    }
}
