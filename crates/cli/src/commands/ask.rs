//! Ask command handler.
//!
//! Retrieves context for a question and generates a cited answer.

use clap::Args;
use docrag_core::{AppResult, RagConfig};
use docrag_knowledge::{AnswerResult, RagSession};
use std::path::PathBuf;

/// Answer a question from retrieved chunks
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Question to answer
    pub question: String,

    /// Directory holding the index
    #[arg(long)]
    pub index_dir: PathBuf,

    /// Chunk corpus written by ingest
    #[arg(long, default_value = "data/processed/chunks.jsonl")]
    pub chunks: PathBuf,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "4")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &RagConfig) -> AppResult<()> {
        tracing::info!(
            "Executing ask command with provider={} top_k={}",
            config.llm.provider.as_str(),
            self.top_k
        );

        let session = RagSession::open(config, &self.index_dir, &self.chunks)?;
        tracing::debug!(
            vectors = session.index().docstore.len(),
            chunks = session.corpus().len(),
            "Opened session"
        );
        let result = session.answer(&self.question, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_answer(&result);
        }

        Ok(())
    }
}

fn print_answer(result: &AnswerResult) {
    println!("Answer:");
    println!("{}", result.answer);
    println!();

    if result.retrieved.is_empty() {
        println!("Sources: (no sources available)");
    } else {
        let cited = result.cited();
        println!("Sources ({} cited):", cited.len());
        for r in &result.retrieved {
            let marker = if cited.contains(&r) { "*" } else { "-" };
            println!("{} {}#{} ({:.3})", marker, r.source(), r.chunk_id(), r.score);
        }
    }

    println!();
    println!(
        "Latency: {:.3}s total ({:.3}s retrieve, {:.3}s generate)",
        result.latency.total_s, result.latency.retrieve_s, result.latency.generate_s
    );
}
