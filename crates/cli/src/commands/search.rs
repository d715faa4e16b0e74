//! Search command handler.

use clap::Args;
use docrag_core::{AppResult, RagConfig};
use docrag_knowledge::load_index;
use std::path::PathBuf;

/// Retrieve the chunks closest to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Directory holding the index
    #[arg(long)]
    pub index_dir: PathBuf,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "4")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &RagConfig) -> AppResult<()> {
        tracing::info!("Executing search command with top_k={}", self.top_k);

        let loaded = load_index(config, &self.index_dir)?;
        let results = loaded.retrieve(&self.query, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else if results.is_empty() {
            println!("No results");
        } else {
            for (rank, result) in results.iter().enumerate() {
                println!(
                    "{:>2}. {:.4}  {}  {}",
                    rank + 1,
                    result.score,
                    result.source(),
                    result.chunk_id()
                );
            }
        }

        Ok(())
    }
}
