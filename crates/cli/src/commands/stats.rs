//! Stats command handler.

use clap::Args;
use docrag_core::AppResult;
use docrag_knowledge::index_stats;
use std::path::PathBuf;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Directory holding the index
    #[arg(long)]
    pub index_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing stats command for {:?}", self.index_dir);

        let stats = index_stats(&self.index_dir)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Index: {}", stats.index_dir.display());
        println!("  Chunks: {}", stats.chunks);
        println!("  Sources: {}", stats.sources);
        match &stats.manifest {
            Some(manifest) => {
                println!("  Provider: {}", manifest.provider);
                println!("  Model: {}", manifest.model);
                println!("  Dimensions: {}", manifest.dimensions);
                println!("  Normalized: {}", manifest.normalize);
                println!("  Built at: {}", manifest.built_at);
                if !manifest.docrag_version.is_empty() {
                    println!("  Built by: docrag {}", manifest.docrag_version);
                }
            }
            None => println!("  Manifest: (none)"),
        }

        Ok(())
    }
}
