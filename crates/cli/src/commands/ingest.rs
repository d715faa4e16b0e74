//! Ingest command handler.

use clap::Args;
use docrag_core::{AppResult, RagConfig};
use docrag_knowledge::{create_provider, ingest, BuildControl, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Build the chunk corpus and vector index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Directory of documents to ingest
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Directory for the chunk corpus (chunks.jsonl)
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Directory for index.bin, docstore.json and manifest.json
    #[arg(long)]
    pub index_dir: PathBuf,

    /// Parallel document workers (overrides ingest.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &RagConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.input_dir);

        let mut config = config.clone();
        if let Some(workers) = self.workers {
            config.ingest.workers = workers;
        }

        let embedder = create_provider(&config.embeddings)?;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current batch");
                flag.store(true, Ordering::SeqCst);
            }
        });

        let progress = ProgressReporter::new(Arc::new(|event: ProgressEvent| {
            if event.phase == "embed" {
                tracing::info!("{}", event.format_simple());
            }
        }));
        let control = BuildControl::new(progress).with_cancel(cancel);

        let output = ingest(
            &self.input_dir,
            &self.out_dir,
            &self.index_dir,
            &config,
            embedder.as_ref(),
            &control,
        )
        .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Corpus: {}", output.corpus_path.display());
            println!("Index:  {}", output.index_dir.display());
            println!(
                "Ingested {} records ({} failed documents), {} vectors of dimension {} in {:.2}s",
                output.stats.records,
                output.stats.failed_documents,
                output.stats.vectors,
                output.stats.dimensions,
                output.stats.duration_secs
            );
        }

        Ok(())
    }
}
