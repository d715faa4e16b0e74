//! docrag CLI
//!
//! Ingest a document directory into a vector index, then search it or ask
//! questions answered from the retrieved chunks.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand, SearchCommand, StatsCommand};
use docrag_core::config::DEFAULT_CONFIG_PATH;
use docrag_core::{logging, AppResult, LogFormat, RagConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// docrag - retrieval-augmented answers over local documents
#[derive(Parser, Debug)]
#[command(name = "docrag")]
#[command(about = "Retrieval-augmented answers over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DOCRAG_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level or filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Log output format (pretty, json)
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the chunk corpus and vector index from a document directory
    Ingest(IngestCommand),

    /// Retrieve the chunks closest to a query
    Search(SearchCommand),

    /// Answer a question from retrieved chunks
    Ask(AskCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Search(_) => "search",
            Commands::Ask(_) => "ask",
            Commands::Stats(_) => "stats",
        }
    }
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (pretty, json)", s))
}

async fn run(cli: Cli) -> AppResult<()> {
    // Stats only reads index files and works without a config.
    let config = match (&cli.command, RagConfig::load(&cli.config)) {
        (_, Ok(config)) => config,
        (Commands::Stats(_), Err(_)) if !cli.config.exists() => RagConfig::default(),
        (_, Err(e)) => return Err(e),
    };

    let config = config.with_overrides(cli.log_level, cli.verbose, cli.no_color, cli.log_format);

    logging::init_logging(
        config.logging.level.as_deref(),
        !config.logging.color,
        config.logging.format,
    )?;

    tracing::info!("docrag starting");
    tracing::debug!("Config: {:?}", cli.config);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(kind = e.kind(), "Command failed: {}", e),
    }

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
