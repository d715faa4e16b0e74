//! Command handlers for the docrag CLI.

pub mod ask;
pub mod ingest;
pub mod search;
pub mod stats;

pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
