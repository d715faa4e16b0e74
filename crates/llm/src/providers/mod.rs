//! Generation backend implementations.

pub mod hosted;
pub mod ollama;

pub use hosted::HostedClient;
pub use ollama::OllamaClient;
