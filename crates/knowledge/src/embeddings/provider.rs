//! Embedding provider trait and factory.

use super::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
use docrag_core::config::{resolve_secret, EmbeddingsConfig};
use docrag_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama", "openai")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            AppError::ModelUnavailable(format!(
                "{} returned no embedding",
                self.provider_name()
            ))
        })
    }
}

/// Shared handle to a loaded embedding model.
pub type Embedder = Arc<dyn EmbeddingProvider>;

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingsConfig) -> AppResult<Embedder> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        config.provider,
        config.model_name,
        config.dimensions
    );

    match config.provider.to_lowercase().as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(
            config.model_name.clone(),
            config.dimensions,
        ))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.endpoint.as_deref(),
            config.model_name.clone(),
            config.dimensions,
        ))),

        "openai" => {
            let api_key = resolve_secret(&config.api_key_env).ok_or_else(|| {
                AppError::ModelUnavailable(format!(
                    "OpenAI embeddings require an API key in {}",
                    config.api_key_env
                ))
            })?;
            Ok(Arc::new(OpenAiProvider::new(
                config.endpoint.as_deref(),
                api_key,
                config.model_name.clone(),
                config.dimensions,
            )))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, openai",
            config.provider
        ))),
    }
}
