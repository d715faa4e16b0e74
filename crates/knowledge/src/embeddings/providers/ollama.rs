//! Ollama Embedding Provider
//!
//! Semantic embeddings via Ollama's local API using models like
//! `nomic-embed-text`.
//!
//! # Features
//! - Local-first (no API costs, privacy-preserving)
//! - Batch embedding through `/api/embed`
//! - Automatic retry with exponential backoff
//!
//! # Example
//! ```no_run
//! use docrag_knowledge::embeddings::EmbeddingProvider;
//! use docrag_knowledge::embeddings::providers::OllamaProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::new(None, "nomic-embed-text", 768);
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docrag_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Maximum attempts per batch request
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Ollama embedding provider using the local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider; `base_url` defaults to `OLLAMA_URL` or localhost.
    ///
    /// No request is made until the first embedding call.
    pub fn new(base_url: Option<&str>, model: impl Into<String>, dimensions: usize) -> Self {
        let base_url = base_url
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        }
    }

    /// Embed a batch with retry logic
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;

        loop {
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(e);
                    }

                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    /// Embed a batch (no retries)
    async fn embed_once(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::ModelUnavailable(format!(
                    "Ollama not reachable at {}: {}",
                    self.base_url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            if status == StatusCode::NOT_FOUND {
                return Err(AppError::ModelUnavailable(format!(
                    "Ollama model '{}' is not installed (run: ollama pull {}): {}",
                    self.model, self.model, detail
                )));
            }

            return Err(AppError::ModelUnavailable(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AppError::ModelUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::ModelUnavailable(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // Blank inputs get zero vectors without a round trip
        let mut embeddings = vec![Vec::new(); texts.len()];
        let mut pending_idx = Vec::new();
        let mut pending = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                embeddings[i] = vec![0.0; self.dimensions];
            } else {
                pending_idx.push(i);
                pending.push(text.as_str());
            }
        }

        if !pending.is_empty() {
            let vectors = self.embed_with_retries(&pending).await?;
            for (i, vector) in pending_idx.into_iter().zip(vectors) {
                embeddings[i] = vector;
            }
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_override() {
        let provider = OllamaProvider::new(Some("http://gpu-box:11434/"), "nomic-embed-text", 768);
        assert_eq!(provider.base_url, "http://gpu-box:11434");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_request_shape() {
        let request = EmbedRequest {
            model: "nomic-embed-text",
            input: vec!["a", "b"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_inputs_skip_request() {
        // Unroutable endpoint: succeeds only if no request is sent
        let provider = OllamaProvider::new(Some("http://127.0.0.1:9"), "nomic-embed-text", 4);
        let embeddings = provider
            .embed_batch(&["".to_string(), "  ".to_string()])
            .await
            .unwrap();
        assert_eq!(embeddings, vec![vec![0.0; 4], vec![0.0; 4]]);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = OllamaProvider::new(Some("http://127.0.0.1:9"), "nomic-embed-text", 4);
        let err = provider.embed("hello").await.unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }
}
