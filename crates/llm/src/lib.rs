//! LLM integration crate for docrag.
//!
//! Provider-agnostic answer generation behind the [`LlmClient`] trait.
//!
//! # Providers
//! - **local**: Ollama runtime (default)
//! - **hosted**: OpenAI-compatible chat completions API
//!
//! # Example
//! ```no_run
//! use docrag_core::config::LlmSettings;
//! use docrag_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = LlmSettings::default();
//! let client = create_client(&settings)?;
//! let request = LlmRequest::from_settings("Hello, world!", &settings);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_with_key};
pub use providers::{HostedClient, OllamaClient};
pub use types::{ChatMessage, ChatRole};
