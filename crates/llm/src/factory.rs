//! LLM provider factory.
//!
//! Creates the generation client selected by `llm.provider`, resolving the
//! endpoint and, for the hosted provider, the API key from the environment.

use crate::client::LlmClient;
use crate::providers::{HostedClient, OllamaClient};
use docrag_core::config::{resolve_secret, LlmSettings};
use docrag_core::{AppError, AppResult, LlmProvider};
use std::sync::Arc;

/// Create an LLM client from settings.
///
/// # Errors
/// Returns `AppError::ModelUnavailable` if the hosted provider is selected
/// and the API key variable named by `llm.api_key_env` is unset or empty.
pub fn create_client(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    create_client_with_key(settings, resolve_secret(&settings.api_key_env))
}

/// Create an LLM client with an explicitly supplied hosted API key.
pub fn create_client_with_key(
    settings: &LlmSettings,
    api_key: Option<String>,
) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider {
        LlmProvider::Local => {
            let client = match settings.endpoint.as_deref() {
                Some(url) => OllamaClient::with_base_url(url),
                None => OllamaClient::new(),
            };
            tracing::debug!(model = %settings.local_model_name, "Using local generation provider");
            Ok(Arc::new(client))
        }
        LlmProvider::Hosted => {
            let api_key = api_key.ok_or_else(|| {
                AppError::ModelUnavailable(format!(
                    "Hosted provider requires an API key in {}",
                    settings.api_key_env
                ))
            })?;

            let client = match settings.endpoint.as_deref() {
                Some(url) => HostedClient::with_base_url(url, api_key),
                None => HostedClient::new(api_key),
            };
            tracing::debug!(model = %settings.hosted_model, "Using hosted generation provider");
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_local_client() {
        let settings = LlmSettings::default();
        let client = create_client_with_key(&settings, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_local_with_custom_endpoint() {
        let settings = LlmSettings {
            endpoint: Some("http://localhost:8080".to_string()),
            ..LlmSettings::default()
        };
        assert!(create_client_with_key(&settings, None).is_ok());
    }

    #[test]
    fn test_hosted_requires_api_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Hosted,
            api_key_env: "DOCRAG_TEST_UNSET_KEY".to_string(),
            ..LlmSettings::default()
        };

        match create_client(&settings) {
            Err(err) => {
                assert_eq!(err.kind(), "model_unavailable");
                assert!(err.to_string().contains("DOCRAG_TEST_UNSET_KEY"));
            }
            Ok(_) => panic!("Expected error for hosted provider without API key"),
        }
    }

    #[test]
    fn test_create_hosted_client() {
        let settings = LlmSettings {
            provider: LlmProvider::Hosted,
            ..LlmSettings::default()
        };
        let client = create_client_with_key(&settings, Some("sk-test".to_string())).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }
}
