//! Configuration management for docrag.
//!
//! Configuration is loaded from a YAML file (default `config/config.yaml`)
//! and then selectively overridden by environment variables:
//! - `DOCRAG_LLM_PROVIDER`: generation provider (`local` or `hosted`)
//! - `DOCRAG_EMBEDDINGS_PROVIDER`: embedding provider
//! - `DOCRAG_EMBEDDINGS_MODEL`: embedding model name
//! - `DOCRAG_INGEST_WORKERS`: ingestion worker count
//!
//! Validation runs before any document or index I/O so that a bad config
//! fails fast with [`AppError::Config`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Prompt template used when none is configured programmatically.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a technical assistant. Answer the question using only the context below.\n\
Cite the sources you use with their [source:...] tags.\n\n\
Context:\n{context}\n\nQuestion: {question}\n\nAnswer:";

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    pub ingest: IngestConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmSettings,
    pub prompt: PromptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chunking and document discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Window size in characters
    pub chunk_size: usize,

    /// Characters re-included at the start of the next window
    pub chunk_overlap: usize,

    /// Windows shorter than this are dropped
    pub min_chunk_chars: usize,

    /// Only the first N files (in sorted order) are ingested
    #[serde(default)]
    pub max_docs: Option<usize>,

    /// Number of files processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keep a final window even when it is shorter than `min_chunk_chars`
    #[serde(default)]
    pub keep_short_tail: bool,
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingsConfig {
    /// Model identifier (provider-specific)
    pub model_name: String,

    /// Texts per `embed_batch` call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// L2-normalize vectors so inner product equals cosine similarity
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Provider name: "trigram", "ollama", "openai"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Expected embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Provider endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key for hosted providers
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Which generation backend to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Locally served model (Ollama runtime)
    #[serde(alias = "ollama")]
    Local,

    /// Hosted OpenAI-compatible chat completions API
    #[serde(alias = "openai")]
    Hosted,
}

impl LlmProvider {
    /// Parse a provider name, accepting the backend aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "ollama" => Some(Self::Local),
            "hosted" | "openai" => Some(Self::Hosted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Hosted => "hosted",
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    pub provider: LlmProvider,

    /// Model served by the local runtime
    #[serde(default = "default_local_model")]
    pub local_model_name: String,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Base URL of the selected backend
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name for the hosted API
    #[serde(default = "default_hosted_model")]
    pub hosted_model: String,

    /// Environment variable holding the hosted API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Prompt template with `{context}` and `{question}` substitution points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    pub template: String,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            color: true,
            format: LogFormat::Pretty,
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_batch_size() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_local_model() -> String {
    "llama3.2".to_string()
}

fn default_max_new_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.2
}

fn default_hosted_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
            min_chunk_chars: 50,
            max_docs: None,
            workers: default_workers(),
            keep_short_tail: false,
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model_name: "trigram-v1".to_string(),
            batch_size: default_batch_size(),
            normalize: true,
            provider: default_embedding_provider(),
            dimensions: default_dimensions(),
            endpoint: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Local,
            local_model_name: default_local_model(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            endpoint: None,
            hosted_model: default_hosted_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            llm: LlmSettings::default(),
            prompt: PromptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RagConfig {
    /// Load configuration from a YAML file, apply environment overrides
    /// and validate.
    ///
    /// # Example
    /// ```no_run
    /// use docrag_core::config::RagConfig;
    /// use std::path::Path;
    ///
    /// let config = RagConfig::load(Path::new("config/config.yaml")).expect("config");
    /// println!("chunk size: {}", config.ingest.chunk_size);
    /// ```
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                path
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::from_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("{:?}: {}", path, e)))?;

        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from YAML text without env overrides or validation.
    pub fn from_yaml_str(contents: &str) -> AppResult<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `DOCRAG_*` overrides using the given variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("DOCRAG_LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider).ok_or_else(|| {
                AppError::Config(format!(
                    "DOCRAG_LLM_PROVIDER must be 'local' or 'hosted', got '{}'",
                    provider
                ))
            })?;
        }

        if let Some(provider) = lookup("DOCRAG_EMBEDDINGS_PROVIDER") {
            self.embeddings.provider = provider;
        }

        if let Some(model) = lookup("DOCRAG_EMBEDDINGS_MODEL") {
            self.embeddings.model_name = model;
        }

        if let Some(workers) = lookup("DOCRAG_INGEST_WORKERS") {
            self.ingest.workers = workers.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "DOCRAG_INGEST_WORKERS must be a positive integer, got '{}'",
                    workers
                ))
            })?;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both the file and the environment.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_format: Option<LogFormat>,
    ) -> Self {
        if let Some(level) = log_level {
            self.logging.level = Some(level);
        }

        if verbose && self.logging.level.is_none() {
            self.logging.level = Some("debug".to_string());
        }

        if no_color {
            self.logging.color = false;
        }

        if let Some(format) = log_format {
            self.logging.format = format;
        }

        self
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> AppResult<()> {
        let ingest = &self.ingest;

        if ingest.chunk_size == 0 {
            return Err(AppError::Config(
                "ingest.chunk_size must be greater than 0".to_string(),
            ));
        }

        if ingest.chunk_overlap >= ingest.chunk_size {
            return Err(AppError::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                ingest.chunk_overlap, ingest.chunk_size
            )));
        }

        if ingest.workers == 0 {
            return Err(AppError::Config(
                "ingest.workers must be at least 1".to_string(),
            ));
        }

        if ingest.max_docs == Some(0) {
            return Err(AppError::Config(
                "ingest.max_docs must be at least 1 when set".to_string(),
            ));
        }

        let embeddings = &self.embeddings;

        if embeddings.model_name.trim().is_empty() {
            return Err(AppError::Config(
                "embeddings.model_name must not be empty".to_string(),
            ));
        }

        if embeddings.batch_size == 0 {
            return Err(AppError::Config(
                "embeddings.batch_size must be at least 1".to_string(),
            ));
        }

        if embeddings.dimensions == 0 {
            return Err(AppError::Config(
                "embeddings.dimensions must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "llm.temperature must be within 0.0-2.0, got {}",
                self.llm.temperature
            )));
        }

        for placeholder in ["{context}", "{question}"] {
            if !self.prompt.template.contains(placeholder) {
                return Err(AppError::Config(format!(
                    "prompt.template must contain {}",
                    placeholder
                )));
            }
        }

        Ok(())
    }
}

/// Read a secret from the named environment variable.
///
/// Empty values are treated as unset.
pub fn resolve_secret(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL_YAML: &str = r#"
ingest:
  chunk_size: 50
  chunk_overlap: 10
  min_chunk_chars: 5
  workers: 2
embeddings:
  model_name: trigram-v1
  batch_size: 8
llm:
  provider: hosted
  hosted_model: gpt-4o-mini
prompt:
  template: "Context: {context}\nQ: {question}"
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embeddings.provider, "trigram");
        assert_eq!(config.llm.provider, LlmProvider::Local);
    }

    #[test]
    fn test_parse_full_yaml() {
        let config = RagConfig::from_yaml_str(FULL_YAML).unwrap();
        assert_eq!(config.ingest.chunk_size, 50);
        assert_eq!(config.ingest.workers, 2);
        assert_eq!(config.ingest.max_docs, None);
        assert!(!config.ingest.keep_short_tail);
        assert_eq!(config.embeddings.batch_size, 8);
        assert!(config.embeddings.normalize);
        assert_eq!(config.llm.provider, LlmProvider::Hosted);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_aliases() {
        let yaml = FULL_YAML.replace("provider: hosted", "provider: openai");
        let config = RagConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Hosted);

        assert_eq!(LlmProvider::parse("Ollama"), Some(LlmProvider::Local));
        assert_eq!(LlmProvider::parse("gguf"), None);
    }

    #[test]
    fn test_missing_required_key_is_config_error() {
        let yaml = FULL_YAML.replace("  chunk_size: 50\n", "");
        let err = RagConfig::from_yaml_str(&yaml).unwrap_err();
        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.ingest.chunk_overlap = config.ingest.chunk_size;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_min_chunk_chars_may_exceed_chunk_size() {
        let mut config = RagConfig::default();
        config.ingest.min_chunk_chars = config.ingest.chunk_size + 1;
        config.ingest.keep_short_tail = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_requires_placeholders() {
        let mut config = RagConfig::default();
        config.prompt.template = "Only {question}".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("{context}"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DOCRAG_LLM_PROVIDER", "hosted"),
            ("DOCRAG_EMBEDDINGS_MODEL", "nomic-embed-text"),
            ("DOCRAG_INGEST_WORKERS", "4"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config
            .apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm.provider, LlmProvider::Hosted);
        assert_eq!(config.embeddings.model_name, "nomic-embed-text");
        assert_eq!(config.ingest.workers, 4);
    }

    #[test]
    fn test_env_override_bad_workers() {
        let mut config = RagConfig::default();
        let result = config.apply_overrides_from(|k| {
            (k == "DOCRAG_INGEST_WORKERS").then(|| "many".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RagConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, FULL_YAML).unwrap();

        let config = RagConfig::load(&path).unwrap();
        assert_eq!(config.ingest.chunk_overlap, 10);
    }

    #[test]
    fn test_with_overrides() {
        let config = RagConfig::default().with_overrides(None, true, true, Some(LogFormat::Json));
        assert_eq!(config.logging.level, Some("debug".to_string()));
        assert!(!config.logging.color);
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
