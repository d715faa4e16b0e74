//! Answer assembly: retrieve, build the prompt, generate.

use crate::corpus::CorpusStore;
use crate::rag::types::{AnswerResult, Latency};
use crate::retriever::{load_index, LoadedIndex};
use crate::types::RetrievalResult;
use docrag_core::{AppResult, RagConfig};
use docrag_llm::{create_client, LlmClient, LlmRequest};
use docrag_prompt::{PromptTemplate, ANSWER_PLACEHOLDERS};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Render retrieved chunks as cited context blocks.
///
/// Each block is `[source:<source>#<chunk_id>]` followed by the chunk text;
/// ids missing from the corpus contribute empty text.
pub fn format_context(results: &[RetrievalResult], corpus: &CorpusStore) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{}\n{}",
                AnswerResult::citation(r),
                corpus.text(r.chunk_id()).unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// A loaded index, its chunk texts and a generation backend.
///
/// The backend is created on the first [`RagSession::answer`] call, so
/// retrieval-only use never needs generation credentials.
pub struct RagSession {
    loaded: LoadedIndex,
    corpus: CorpusStore,
    template: PromptTemplate,
    llm: OnceCell<Arc<dyn LlmClient>>,
}

impl RagSession {
    /// Build a session; the prompt template is checked up front.
    pub fn new(loaded: LoadedIndex, corpus: CorpusStore) -> AppResult<Self> {
        let template = PromptTemplate::parse(&loaded.config.prompt.template)?;
        template.require(&ANSWER_PLACEHOLDERS)?;

        Ok(Self {
            loaded,
            corpus,
            template,
            llm: OnceCell::new(),
        })
    }

    /// Load index and corpus from disk.
    pub fn open(config: &RagConfig, index_dir: &Path, chunks_path: &Path) -> AppResult<Self> {
        let loaded = load_index(config, index_dir)?;
        let corpus = CorpusStore::load(chunks_path)?;
        Self::new(loaded, corpus)
    }

    /// Use the given backend instead of the configured one.
    pub fn with_llm(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm = OnceCell::new_with(Some(client));
        self
    }

    pub fn index(&self) -> &LoadedIndex {
        &self.loaded
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    async fn llm(&self) -> AppResult<&Arc<dyn LlmClient>> {
        self.llm
            .get_or_try_init(|| async { create_client(&self.loaded.config.llm) })
            .await
    }

    /// Render the prompt for a question and its retrieved context.
    pub fn build_prompt(&self, question: &str, results: &[RetrievalResult]) -> AppResult<String> {
        let context = format_context(results, &self.corpus);
        let values = HashMap::from([("context", context.as_str()), ("question", question)]);
        self.template.render(&values)
    }

    /// Answer a question from the `top_k` retrieved chunks.
    #[tracing::instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, top_k: usize) -> AppResult<AnswerResult> {
        let started = Instant::now();
        let retrieved = self.loaded.retrieve(question, top_k).await?;
        let retrieve_time = started.elapsed();

        let prompt = self.build_prompt(question, &retrieved)?;
        let request = LlmRequest::from_settings(prompt, &self.loaded.config.llm);

        let generate_started = Instant::now();
        let client = self.llm().await?;
        let response = client.complete(&request).await?;
        let generate_time = generate_started.elapsed();

        tracing::info!(
            retrieved = retrieved.len(),
            provider = client.provider_name(),
            "Answered question in {:.3}s",
            (retrieve_time + generate_time).as_secs_f64()
        );

        Ok(AnswerResult {
            question: question.to_string(),
            answer: response.content,
            retrieved,
            latency: Latency::new(retrieve_time, generate_time),
        })
    }
}
