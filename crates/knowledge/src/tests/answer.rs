//! Answer assembly against a stub generation backend.

use super::{test_config, write_file};
use crate::corpus::CorpusStore;
use crate::embeddings::create_provider;
use crate::index::BuildControl;
use crate::rag::RagSession;
use crate::retriever::load_index;
use crate::{ingest, CORPUS_FILE};
use async_trait::async_trait;
use docrag_core::AppResult;
use docrag_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records prompts and replies with a fixed answer.
struct StubLlm {
    reply: String,
    prompts: Mutex<Vec<LlmRequest>>,
}

impl StubLlm {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.clone());
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

#[tokio::test]
async fn test_answer_with_citations() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("docs");
    let text = "A rate limit of 100 requests per minute applies.";
    write_file(&input, "limits.txt", text);

    let config = test_config(50, 10, 5);
    let embedder = create_provider(&config.embeddings).unwrap();
    let index_dir = temp.path().join("index");
    ingest(
        &input,
        temp.path(),
        &index_dir,
        &config,
        embedder.as_ref(),
        &BuildControl::default(),
    )
    .await
    .unwrap();

    let loaded = load_index(&config, &index_dir).unwrap();
    let corpus = CorpusStore::load(&temp.path().join(CORPUS_FILE)).unwrap();
    let chunk_id = loaded.docstore[0].chunk_id.clone();

    let llm = StubLlm::new(&format!(
        "100 requests per minute [source:limits.txt#{}]",
        chunk_id
    ));
    let session = RagSession::new(loaded, corpus)
        .unwrap()
        .with_llm(llm.clone());

    let result = session.answer("What is the rate limit?", 4).await.unwrap();

    assert_eq!(result.question, "What is the rate limit?");
    assert_eq!(result.retrieved.len(), 1);
    assert_eq!(result.cited().len(), 1);
    assert!(result.latency.total_s >= result.latency.retrieve_s);

    let requests = llm.prompts.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains(&format!("[source:limits.txt#{}]\n{}", chunk_id, text)));
    assert!(prompt.contains("Question: What is the rate limit?"));
    assert_eq!(requests[0].model, config.llm.local_model_name);
}

#[tokio::test]
async fn test_bad_template_rejected_before_retrieval() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("docs");
    write_file(&input, "a.txt", "Some text that is long enough to be a chunk.");

    let mut config = test_config(100, 10, 5);
    let embedder = create_provider(&config.embeddings).unwrap();
    let index_dir = temp.path().join("index");
    ingest(
        &input,
        temp.path(),
        &index_dir,
        &config,
        embedder.as_ref(),
        &BuildControl::default(),
    )
    .await
    .unwrap();

    config.prompt.template = "Context: {context}\nNo question here.".to_string();
    let loaded = load_index(&config, &index_dir).unwrap();

    let err = RagSession::new(loaded, CorpusStore::default()).err().unwrap();
    assert_eq!(err.kind(), "prompt");
}
