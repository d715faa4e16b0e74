//! Retrieval ranking: alignment between index rows and the docstore,
//! result bounds and ordering.

use super::{test_config, write_file};
use crate::embeddings::create_provider;
use crate::index::BuildControl;
use crate::ingest;
use crate::retriever::{load_index, LoadedIndex};
use docrag_core::RagConfig;
use tempfile::TempDir;

const TEXTS: [(&str, &str); 3] = [
    ("cooking.txt", "Simmer the tomato sauce with garlic and basil for twenty minutes."),
    ("network.txt", "Routers exchange packets using dynamic routing protocols like OSPF."),
    ("garden.txt", "Prune rose bushes in early spring before new growth appears."),
];

async fn build(config: &RagConfig, texts: &[(&str, &str)]) -> (TempDir, LoadedIndex) {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("docs");
    for (name, text) in texts {
        write_file(&input, name, text);
    }

    let embedder = create_provider(&config.embeddings).unwrap();
    let index_dir = temp.path().join("index");
    ingest(
        &input,
        temp.path(),
        &index_dir,
        config,
        embedder.as_ref(),
        &BuildControl::default(),
    )
    .await
    .unwrap();

    let loaded = load_index(config, &index_dir).unwrap();
    (temp, loaded)
}

#[tokio::test]
async fn test_verbatim_query_hits_its_own_chunk() {
    let config = test_config(200, 20, 5);
    let (_temp, loaded) = build(&config, &TEXTS).await;
    assert_eq!(loaded.docstore.len(), 3);

    for (name, text) in TEXTS {
        let results = loaded.retrieve(text, 3).await.unwrap();
        assert_eq!(results[0].source(), name);
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }
}

#[tokio::test]
async fn test_top_k_bound_and_ordering() {
    let config = test_config(200, 20, 5);
    let (_temp, loaded) = build(&config, &TEXTS).await;

    let results = loaded.retrieve("garlic basil tomato", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source(), "cooking.txt");

    // More than the corpus holds.
    let results = loaded.retrieve("spring roses", 10).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(
        loaded.retrieve("spring roses", usize::MAX).await.unwrap().len(),
        3
    );
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    assert!(loaded.retrieve("anything", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limit_example() {
    let config = test_config(50, 10, 5);
    let text = "A rate limit of 100 requests per minute applies.";
    let (temp, loaded) = build(&config, &[("limits.txt", text)]).await;

    let corpus = crate::read_corpus(&temp.path().join(crate::CORPUS_FILE)).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus[0].text, text);

    let results = loaded.retrieve("What is the rate limit?", 4).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk_id(), corpus[0].chunk_id);
    assert!(results[0].score > 0.0);
}

#[tokio::test]
async fn test_unnormalized_scores_differ() {
    let mut config = test_config(200, 20, 5);
    config.embeddings.normalize = false;
    let (_temp, loaded) = build(&config, &TEXTS).await;

    let results = loaded.retrieve(TEXTS[0].1, 1).await.unwrap();
    assert_eq!(results[0].source(), "cooking.txt");
    // Raw inner products of trigram vectors exceed 1 for a verbatim match.
    assert!(results[0].score > 1.0);
}
