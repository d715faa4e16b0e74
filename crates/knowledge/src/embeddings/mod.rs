//! Embedding providers and batch embedding helpers.
//!
//! A provider is selected by `embeddings.provider` and shared as an
//! [`Embedder`] handle between the index builder and the retriever.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, Embedder, EmbeddingProvider};

use crate::progress::ProgressReporter;
use docrag_core::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Scale a vector to unit L2 norm in place. Zero vectors are left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Embed `texts` in batches of `batch_size`, one `embed_batch` call each.
///
/// The cancel flag is checked before every batch; a batch in flight always
/// completes. Every returned vector is checked against the provider's
/// declared dimensions.
pub async fn embed_in_batches(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
    progress: &ProgressReporter,
    cancel: Option<&Arc<AtomicBool>>,
) -> AppResult<Vec<Vec<f32>>> {
    if batch_size == 0 {
        return Err(AppError::Config(
            "embeddings.batch_size must be at least 1".to_string(),
        ));
    }

    let total = texts.len() as u64;
    let dim = embedder.dimensions();
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size) {
        if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return Err(AppError::Cancelled(format!(
                "embedding stopped after {} of {} texts",
                vectors.len(),
                total
            )));
        }

        let embedded = embedder.embed_batch(batch).await?;
        if embedded.len() != batch.len() {
            return Err(AppError::ModelUnavailable(format!(
                "{} returned {} embeddings for a batch of {}",
                embedder.provider_name(),
                embedded.len(),
                batch.len()
            )));
        }

        if let Some(bad) = embedded.iter().find(|v| v.len() != dim) {
            return Err(AppError::ModelUnavailable(format!(
                "{} model '{}' produced {}-dimensional vectors, expected {}",
                embedder.provider_name(),
                embedder.model_name(),
                bad.len(),
                dim
            )));
        }

        vectors.extend(embedded);
        progress.embed(vectors.len() as u64, total, embedder.model_name());
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }

    #[tokio::test]
    async fn test_batch_size_does_not_change_vectors() {
        let provider = TrigramProvider::new("trigram-v1", 64);
        let texts: Vec<String> = (0..10)
            .map(|i| format!("document number {} about topic {}", i, i % 3))
            .collect();

        let one = embed_in_batches(&provider, &texts, 1, &ProgressReporter::noop(), None)
            .await
            .unwrap();
        let three = embed_in_batches(&provider, &texts, 3, &ProgressReporter::noop(), None)
            .await
            .unwrap();
        let all = embed_in_batches(&provider, &texts, 64, &ProgressReporter::noop(), None)
            .await
            .unwrap();

        assert_eq!(one, three);
        assert_eq!(one, all);
    }

    #[tokio::test]
    async fn test_cancel_before_first_batch() {
        let provider = TrigramProvider::new("trigram-v1", 16);
        let cancel = Arc::new(AtomicBool::new(true));
        let texts = vec!["a text".to_string()];

        let err = embed_in_batches(&provider, &texts, 1, &ProgressReporter::noop(), Some(&cancel))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }
}
