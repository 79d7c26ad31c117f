//! Embedding backend trait for dense retrieval.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns text into vector embeddings.
///
/// Vectors for the same text from the same backend/model must be stable
/// and directly comparable via cosine similarity. The retriever treats a
/// backend as unavailable whenever a call returns an error or a malformed
/// shape, and degrades to sparse retrieval.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends with native
/// batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this backend.
    fn dimensions(&self) -> usize;
}
