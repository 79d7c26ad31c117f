//! Dual-mode retrieval over the knowledge corpus.
//!
//! The retriever ranks every document against a query in one of two
//! mutually exclusive modes, chosen once at initialization:
//!
//! - dense: cosine similarity over embeddings from an external backend
//! - sparse: normalized token-overlap, no backend required
//!
//! Dense-index construction is all-or-nothing. Any failure while
//! embedding the corpus abandons dense mode entirely and installs the
//! sparse index instead, since a partially built index would break the
//! corpus alignment that similarity ranking depends on.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::KnowledgeConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{KnowledgeError, Result};
use crate::store::DocumentStore;

/// The active retrieval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Cosine similarity over an embedding index.
    Dense,
    /// Token-overlap scoring, no embeddings.
    Sparse,
}

/// The built index. `Dense` vectors are index-aligned with the corpus:
/// `vectors[i]` embeds `documents()[i]`.
enum Index {
    Dense { vectors: Vec<Vec<f32>> },
    Sparse,
}

/// Ranks the corpus against free-text queries.
///
/// Initialization is idempotent and single-flight: concurrent callers
/// racing to initialize serialize on the index lock, and a second call on
/// a ready retriever is a no-op. After initialization the corpus and
/// index are read-only, so concurrent `retrieve` calls are independent.
pub struct Retriever {
    store: Arc<DocumentStore>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    batch_size: usize,
    index: RwLock<Option<Index>>,
}

impl Retriever {
    /// Create an uninitialized retriever over `store`.
    ///
    /// With no `provider`, initialization goes straight to sparse mode.
    pub fn new(
        store: Arc<DocumentStore>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        config: &KnowledgeConfig,
    ) -> Self {
        Self { store, provider, batch_size: config.embed_batch_size, index: RwLock::new(None) }
    }

    /// The corpus this retriever ranks.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// The active mode, or `None` before initialization.
    pub async fn mode(&self) -> Option<RetrievalMode> {
        self.index.read().await.as_ref().map(|index| match index {
            Index::Dense { .. } => RetrievalMode::Dense,
            Index::Sparse => RetrievalMode::Sparse,
        })
    }

    /// Build the index.
    ///
    /// Tries to construct a dense embedding index; any backend failure
    /// falls back to sparse mode for the lifetime of this retriever.
    /// Idempotent: a second call on a ready retriever returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::Config`] if the corpus is empty. This is
    /// the only hard failure; backend problems degrade silently.
    pub async fn initialize(&self) -> Result<()> {
        if self.index.read().await.is_some() {
            return Ok(());
        }

        let mut index = self.index.write().await;
        // A racing caller may have initialized while we waited for the
        // write lock.
        if index.is_some() {
            return Ok(());
        }

        if self.store.is_empty() {
            return Err(KnowledgeError::Config(
                "cannot initialize retriever over an empty corpus".to_string(),
            ));
        }

        *index = Some(self.build_index().await);
        Ok(())
    }

    async fn build_index(&self) -> Index {
        let Some(provider) = &self.provider else {
            info!(documents = self.store.len(), "no embedding backend, using sparse retrieval");
            return Index::Sparse;
        };

        match self.embed_corpus(provider.as_ref()).await {
            Ok(vectors) => {
                info!(
                    documents = self.store.len(),
                    dimensions = vectors.first().map(Vec::len).unwrap_or(0),
                    "dense index ready"
                );
                Index::Dense { vectors }
            }
            Err(e) => {
                warn!(error = %e, "dense index construction failed, falling back to sparse retrieval");
                Index::Sparse
            }
        }
    }

    /// Embed the whole corpus in bounded batches.
    ///
    /// A count or dimension mismatch in any batch response counts as a
    /// backend failure; the caller discards all partial work.
    async fn embed_corpus(&self, provider: &dyn EmbeddingProvider) -> Result<Vec<Vec<f32>>> {
        let documents = self.store.documents();
        let mut vectors = Vec::with_capacity(documents.len());

        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|d| d.content.as_str()).collect();
            let embedded = provider.embed_batch(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(KnowledgeError::Retrieval(format!(
                    "embedding backend returned {} vectors for a batch of {}",
                    embedded.len(),
                    texts.len()
                )));
            }
            vectors.extend(embedded);
        }

        if let Some(first) = vectors.first() {
            let dimensions = first.len();
            if dimensions == 0 || vectors.iter().any(|v| v.len() != dimensions) {
                return Err(KnowledgeError::Retrieval(
                    "embedding backend returned inconsistent vector dimensions".to_string(),
                ));
            }
        }

        Ok(vectors)
    }

    /// Return the `top_k` most relevant documents for `query`.
    ///
    /// Lazily initializes on first use; that blocks only this caller.
    /// In dense mode a per-call backend failure (timeout, transient
    /// error, shape mismatch) falls back to sparse scoring for that call
    /// only, without disabling dense mode for subsequent calls.
    ///
    /// Results are ordered by descending score with corpus order breaking
    /// ties. Fewer than `top_k` results is normal; sparse mode never pads
    /// with zero-overlap documents.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.initialize().await?;

        let index = self.index.read().await;
        match index.as_ref() {
            Some(Index::Dense { vectors }) => Ok(self.dense_retrieve(query, vectors, top_k).await),
            Some(Index::Sparse) | None => Ok(self.sparse_retrieve(query, top_k)),
        }
    }

    async fn dense_retrieve(
        &self,
        query: &str,
        vectors: &[Vec<f32>],
        top_k: usize,
    ) -> Vec<SearchResult> {
        let Some(provider) = &self.provider else {
            return self.sparse_retrieve(query, top_k);
        };

        let query_vector = match provider.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, sparse scoring for this call");
                return self.sparse_retrieve(query, top_k);
            }
        };

        if vectors.first().is_some_and(|v| v.len() != query_vector.len()) {
            warn!(
                query_dims = query_vector.len(),
                "query embedding dimensions do not match index, sparse scoring for this call"
            );
            return self.sparse_retrieve(query, top_k);
        }

        let documents = self.store.documents();
        let mut scored: Vec<SearchResult> = vectors
            .iter()
            .zip(documents)
            .map(|(vector, document)| SearchResult {
                document: document.clone(),
                score: cosine_similarity(vector, &query_vector),
            })
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    /// Token-overlap scoring: |query ∩ content| / |query|, in [0, 1].
    ///
    /// Documents with zero overlap are dropped rather than padded in.
    fn sparse_retrieve(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let query_tokens: HashSet<String> =
            query.to_lowercase().split_whitespace().map(str::to_string).collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<SearchResult> = self
            .store
            .documents()
            .iter()
            .filter_map(|document| {
                let content = document.content.to_lowercase();
                let content_tokens: HashSet<&str> = content.split_whitespace().collect();
                let overlap =
                    query_tokens.iter().filter(|t| content_tokens.contains(t.as_str())).count();
                (overlap > 0).then(|| SearchResult {
                    document: document.clone(),
                    score: overlap as f32 / query_tokens.len() as f32,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// Cosine similarity between two vectors. Returns 0.0 if either vector
/// has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let v = [0.6f32, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
