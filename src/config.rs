//! Configuration for ingestion and retrieval.

use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeError, Result};

/// Configuration parameters for the knowledge-retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeConfig {
    /// Maximum chunk size in characters for long-form sources.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of top results returned by retrieval.
    pub top_k: usize,
    /// Number of documents embedded per backend request when building
    /// the dense index.
    pub embed_batch_size: usize,
    /// Upper bound on chunks ingested from a single long-form source.
    pub max_chunks_per_source: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 150,
            top_k: 5,
            embed_batch_size: 5,
            max_chunks_per_source: 10,
        }
    }
}

impl KnowledgeConfig {
    /// Create a new builder for constructing a [`KnowledgeConfig`].
    pub fn builder() -> KnowledgeConfigBuilder {
        KnowledgeConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`KnowledgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeConfigBuilder {
    config: KnowledgeConfig,
}

impl KnowledgeConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of top results returned by retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedding batch size used during index construction.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the chunk cap for a single long-form source.
    pub fn max_chunks_per_source(mut self, max: usize) -> Self {
        self.config.max_chunks_per_source = max;
        self
    }

    /// Build the [`KnowledgeConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embed_batch_size == 0`
    /// - `max_chunks_per_source == 0`
    pub fn build(self) -> Result<KnowledgeConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(KnowledgeError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(KnowledgeError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.embed_batch_size == 0 {
            return Err(KnowledgeError::Config(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.config.max_chunks_per_source == 0 {
            return Err(KnowledgeError::Config(
                "max_chunks_per_source must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
