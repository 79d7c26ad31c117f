//! Error types for the `tco-knowledge` crate.

use thiserror::Error;

/// Errors that can occur in knowledge-retrieval operations.
///
/// Only [`Config`](KnowledgeError::Config) is intended to reach callers as
/// a hard failure. Embedding and ingestion errors are recovered internally
/// by degrading to sparse retrieval or to the remaining sources.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A configuration validation error, including an empty corpus at
    /// retriever initialization.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error from the embedding backend.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error while loading a single knowledge source.
    #[error("Ingestion error ({source_name}): {message}")]
    Ingestion {
        /// The source adapter that produced the error.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in retrieval orchestration with no degraded path left.
    #[error("Retrieval error: {0}")]
    Retrieval(String),
}

/// A convenience result type for knowledge-retrieval operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;
