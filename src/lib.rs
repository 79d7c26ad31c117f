//! Knowledge-retrieval core for grounded TCO explanations.
//!
//! This crate turns heterogeneous source documents (tabular records,
//! policy notes, free-text reports) into a retrievable corpus and
//! answers free-text queries with a ranked, scored set of matching
//! documents. It is the grounding layer of an explanation pipeline:
//! prompt construction, text generation, translation, and HTTP delivery
//! all live downstream and consume [`RagContext`] values.
//!
//! Retrieval is dual-mode. When an [`EmbeddingProvider`] is configured
//! and reachable, a dense cosine-similarity index is built over the
//! corpus; otherwise, or on any backend failure, the retriever degrades
//! transparently to sparse token-overlap scoring. Callers never see the
//! difference except through score scale.
//!
//! # Example
//!
//! ```rust,ignore
//! use tco_knowledge::{
//!     KnowledgeConfig, MaterialPropertiesSource, PolicyFactsSource, RagEngine,
//! };
//!
//! let engine = RagEngine::builder()
//!     .config(KnowledgeConfig::default())
//!     .source(Box::new(PolicyFactsSource::builtin()))
//!     .source(Box::new(MaterialPropertiesSource::builtin()))
//!     .build()?;
//!
//! // Usually spawned in the background at startup.
//! engine.initialize().await?;
//!
//! let context = engine.retrieve_context_from_query("SiC subsidies", 5).await?;
//! for (doc, score) in context.documents.iter().zip(&context.relevance_scores) {
//!     println!("[{score:.2}] {}", doc.source);
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod query;
pub mod retriever;
pub mod sources;
pub mod store;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::chunk_text;
pub use config::{KnowledgeConfig, KnowledgeConfigBuilder};
pub use document::{Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{RagContext, RagEngine, RagEngineBuilder};
pub use error::{KnowledgeError, Result};
pub use query::{ChatMessage, ChatRole, CostBreakdown, ExplainRequest};
pub use retriever::{RetrievalMode, Retriever};
pub use sources::{
    EnergyPriceRecord, EnergyPriceSource, FabCapacityRecord, FabCapacitySource,
    MaterialPropertiesSource, MaterialPropertyRecord, PolicyFactsSource, ReportTextSource,
    SourceAdapter,
};
pub use store::DocumentStore;

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddings;
