//! The RAG engine: application-scoped context assembly.
//!
//! [`RagEngine`] is constructed once at process start and shared by
//! request handlers. Initialization (ingest the corpus, build the index)
//! is expensive and usually runs as a background task; handlers can
//! observe readiness with [`is_ready`](RagEngine::is_ready) and degrade
//! when retrieval is not yet available, or call a `retrieve_context*`
//! method and pay the initialization cost on first use.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::KnowledgeConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{KnowledgeError, Result};
use crate::query::{self, ChatMessage, ExplainRequest};
use crate::retriever::{RetrievalMode, Retriever};
use crate::sources::SourceAdapter;
use crate::store::DocumentStore;

/// Retrieved context ready for hand-off to text generation.
///
/// `documents` and `relevance_scores` are parallel lists in retrieval
/// order (descending relevance). Zero matches is a valid, non-error
/// outcome; consumers must not assume a minimum size.
#[derive(Debug, Clone)]
pub struct RagContext {
    /// The search query that produced this context.
    pub query: String,
    /// Matched documents, most relevant first.
    pub documents: Vec<Document>,
    /// Per-document relevance scores, parallel to `documents`.
    pub relevance_scores: Vec<f32>,
}

impl RagContext {
    /// Whether retrieval matched anything.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of matched documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Format up to `max_docs` documents as a context block for a
    /// generation prompt.
    pub fn format_context(&self, max_docs: usize) -> String {
        self.documents
            .iter()
            .zip(&self.relevance_scores)
            .take(max_docs)
            .map(|(doc, score)| {
                format!("[Source: {} (relevance: {score:.2})]\n{}\n", doc.source, doc.content)
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

/// The application-scoped retrieval engine.
///
/// Owns the source adapters, the optional embedding backend, and the
/// lazily built store + retriever pair. Construct one via
/// [`RagEngine::builder()`], share it behind an `Arc`, and call
/// [`initialize`](RagEngine::initialize) from a background task at
/// startup.
pub struct RagEngine {
    config: KnowledgeConfig,
    sources: Vec<Box<dyn SourceAdapter>>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    retriever: OnceCell<Arc<Retriever>>,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("sources", &self.sources.len())
            .field("has_provider", &self.provider.is_some())
            .field("ready", &self.retriever.initialized())
            .finish()
    }
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// Whether ingestion and index construction have completed.
    ///
    /// Callers seeing `false` should degrade (answer from structured
    /// data only) rather than block, unless they are willing to pay the
    /// first-use initialization cost.
    pub fn is_ready(&self) -> bool {
        self.retriever.initialized()
    }

    /// Ingest all sources and build the retrieval index.
    ///
    /// Single-flight and idempotent: concurrent callers share one
    /// initialization, and a call on a ready engine is a no-op. A failed
    /// initialization leaves the engine uninitialized so a later call
    /// retries.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_ready().await.map(|_| ())
    }

    async fn ensure_ready(&self) -> Result<&Arc<Retriever>> {
        self.retriever
            .get_or_try_init(|| async {
                info!(sources = self.sources.len(), "loading knowledge corpus");
                let store = Arc::new(DocumentStore::ingest(&self.sources).await);
                info!(documents = store.len(), "knowledge corpus loaded");

                let retriever =
                    Arc::new(Retriever::new(store, self.provider.clone(), &self.config));
                retriever.initialize().await.inspect_err(|e| {
                    error!(error = %e, "retriever initialization failed");
                })?;
                Ok(retriever)
            })
            .await
    }

    /// Retrieve context for a structured explanation request.
    ///
    /// Builds the search query from the request's subject identifiers and
    /// dominant cost drivers, then delegates to
    /// [`retrieve_context_from_query`](Self::retrieve_context_from_query).
    pub async fn retrieve_context(
        &self,
        request: &ExplainRequest,
        top_k: usize,
    ) -> Result<RagContext> {
        let query = query::explain_query(request);
        self.retrieve_context_from_query(&query, top_k).await
    }

    /// Retrieve context for a raw query string (the chat path).
    ///
    /// Initializes the engine on first use. The assembler performs no
    /// re-ranking of its own: retrieval order is preserved verbatim.
    pub async fn retrieve_context_from_query(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<RagContext> {
        let retriever = self.ensure_ready().await?;
        let results = retriever.retrieve(query, top_k).await?;

        info!(query = %truncate(query, 100), matches = results.len(), "retrieved context");

        let mut documents = Vec::with_capacity(results.len());
        let mut relevance_scores = Vec::with_capacity(results.len());
        for result in results {
            documents.push(result.document);
            relevance_scores.push(result.score);
        }

        Ok(RagContext { query: query.to_string(), documents, relevance_scores })
    }

    /// Retrieve context for a conversational question, enriching the
    /// query with domain key-terms, attached structured context, and the
    /// most recent prior user utterance.
    pub async fn retrieve_context_for_chat(
        &self,
        question: &str,
        context: Option<&ExplainRequest>,
        history: &[ChatMessage],
        top_k: usize,
    ) -> Result<RagContext> {
        let query = query::chat_query(question, context, history);
        self.retrieve_context_from_query(&query, top_k).await
    }

    /// The active retrieval mode, or `None` before initialization.
    pub async fn mode(&self) -> Option<RetrievalMode> {
        match self.retriever.get() {
            Some(retriever) => retriever.mode().await,
            None => None,
        }
    }

    /// Number of documents in the corpus, or `None` before
    /// initialization.
    pub fn document_count(&self) -> Option<usize> {
        self.retriever.get().map(|r| r.store().len())
    }

    /// Keyword-only search against the corpus, bypassing the retriever.
    /// Initializes the engine on first use.
    pub async fn keyword_search(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let retriever = self.ensure_ready().await?;
        Ok(retriever.store().search_documents(query, top_k).into_iter().cloned().collect())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// At least one source adapter is required; the embedding provider is
/// optional (the engine runs sparse-only without one).
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<KnowledgeConfig>,
    sources: Vec<Box<dyn SourceAdapter>>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: KnowledgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append a source adapter. Adapters are processed in registration
    /// order.
    pub fn source(mut self, adapter: Box<dyn SourceAdapter>) -> Self {
        self.sources.push(adapter);
        self
    }

    /// Set the embedding backend for dense retrieval.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the [`RagEngine`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::Config`] if the config is missing or no
    /// source adapter was registered.
    pub fn build(self) -> Result<RagEngine> {
        let config = self
            .config
            .ok_or_else(|| KnowledgeError::Config("config is required".to_string()))?;
        if self.sources.is_empty() {
            return Err(KnowledgeError::Config(
                "at least one source adapter is required".to_string(),
            ));
        }
        Ok(RagEngine {
            config,
            sources: self.sources,
            provider: self.provider,
            retriever: OnceCell::new(),
        })
    }
}
