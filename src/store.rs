//! The document store: corpus ownership, ingestion orchestration, and
//! last-resort keyword search.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::document::Document;
use crate::sources::SourceAdapter;

/// Owns the knowledge corpus.
///
/// Built once per process from an ordered list of source adapters. The
/// resulting document order is fixed for the lifetime of the store and is
/// used as the tie-break by every ranking path, so a dense index and the
/// corpus stay index-aligned.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    /// Build a store by running every adapter in order.
    ///
    /// A failing adapter is logged and skipped; it never aborts ingestion
    /// of the remaining sources. Documents with empty content are dropped.
    /// If every adapter fails or yields nothing, a minimal placeholder
    /// corpus is installed so retrieval never operates on an empty corpus.
    pub async fn ingest(adapters: &[Box<dyn SourceAdapter>]) -> Self {
        let mut documents = Vec::new();

        for adapter in adapters {
            match adapter.load().await {
                Ok(docs) => {
                    let mut kept = 0;
                    for doc in docs {
                        if doc.content.trim().is_empty() {
                            warn!(source = adapter.name(), id = %doc.id, "skipping empty document");
                            continue;
                        }
                        documents.push(doc);
                        kept += 1;
                    }
                    info!(source = adapter.name(), documents = kept, "ingested source");
                }
                Err(e) => {
                    warn!(source = adapter.name(), error = %e, "source failed, continuing");
                }
            }
        }

        if documents.is_empty() {
            warn!("all sources failed or were empty, installing placeholder corpus");
            documents = placeholder_corpus();
        }

        Self { documents }
    }

    /// Build a store from an existing document list.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// The full corpus in ingestion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Zero-dependency keyword search, independent of the retriever.
    ///
    /// Tokenizes the query and each document's content by whitespace
    /// (lowercased) and scores each document by how many distinct query
    /// tokens appear in its content. Returns up to `top_k` documents with
    /// a score above zero, ties broken by corpus order.
    pub fn search_documents(&self, query: &str, top_k: usize) -> Vec<&Document> {
        let query_tokens: HashSet<String> =
            query.to_lowercase().split_whitespace().map(str::to_string).collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let content = doc.content.to_lowercase();
                let content_tokens: HashSet<&str> = content.split_whitespace().collect();
                let hits =
                    query_tokens.iter().filter(|t| content_tokens.contains(t.as_str())).count();
                (hits > 0).then_some((hits, doc))
            })
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);
        scored.into_iter().map(|(_, doc)| doc).collect()
    }
}

/// A small fixed corpus used when every source fails, so downstream
/// retrieval still has something to rank.
fn placeholder_corpus() -> Vec<Document> {
    vec![
        Document::new(
            "Built-in Fallback",
            "Semiconductor materials such as Si, SiC, and GaN differ in cost, energy \
             efficiency, and thermal limits. Wide-bandgap materials suit high-power \
             applications.",
            0.5,
        )
        .with_meta("type", serde_json::json!("fallback")),
        Document::new(
            "Built-in Fallback",
            "Industrial electricity prices and carbon taxes vary by region and are major \
             drivers of semiconductor manufacturing cost.",
            0.5,
        )
        .with_meta("type", serde_json::json!("fallback")),
        Document::new(
            "Built-in Fallback",
            "Government subsidy programs such as the EU Chips Act can reduce fabrication \
             total cost of ownership substantially.",
            0.5,
        )
        .with_meta("type", serde_json::json!("fallback")),
    ]
}
