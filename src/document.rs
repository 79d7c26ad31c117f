//! Data types for knowledge documents and retrieval results.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An atomic retrievable unit of the knowledge corpus.
///
/// A document's `content` is non-empty and immutable once created; the
/// `id` is derived from `source` and a content hash, so the same text from
/// the same source always maps to the same id within a process lifetime.
///
/// Embedding vectors are not stored on the document. The retriever keeps
/// them in a corpus-aligned side table so that the active retrieval mode
/// is always a single tagged state rather than a per-document nullable
/// field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier, derived from `source` plus a content hash.
    pub id: String,
    /// Human-readable provenance label, e.g. "EU Chips Act 2023".
    pub source: String,
    /// The retrievable text body.
    pub content: String,
    /// Open mapping of string keys to scalar values (category, year,
    /// data-quality tag, originating file). Consumed by downstream
    /// formatting, never interpreted by the retriever.
    pub metadata: HashMap<String, Value>,
    /// Optional provenance link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Static trust score in [0, 1] assigned at ingestion time. Distinct
    /// from the per-query relevance score on [`SearchResult`].
    pub confidence: f32,
}

impl Document {
    /// Create a document with an id derived from `source` and `content`.
    pub fn new(
        source: impl Into<String>,
        content: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let source = source.into();
        let content = content.into();
        let id = derive_id(&source, &content);
        Self { id, source, content, metadata: HashMap::new(), url: None, confidence }
    }

    /// Attach a provenance URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Insert a single metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Hash `source` and `content` into a compact hex id.
///
/// Stable within a single process lifetime, which is all retrieval
/// correctness requires; ids are not persisted across restarts.
fn derive_id(source: &str, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// A retrieved [`Document`] paired with a per-query relevance score.
///
/// The score scale depends on the active retrieval mode: raw cosine
/// similarity in dense mode (relative ordering only, no absolute scale)
/// and a normalized token-overlap ratio in [0, 1] in sparse mode. Callers
/// must not compare scores across modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved document.
    pub document: Document,
    /// The relevance score (higher is more relevant).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_source_and_content_yield_same_id() {
        let a = Document::new("OECD Energy Prices", "Germany pays 0.18 EUR/kWh", 0.9);
        let b = Document::new("OECD Energy Prices", "Germany pays 0.18 EUR/kWh", 0.9);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_content_yields_different_id() {
        let a = Document::new("OECD Energy Prices", "Germany pays 0.18 EUR/kWh", 0.9);
        let b = Document::new("OECD Energy Prices", "France pays 0.15 EUR/kWh", 0.9);
        assert_ne!(a.id, b.id);
    }
}
