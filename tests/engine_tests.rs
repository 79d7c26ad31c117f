//! Engine lifecycle: lazy initialization, context assembly, and the
//! parallel-list contract of `RagContext`.

use tco_knowledge::config::KnowledgeConfig;
use tco_knowledge::engine::RagEngine;
use tco_knowledge::error::KnowledgeError;
use tco_knowledge::query::{ChatMessage, ChatRole, CostBreakdown, ExplainRequest};
use tco_knowledge::retriever::RetrievalMode;
use tco_knowledge::sources::{MaterialPropertiesSource, PolicyFactsSource};

fn engine() -> RagEngine {
    RagEngine::builder()
        .config(KnowledgeConfig::default())
        .source(Box::new(PolicyFactsSource::builtin()))
        .source(Box::new(MaterialPropertiesSource::builtin()))
        .build()
        .unwrap()
}

fn explain_request() -> ExplainRequest {
    ExplainRequest {
        material_name: "SiC".to_string(),
        region_name: "Germany".to_string(),
        breakdown: CostBreakdown {
            chip_cost: 300_000.0,
            energy_cost: 450_000.0,
            carbon_tax: 150_000.0,
            maintenance: 50_000.0,
            supply_chain_risk: 50_000.0,
            subsidy_amount: 200_000.0,
            total_before_subsidy: 1_000_000.0,
        },
    }
}

#[test]
fn builder_requires_config_and_sources() {
    let err = RagEngine::builder().build().unwrap_err();
    assert!(matches!(err, KnowledgeError::Config(_)));

    let err = RagEngine::builder().config(KnowledgeConfig::default()).build().unwrap_err();
    assert!(matches!(err, KnowledgeError::Config(_)));
}

#[tokio::test]
async fn first_retrieval_triggers_initialization() {
    let engine = engine();
    assert!(!engine.is_ready());
    assert_eq!(engine.document_count(), None);

    let context = engine.retrieve_context_from_query("SiC subsidies", 3).await.unwrap();

    assert!(engine.is_ready());
    assert!(engine.document_count().unwrap() > 0);
    assert!(!context.is_empty());
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let engine = engine();
    engine.initialize().await.unwrap();
    let count = engine.document_count().unwrap();

    engine.initialize().await.unwrap();
    assert_eq!(engine.document_count().unwrap(), count);
    // No embedding backend configured, so the engine runs sparse.
    assert_eq!(engine.mode().await, Some(RetrievalMode::Sparse));
}

#[tokio::test]
async fn structured_request_query_names_dominant_drivers() {
    let engine = engine();
    let context = engine.retrieve_context(&explain_request(), 3).await.unwrap();

    // Energy is 45% and carbon tax 15% of the pre-subsidy total, and a
    // subsidy is present, so all three driver fragments appear.
    assert!(context.query.contains("SiC semiconductor"));
    assert!(context.query.contains("Germany energy costs"));
    assert!(context.query.contains("energy efficiency power consumption"));
    assert!(context.query.contains("carbon tax CO2 emissions"));
    assert!(context.query.contains("government funding incentives"));
}

#[tokio::test]
async fn context_lists_are_parallel_and_ordered() {
    let engine = engine();
    let context = engine.retrieve_context(&explain_request(), 5).await.unwrap();

    assert_eq!(context.documents.len(), context.relevance_scores.len());
    assert!(context.len() <= 5);
    for window in context.relevance_scores.windows(2) {
        assert!(window[0] >= window[1]);
    }
}

#[tokio::test]
async fn zero_matches_is_a_valid_outcome() {
    let engine = engine();
    let context = engine.retrieve_context_from_query("unrelatedtoken", 5).await.unwrap();
    assert!(context.is_empty());
    assert_eq!(context.format_context(3), "");
}

#[tokio::test]
async fn chat_retrieval_enriches_the_query() {
    let engine = engine();
    let history = vec![
        ChatMessage { role: ChatRole::User, content: "what about wide-bandgap?".to_string() },
        ChatMessage { role: ChatRole::Assistant, content: "they cost more".to_string() },
    ];
    let context = engine
        .retrieve_context_for_chat("how much funding is available?", None, &history, 3)
        .await
        .unwrap();

    assert!(context.query.contains("EU Chips Act"));
    assert!(context.query.contains("what about wide-bandgap?"));
    assert!(!context.query.contains("they cost more"));
}

#[tokio::test]
async fn keyword_search_bypasses_the_retriever() {
    let engine = engine();
    let docs = engine.keyword_search("SiC", 3).await.unwrap();
    assert!(!docs.is_empty());
    assert!(docs.iter().all(|d| d.content.to_lowercase().contains("sic")));
}

#[tokio::test]
async fn format_context_labels_sources() {
    let engine = engine();
    let context = engine.retrieve_context_from_query("Chips Act subsidies", 2).await.unwrap();

    let formatted = context.format_context(2);
    assert!(formatted.contains("[Source:"));
    assert!(formatted.contains("relevance:"));
}
