//! Search-query construction for structured and conversational requests.
//!
//! Both builders bias retrieval toward the things that most explain the
//! current result: dominant cost drivers for structured requests, and
//! keyword-triggered domain synonyms for chat questions.

use serde::{Deserialize, Serialize};

/// Named cost-component magnitudes from the external calculation engine.
///
/// Only compared against threshold fractions of the total to find the
/// dominant drivers; the numeric semantics are never validated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub chip_cost: f64,
    pub energy_cost: f64,
    pub carbon_tax: f64,
    pub maintenance: f64,
    pub supply_chain_risk: f64,
    pub subsidy_amount: f64,
    pub total_before_subsidy: f64,
}

/// A structured result-explanation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplainRequest {
    /// Material under analysis, e.g. "SiC".
    pub material_name: String,
    /// Region under analysis, e.g. "Germany".
    pub region_name: String,
    /// The numeric result being explained.
    pub breakdown: CostBreakdown,
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Fraction of the pre-subsidy total above which energy cost counts as a
/// dominant driver.
const ENERGY_DRIVER_THRESHOLD: f64 = 0.3;
/// Fraction of the pre-subsidy total above which carbon tax counts as a
/// dominant driver.
const CARBON_DRIVER_THRESHOLD: f64 = 0.1;

/// Build the retrieval query for a structured explanation request.
///
/// Concatenates subject identifiers with fragments for each dominant
/// cost driver, so retrieval favors documents matching what actually
/// drives the current result rather than the subject generically.
pub fn explain_query(request: &ExplainRequest) -> String {
    let mut parts = vec![
        format!("{} semiconductor", request.material_name),
        format!("{} energy costs", request.region_name),
        "Total Cost of Ownership".to_string(),
    ];

    let breakdown = &request.breakdown;
    let total = breakdown.total_before_subsidy;

    if total > 0.0 {
        if breakdown.energy_cost / total > ENERGY_DRIVER_THRESHOLD {
            parts.push("energy efficiency power consumption".to_string());
        }
        if breakdown.carbon_tax / total > CARBON_DRIVER_THRESHOLD {
            parts.push("carbon tax CO2 emissions".to_string());
        }
    }
    if breakdown.subsidy_amount > 0.0 {
        parts.push("semiconductor subsidies government funding incentives".to_string());
    }

    parts.join(" ")
}

/// Build the retrieval query for a conversational question.
///
/// Concatenates the raw question, keyword-triggered domain key-terms,
/// identifiers from any attached structured context, and the single most
/// recent prior user utterance (only one, to avoid topic drift).
pub fn chat_query(
    question: &str,
    context: Option<&ExplainRequest>,
    history: &[ChatMessage],
) -> String {
    let mut parts = vec![question.to_string()];

    parts.extend(key_terms(question).iter().map(|t| t.to_string()));

    if let Some(request) = context {
        parts.push(request.material_name.clone());
        parts.push(request.region_name.clone());
    }

    if let Some(previous) = history.iter().rev().find(|m| m.role == ChatRole::User) {
        parts.push(previous.content.clone());
    }

    parts.join(" ")
}

/// Domain key-terms triggered by keyword presence in the question.
fn key_terms(question: &str) -> Vec<&'static str> {
    let q = question.to_lowercase();
    let mut terms = Vec::new();

    if q.contains("subsidy") || q.contains("subsidies") || q.contains("funding") {
        terms.extend(["EU Chips Act", "subsidy", "funding", "grant"]);
    }
    if q.contains("energy") && q.contains("cost") {
        terms.extend(["energy price", "electricity cost", "kWh"]);
    }
    if q.contains("carbon") || q.contains("tax") {
        terms.extend(["carbon tax", "CO2", "emissions"]);
    }
    if q.contains("compare") || q.contains("comparison") || q.contains("vs") {
        terms.extend(["comparison", "versus", "alternative"]);
    }

    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(energy: f64, carbon: f64, subsidy: f64, total: f64) -> CostBreakdown {
        CostBreakdown {
            chip_cost: total - energy - carbon,
            energy_cost: energy,
            carbon_tax: carbon,
            maintenance: 0.0,
            supply_chain_risk: 0.0,
            subsidy_amount: subsidy,
            total_before_subsidy: total,
        }
    }

    fn request(b: CostBreakdown) -> ExplainRequest {
        ExplainRequest {
            material_name: "SiC".to_string(),
            region_name: "Germany".to_string(),
            breakdown: b,
        }
    }

    #[test]
    fn always_includes_subject_fragments() {
        let q = explain_query(&request(breakdown(0.0, 0.0, 0.0, 100.0)));
        assert!(q.contains("SiC semiconductor"));
        assert!(q.contains("Germany energy costs"));
        assert!(q.contains("Total Cost of Ownership"));
    }

    #[test]
    fn energy_fragment_only_when_dominant() {
        let quiet = explain_query(&request(breakdown(10.0, 0.0, 0.0, 100.0)));
        assert!(!quiet.contains("energy efficiency"));

        let loud = explain_query(&request(breakdown(40.0, 0.0, 0.0, 100.0)));
        assert!(loud.contains("energy efficiency power consumption"));
    }

    #[test]
    fn carbon_fragment_only_when_dominant() {
        let quiet = explain_query(&request(breakdown(0.0, 5.0, 0.0, 100.0)));
        assert!(!quiet.contains("carbon tax CO2"));

        let loud = explain_query(&request(breakdown(0.0, 20.0, 0.0, 100.0)));
        assert!(loud.contains("carbon tax CO2 emissions"));
    }

    #[test]
    fn subsidy_fragment_when_any_subsidy() {
        let q = explain_query(&request(breakdown(0.0, 0.0, 1.0, 100.0)));
        assert!(q.contains("government funding incentives"));
    }

    #[test]
    fn zero_total_skips_ratio_fragments() {
        let q = explain_query(&request(breakdown(40.0, 20.0, 0.0, 0.0)));
        assert!(!q.contains("energy efficiency"));
        assert!(!q.contains("CO2 emissions"));
    }

    #[test]
    fn chat_query_adds_funding_synonyms() {
        let q = chat_query("How much funding is available?", None, &[]);
        assert!(q.contains("EU Chips Act"));
        assert!(q.contains("grant"));
    }

    #[test]
    fn chat_query_uses_most_recent_user_message_only() {
        let history = vec![
            ChatMessage { role: ChatRole::User, content: "older question".to_string() },
            ChatMessage { role: ChatRole::Assistant, content: "an answer".to_string() },
            ChatMessage { role: ChatRole::User, content: "newer question".to_string() },
            ChatMessage { role: ChatRole::Assistant, content: "another answer".to_string() },
        ];
        let q = chat_query("and now?", None, &history);
        assert!(q.contains("newer question"));
        assert!(!q.contains("older question"));
        assert!(!q.contains("an answer"));
    }

    #[test]
    fn chat_query_includes_context_identifiers() {
        let r = request(breakdown(0.0, 0.0, 0.0, 100.0));
        let q = chat_query("why so expensive?", Some(&r), &[]);
        assert!(q.contains("SiC"));
        assert!(q.contains("Germany"));
    }
}
