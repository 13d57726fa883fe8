/// LLM adjudication with a rule-engine fallback.
///
/// Every call here degrades rather than fails: a transport error, an upstream
/// error, or a reply that does not parse as the expected JSON sends the query
/// through the rule-based orchestrator instead, and the outcome records which
/// path produced it.
use claims_common::llm::{LlmClient, Message};
use serde::Deserialize;
use tracing::warn;

use crate::model::{
    Clause, ClauseMatch, DecisionOutcome, DecisionType, InsuranceDecision, QueryEntities,
};
use crate::rules::DecisionOrchestrator;

const ENTITY_SYSTEM_PROMPT: &str = "You are an insurance expert. Extract key entities from the user's insurance query.\n\n\
Extract the following entities:\n\
- age: numeric age of the person\n\
- gender: male/female\n\
- condition: medical condition or procedure mentioned\n\
- location: city or location mentioned\n\
- policy_duration: policy age or duration mentioned\n\
- coverage_type: type of coverage needed\n\n\
Return only a JSON object with these fields. If a field is not found, use null.";

const DECISION_SYSTEM_PROMPT: &str = "You are an expert insurance analyst. Analyze the insurance query and relevant clauses to provide a decision.\n\n\
You must return a JSON response with the following structure:\n\
{\n\
    \"decision\": \"approved\" or \"rejected\" or \"pending\" or \"partial\",\n\
    \"amount\": numeric amount in currency (null if rejected),\n\
    \"justification\": \"detailed explanation of the decision\",\n\
    \"mapped_clauses\": [\"list of relevant clause IDs\"],\n\
    \"confidence_score\": float between 0.0 and 1.0,\n\
    \"waiting_period_info\": \"information about waiting periods if applicable\",\n\
    \"exclusions\": [\"list of applicable exclusions\"]\n\
}\n\n\
Consider:\n\
- Age eligibility (18-65 years)\n\
- Waiting periods (3 months general, 12 months surgery, 24 months pre-existing)\n\
- Coverage limits from clauses\n\
- Exclusions and limitations\n\
- Policy duration requirements";

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an insurance expert. Provide a concise summary of the insurance clauses provided.";

pub struct LlmAnalyst {
    client: LlmClient,
    fallback: DecisionOrchestrator,
}

impl LlmAnalyst {
    pub fn new(client: LlmClient, fallback: DecisionOrchestrator) -> Self {
        Self { client, fallback }
    }

    /// Extract entities from a query, preferring the hosted model.
    pub async fn extract_entities(&self, query: &str) -> QueryEntities {
        let messages = vec![
            Message::system(ENTITY_SYSTEM_PROMPT),
            Message::user(format!(
                "Extract entities from this insurance query: {query}"
            )),
        ];

        match self.client.complete(messages).await {
            Ok(reply) => match serde_json::from_str::<QueryEntities>(extract_json(&reply)) {
                Ok(entities) => entities,
                Err(e) => {
                    warn!(error = %e, "entity reply was not valid JSON, using pattern extraction");
                    self.fallback.extract_entities(query)
                }
            },
            Err(e) => {
                warn!(error = %e, "entity extraction call failed, using pattern extraction");
                self.fallback.extract_entities(query)
            }
        }
    }

    /// Decide coverage for a query against its matched clauses.
    pub async fn adjudicate(
        &self,
        query: &str,
        entities: &QueryEntities,
        matched: &[ClauseMatch],
    ) -> DecisionOutcome {
        let messages = vec![
            Message::system(DECISION_SYSTEM_PROMPT),
            Message::user(format!(
                "Insurance Query: {query}\n\nRelevant Clauses:\n{}\nProvide your analysis and decision in JSON format.",
                format_clauses(matched)
            )),
        ];

        match self.client.complete(messages).await {
            Ok(reply) => match parse_decision(&reply, matched) {
                Ok(decision) => DecisionOutcome::Llm(decision),
                Err(e) => {
                    warn!(error = %e, "decision reply was not a valid decision, using rule engine");
                    DecisionOutcome::RuleFallback(
                        self.fallback.decide_with_entities(entities, matched),
                    )
                }
            },
            Err(e) => {
                warn!(error = %e, "decision call failed, using rule engine");
                DecisionOutcome::RuleFallback(self.fallback.decide_with_entities(entities, matched))
            }
        }
    }

    /// Summarize an uploaded document's clauses. Returns a counted fallback
    /// string when the model is unreachable.
    pub async fn summarize_clauses(&self, clauses: &[Clause]) -> String {
        if clauses.is_empty() {
            return "No clauses found in the document.".to_string();
        }

        let mut clauses_text = String::new();
        for (i, clause) in clauses.iter().take(5).enumerate() {
            let preview: String = clause.clause_content.chars().take(200).collect();
            clauses_text.push_str(&format!(
                "{}. {}: {preview}...\n\n",
                i + 1,
                clause.clause_title
            ));
        }

        let messages = vec![
            Message::system(SUMMARY_SYSTEM_PROMPT),
            Message::user(format!(
                "Summarize these insurance clauses:\n\n{clauses_text}"
            )),
        ];

        match self.client.complete(messages).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "clause summary call failed");
                format!("Found {} clauses in the document.", clauses.len())
            }
        }
    }
}

/// What the model is asked to produce. Lenient on optional fields so a
/// mostly-correct reply still counts.
#[derive(Debug, Deserialize)]
struct DecisionReply {
    decision: DecisionType,
    #[serde(default)]
    amount: Option<f64>,
    justification: String,
    #[serde(default)]
    mapped_clauses: Vec<String>,
    confidence_score: f32,
    #[serde(default)]
    waiting_period_info: Option<String>,
    #[serde(default)]
    exclusions: Vec<String>,
}

fn parse_decision(
    reply: &str,
    candidates: &[ClauseMatch],
) -> Result<InsuranceDecision, serde_json::Error> {
    let parsed: DecisionReply = serde_json::from_str(extract_json(reply))?;

    // Only cite clause ids that were actually in the candidate set.
    let mapped_clauses: Vec<String> = parsed
        .mapped_clauses
        .into_iter()
        .filter(|id| candidates.iter().any(|c| &c.clause_id == id))
        .collect();

    Ok(InsuranceDecision {
        decision: parsed.decision,
        amount: parsed.amount,
        justification: parsed.justification,
        mapped_clauses,
        confidence_score: parsed.confidence_score.clamp(0.0, 1.0),
        waiting_period_info: parsed.waiting_period_info,
        exclusions: parsed.exclusions,
    })
}

fn format_clauses(matched: &[ClauseMatch]) -> String {
    let mut text = String::new();
    for (i, clause) in matched.iter().enumerate() {
        text.push_str(&format!(
            "Clause {}: {}\nContent: {}\nRelevance: {:.2}\n\n",
            i + 1,
            clause.clause_title,
            clause.clause_content,
            clause.relevance_score
        ));
    }
    text
}

/// Strip a markdown code fence if the model wrapped its JSON in one, then
/// trim to the outermost braces. Returns the input unchanged when neither
/// applies; the caller's parse will reject it.
fn extract_json(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")) {
        if let Some(inner) = rest.strip_suffix("```") {
            text = inner.trim();
        }
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(id: &str) -> ClauseMatch {
        ClauseMatch {
            clause_id: id.to_string(),
            clause_title: format!("Clause {id}"),
            clause_content: "coverage limit 100,000".to_string(),
            relevance_score: 0.5,
            document_id: None,
        }
    }

    #[test]
    fn extracts_json_from_code_fence() {
        let reply = "```json\n{\"decision\": \"approved\"}\n```";
        assert_eq!(extract_json(reply), "{\"decision\": \"approved\"}");
    }

    #[test]
    fn extracts_json_from_surrounding_prose() {
        let reply = "Here is my analysis: {\"decision\": \"rejected\"} Hope that helps.";
        assert_eq!(extract_json(reply), "{\"decision\": \"rejected\"}");
    }

    #[test]
    fn plain_json_passes_through() {
        let reply = "{\"a\": 1}";
        assert_eq!(extract_json(reply), "{\"a\": 1}");
    }

    #[test]
    fn decision_parse_filters_unknown_clause_ids() {
        let candidates = vec![clause("c1"), clause("c2")];
        let reply = r#"{
            "decision": "approved",
            "amount": 100000,
            "justification": "covered",
            "mapped_clauses": ["c1", "made-up", "c2"],
            "confidence_score": 0.9
        }"#;
        let decision = parse_decision(reply, &candidates).unwrap();
        assert_eq!(decision.mapped_clauses, vec!["c1", "c2"]);
        assert_eq!(decision.amount, Some(100000.0));
    }

    #[test]
    fn decision_parse_clamps_confidence() {
        let reply = r#"{
            "decision": "approved",
            "justification": "covered",
            "confidence_score": 1.7
        }"#;
        let decision = parse_decision(reply, &[]).unwrap();
        assert_eq!(decision.confidence_score, 1.0);
    }

    #[test]
    fn decision_parse_rejects_garbage() {
        assert!(parse_decision("the claim looks fine to me", &[]).is_err());
    }

    #[test]
    fn formatted_clauses_carry_scores() {
        let text = format_clauses(&[clause("c1")]);
        assert!(text.contains("Clause 1: Clause c1"));
        assert!(text.contains("Relevance: 0.50"));
    }
}
