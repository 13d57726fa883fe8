use serde::{Deserialize, Serialize};

/// A policy clause matched against a query.
///
/// Produced by vector search or by document segmentation; immutable once
/// matched. `relevance_score` is a heuristic [0,1] applicability measure,
/// either derived from the vector distance or recomputed lexically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseMatch {
    pub clause_id: String,
    pub clause_title: String,
    pub clause_content: String,
    pub relevance_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Classification of a clause, by the first pattern family that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    General,
    WaitingPeriod,
    CoverageLimit,
    Exclusion,
    PreExisting,
}

/// Structured attributes pulled out of a clause's free text.
///
/// Derived per call, never persisted; recomputation is cheap and clause
/// content is small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseInfo {
    pub clause_type: ClauseType,
    pub waiting_period_months: Option<u32>,
    pub coverage_limit: Option<u64>,
    pub exclusions: Vec<String>,
}

impl Default for ClauseInfo {
    fn default() -> Self {
        Self {
            clause_type: ClauseType::General,
            waiting_period_months: None,
            coverage_limit: None,
            exclusions: Vec::new(),
        }
    }
}

/// Entities extracted from a free-text insurance query.
///
/// All fields optional; absence means "unknown", not zero. `policy_duration`
/// is kept as the captured string — the evaluator parses it as whole months.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    Approved,
    Rejected,
    Pending,
    Partial,
}

/// Final coverage decision returned to the caller. Never mutated after
/// construction.
///
/// Invariants: `decision == Approved` implies `amount` is the maximum coverage
/// limit across the applicable clauses; `confidence_score` is in [0,1];
/// `mapped_clauses` only references clause ids from the candidate set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceDecision {
    pub decision: DecisionType,
    pub amount: Option<f64>,
    pub justification: String,
    pub mapped_clauses: Vec<String>,
    pub confidence_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_period_info: Option<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Where a decision came from: the hosted LLM, or the rule engine standing in
/// for it. Callers log and report provenance rather than branching on caught
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Llm,
    RuleFallback,
}

#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    Llm(InsuranceDecision),
    RuleFallback(InsuranceDecision),
}

impl DecisionOutcome {
    pub fn source(&self) -> DecisionSource {
        match self {
            DecisionOutcome::Llm(_) => DecisionSource::Llm,
            DecisionOutcome::RuleFallback(_) => DecisionSource::RuleFallback,
        }
    }

    pub fn into_decision(self) -> InsuranceDecision {
        match self {
            DecisionOutcome::Llm(d) | DecisionOutcome::RuleFallback(d) => d,
        }
    }
}

/// A clause record produced by document segmentation, before embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub clause_id: String,
    pub clause_title: String,
    pub clause_content: String,
}

// --- HTTP wire types ---

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryAnalysisResponse {
    pub query: String,
    pub extracted_entities: QueryEntities,
    pub matched_clauses: Vec<ClauseMatch>,
    pub decision: InsuranceDecision,
    pub decision_source: DecisionSource,
    pub processing_time: f64,
}

/// Upload body: page texts already extracted from the PDF by the caller.
/// The server never parses PDF binary content itself.
#[derive(Debug, Deserialize)]
pub struct DocumentUploadRequest {
    pub filename: String,
    pub pages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentUploadResponse {
    pub document_id: String,
    pub filename: String,
    pub pages_processed: usize,
    pub clauses_extracted: usize,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Metadata kept in Redis per uploaded document, for the stats endpoint and
/// delete confirmation. The clause vectors themselves live in LanceDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_id: String,
    pub filename: String,
    pub pages_processed: usize,
    pub clauses_extracted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DecisionType::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionType::Rejected).unwrap(),
            "\"rejected\""
        );
    }

    #[test]
    fn entities_skip_missing_fields() {
        let entities = QueryEntities {
            age: Some(46),
            ..Default::default()
        };
        let json = serde_json::to_string(&entities).unwrap();
        assert_eq!(json, r#"{"age":46}"#);
    }

    #[test]
    fn outcome_provenance() {
        let d = InsuranceDecision {
            decision: DecisionType::Rejected,
            amount: None,
            justification: "no clauses".to_string(),
            mapped_clauses: vec![],
            confidence_score: 0.3,
            waiting_period_info: None,
            exclusions: vec![],
        };
        let outcome = DecisionOutcome::RuleFallback(d.clone());
        assert_eq!(outcome.source(), DecisionSource::RuleFallback);
        assert_eq!(
            outcome.into_decision().justification,
            d.justification
        );
    }
}
