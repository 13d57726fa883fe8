/// Rule-based decision orchestration.
///
/// Composes entity extraction and eligibility evaluation into the final
/// decision record. This is the path the LLM adjudicator falls back to when
/// the hosted model is unreachable or replies with something that does not
/// parse as a decision.
use crate::model::{ClauseMatch, InsuranceDecision, QueryEntities};

use super::{EligibilityEvaluator, EligibilityRules, QueryEntityExtractor};

/// At most this many clause ids are cited on a decision, taken in arrival
/// order (typically relevance-sorted).
pub const MAX_MAPPED_CLAUSES: usize = 3;

pub struct DecisionOrchestrator {
    entity_extractor: QueryEntityExtractor,
    evaluator: EligibilityEvaluator,
}

impl Default for DecisionOrchestrator {
    fn default() -> Self {
        Self::new(EligibilityRules::default())
    }
}

impl DecisionOrchestrator {
    pub fn new(rules: EligibilityRules) -> Self {
        Self {
            entity_extractor: QueryEntityExtractor::new(),
            evaluator: EligibilityEvaluator::new(rules),
        }
    }

    pub fn extract_entities(&self, query: &str) -> QueryEntities {
        self.entity_extractor.extract(query)
    }

    /// Produce a decision for the query against the matched clauses.
    pub fn decide(&self, query: &str, matched: &[ClauseMatch]) -> InsuranceDecision {
        let entities = self.entity_extractor.extract(query);
        self.decide_with_entities(&entities, matched)
    }

    /// Same as `decide`, for callers that already hold extracted entities.
    pub fn decide_with_entities(
        &self,
        entities: &QueryEntities,
        matched: &[ClauseMatch],
    ) -> InsuranceDecision {
        let evaluation = self.evaluator.evaluate(entities, matched);

        let mapped_clauses: Vec<String> = matched
            .iter()
            .take(MAX_MAPPED_CLAUSES)
            .map(|c| c.clause_id.clone())
            .collect();

        InsuranceDecision {
            decision: evaluation.decision,
            amount: evaluation.amount,
            justification: evaluation.justification,
            mapped_clauses,
            confidence_score: evaluation.confidence_score,
            waiting_period_info: evaluation.waiting_period_info,
            exclusions: evaluation.exclusions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DecisionType;

    fn clause(id: &str, content: &str) -> ClauseMatch {
        ClauseMatch {
            clause_id: id.to_string(),
            clause_title: format!("Clause {id}"),
            clause_content: content.to_string(),
            relevance_score: 0.8,
            document_id: None,
        }
    }

    #[test]
    fn knee_surgery_query_rejected_on_waiting_period() {
        let orchestrator = DecisionOrchestrator::default();
        let decision = orchestrator.decide(
            "46-year-old male, knee surgery in Pune, 3-month-old insurance policy",
            &[clause("c1", "Knee surgery coverage limit 500,000")],
        );
        assert_eq!(decision.decision, DecisionType::Rejected);
        let info = decision.waiting_period_info.expect("waiting info");
        assert!(info.contains("12"));
        assert!(info.contains("3"));
    }

    #[test]
    fn mapped_clauses_capped_at_three_in_arrival_order() {
        let orchestrator = DecisionOrchestrator::default();
        let candidates: Vec<ClauseMatch> = (1..=5)
            .map(|i| clause(&format!("c{i}"), "coverage limit 100,000"))
            .collect();
        let decision = orchestrator.decide("40 year old, claim for treatment", &candidates);
        assert_eq!(decision.mapped_clauses, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn mapped_clauses_only_reference_candidates() {
        let orchestrator = DecisionOrchestrator::default();
        let candidates = vec![clause("only", "sum insured of 300,000")];
        let decision = orchestrator.decide("hip replacement after 24 month policy", &candidates);
        for id in &decision.mapped_clauses {
            assert!(candidates.iter().any(|c| &c.clause_id == id));
        }
    }

    #[test]
    fn approval_amount_matches_max_limit() {
        let orchestrator = DecisionOrchestrator::default();
        let decision = orchestrator.decide(
            "30 year old with 24 month old policy, heart condition",
            &[
                clause("a", "coverage limit 200,000"),
                clause("b", "sum insured of 900,000"),
            ],
        );
        assert_eq!(decision.decision, DecisionType::Approved);
        assert_eq!(decision.amount, Some(900000.0));
    }

    #[test]
    fn empty_candidate_set_rejects_low_confidence() {
        let orchestrator = DecisionOrchestrator::default();
        let decision = orchestrator.decide("claim for consultation fees", &[]);
        assert_eq!(decision.decision, DecisionType::Rejected);
        assert_eq!(decision.confidence_score, 0.3);
        assert!(decision.mapped_clauses.is_empty());
    }
}
