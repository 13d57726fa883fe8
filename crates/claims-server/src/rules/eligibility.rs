/// Coverage eligibility evaluation.
///
/// Applies the business rule tables to extracted query entities and the
/// matched clauses, short-circuiting on the first disqualifying condition:
/// age bounds, then waiting periods, then coverage-limit aggregation. The
/// rule tables are plain data so a jurisdiction-specific set can be swapped
/// in without touching the evaluation logic.
use crate::model::{ClauseMatch, DecisionType, QueryEntities};

use super::ClauseInfoExtractor;

/// Immutable rule tables, fixed at construction.
#[derive(Debug, Clone)]
pub struct EligibilityRules {
    pub min_age: u32,
    pub max_age: u32,
    /// Waiting periods in months, by condition category.
    pub waiting_general: u32,
    pub waiting_surgery: u32,
    pub waiting_pre_existing: u32,
    /// Terms that put a condition in the surgery category: body parts plus
    /// the procedure words themselves, so "knee surgery", "knee", and
    /// "surgery" all land in the same category.
    pub surgery_terms: Vec<&'static str>,
    pub pre_existing_terms: Vec<&'static str>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 65,
            waiting_general: 3,
            waiting_surgery: 12,
            waiting_pre_existing: 24,
            surgery_terms: vec!["knee", "hip", "heart", "brain", "spine", "surgery", "operation"],
            pre_existing_terms: vec!["cancer", "diabetes", "hypertension"],
        }
    }
}

/// Result of one evaluation. Produced once per request, never mutated.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub eligible: bool,
    pub decision: DecisionType,
    pub amount: Option<f64>,
    pub justification: String,
    pub waiting_period_info: Option<String>,
    /// Informational only — collected exclusions never flip the decision.
    pub exclusions: Vec<String>,
    pub confidence_score: f32,
    /// Ids of clauses that contributed a coverage limit.
    pub applicable_clauses: Vec<String>,
}

impl Evaluation {
    fn rejected(justification: String, confidence_score: f32) -> Self {
        Self {
            eligible: false,
            decision: DecisionType::Rejected,
            amount: None,
            justification,
            waiting_period_info: None,
            exclusions: Vec::new(),
            confidence_score,
            applicable_clauses: Vec::new(),
        }
    }
}

pub struct EligibilityEvaluator {
    rules: EligibilityRules,
    clause_info: ClauseInfoExtractor,
}

impl Default for EligibilityEvaluator {
    fn default() -> Self {
        Self::new(EligibilityRules::default())
    }
}

impl EligibilityEvaluator {
    pub fn new(rules: EligibilityRules) -> Self {
        Self {
            rules,
            clause_info: ClauseInfoExtractor::new(),
        }
    }

    pub fn evaluate(&self, entities: &QueryEntities, matched: &[ClauseMatch]) -> Evaluation {
        // 1. Age bounds, inclusive on both ends.
        if let Some(age) = entities.age {
            if age < self.rules.min_age {
                return Evaluation::rejected(
                    format!(
                        "Age {age} is below the minimum eligible age of {} years",
                        self.rules.min_age
                    ),
                    0.0,
                );
            }
            if age > self.rules.max_age {
                return Evaluation::rejected(
                    format!(
                        "Age {age} is above the maximum eligible age of {} years",
                        self.rules.max_age
                    ),
                    0.0,
                );
            }
        }

        // 2. Waiting period, when both condition and policy duration are known.
        // A duration string that does not parse as whole months is treated as
        // unknown, skipping the check.
        let condition = entities.condition.as_deref().map(str::to_lowercase);
        let policy_months = entities
            .policy_duration
            .as_deref()
            .and_then(|d| d.trim().parse::<u32>().ok());

        if let (Some(condition), Some(months)) = (condition.as_deref(), policy_months) {
            let required = self.required_waiting_months(condition);
            if months < required {
                let mut evaluation = Evaluation::rejected(
                    format!(
                        "Waiting period not met. Required: {required} months, Current: {months} months"
                    ),
                    0.0,
                );
                evaluation.waiting_period_info = Some(format!(
                    "Policy is only {months} months old, but {required} months waiting period is required for {condition}"
                ));
                return evaluation;
            }
        }

        // 3. Aggregate coverage limits and exclusions across matched clauses.
        let mut max_coverage: u64 = 0;
        let mut applicable_clauses: Vec<String> = Vec::new();
        let mut exclusions: Vec<String> = Vec::new();

        for clause in matched {
            let info = self.clause_info.extract(&clause.clause_content);

            if let Some(limit) = info.coverage_limit {
                if limit > max_coverage {
                    max_coverage = limit;
                }
                applicable_clauses.push(clause.clause_id.clone());
            }

            for exclusion in info.exclusions {
                if !exclusions.contains(&exclusion) {
                    exclusions.push(exclusion);
                }
            }
        }

        // 4./5. Approve when some clause carries a payable limit.
        if max_coverage > 0 {
            let condition_label = condition.as_deref().unwrap_or("the requested treatment");
            Evaluation {
                eligible: true,
                decision: DecisionType::Approved,
                amount: Some(max_coverage as f64),
                justification: format!(
                    "Coverage approved for {condition_label} with maximum amount of {max_coverage}"
                ),
                waiting_period_info: None,
                exclusions,
                confidence_score: 0.8,
                applicable_clauses,
            }
        } else {
            let mut evaluation = Evaluation::rejected(
                "No applicable coverage clauses found for the query".to_string(),
                0.3,
            );
            evaluation.exclusions = exclusions;
            evaluation
        }
    }

    /// Waiting period required for a condition, in months.
    fn required_waiting_months(&self, condition: &str) -> u32 {
        if self
            .rules
            .surgery_terms
            .iter()
            .any(|term| condition.contains(term))
        {
            self.rules.waiting_surgery
        } else if self
            .rules
            .pre_existing_terms
            .iter()
            .any(|term| condition.contains(term))
        {
            self.rules.waiting_pre_existing
        } else {
            self.rules.waiting_general
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(id: &str, content: &str) -> ClauseMatch {
        ClauseMatch {
            clause_id: id.to_string(),
            clause_title: format!("Clause {id}"),
            clause_content: content.to_string(),
            relevance_score: 0.9,
            document_id: None,
        }
    }

    fn entities(
        age: Option<u32>,
        condition: Option<&str>,
        duration: Option<&str>,
    ) -> QueryEntities {
        QueryEntities {
            age,
            condition: condition.map(str::to_string),
            policy_duration: duration.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn age_seventeen_rejected_naming_lower_bound() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(17), Some("knee"), Some("36")),
            &[clause("c1", "coverage limit 500,000")],
        );
        assert!(!eval.eligible);
        assert_eq!(eval.decision, DecisionType::Rejected);
        assert_eq!(eval.amount, None);
        assert!(eval.justification.contains("18"));
    }

    #[test]
    fn age_sixty_six_rejected_naming_upper_bound() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(66), None, None),
            &[clause("c1", "coverage limit 500,000")],
        );
        assert!(!eval.eligible);
        assert!(eval.justification.contains("65"));
    }

    #[test]
    fn boundary_ages_pass() {
        let e = EligibilityEvaluator::default();
        for age in [18, 65] {
            let eval = e.evaluate(
                &entities(Some(age), None, None),
                &[clause("c1", "coverage limit 500,000")],
            );
            assert!(eval.eligible, "age {age} should be eligible");
        }
    }

    #[test]
    fn knee_surgery_six_months_rejected_citing_twelve() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(&entities(Some(40), Some("knee surgery"), Some("6")), &[]);
        assert!(!eval.eligible);
        let info = eval.waiting_period_info.expect("waiting info");
        assert!(info.contains("12"));
        assert!(info.contains("6"));
        assert!(eval.justification.contains("Required: 12"));
        assert!(eval.justification.contains("Current: 6"));
    }

    #[test]
    fn bare_surgery_condition_gets_surgery_waiting_period() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(&entities(Some(46), Some("surgery"), Some("3")), &[]);
        assert!(!eval.eligible);
        assert!(eval.justification.contains("Required: 12"));
    }

    #[test]
    fn diabetes_thirty_months_passes_waiting_and_evaluates_coverage() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(50), Some("diabetes"), Some("30")),
            &[clause("c1", "Diabetes care with sum insured of 2,00,000")],
        );
        assert!(eval.eligible);
        assert_eq!(eval.decision, DecisionType::Approved);
        assert_eq!(eval.amount, Some(200000.0));
        assert_eq!(eval.applicable_clauses, vec!["c1"]);
        assert_eq!(eval.confidence_score, 0.8);
    }

    #[test]
    fn diabetes_twenty_months_fails_waiting() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(&entities(Some(50), Some("diabetes"), Some("20")), &[]);
        assert!(!eval.eligible);
        assert!(eval.justification.contains("Required: 24"));
    }

    #[test]
    fn unknown_condition_uses_general_waiting() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(&entities(None, Some("physiotherapy"), Some("2")), &[]);
        assert!(!eval.eligible);
        assert!(eval.justification.contains("Required: 3"));
    }

    #[test]
    fn amount_is_max_across_clauses() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(30), None, None),
            &[
                clause("low", "coverage limit 100,000"),
                clause("high", "sum insured of 750,000"),
                clause("none", "general terms and definitions"),
            ],
        );
        assert_eq!(eval.amount, Some(750000.0));
        assert_eq!(eval.applicable_clauses, vec!["low", "high"]);
    }

    #[test]
    fn exclusions_collected_but_do_not_reject() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(30), Some("knee"), Some("24")),
            &[
                clause("cov", "coverage limit 500,000"),
                clause("exc", "Exclusions: cosmetic surgery, dental care"),
            ],
        );
        assert!(eval.eligible);
        assert_eq!(
            eval.exclusions,
            vec!["cosmetic surgery", "dental care"]
        );
    }

    #[test]
    fn no_clauses_rejects_with_low_confidence() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(&entities(Some(30), None, None), &[]);
        assert!(!eval.eligible);
        assert_eq!(eval.confidence_score, 0.3);
        assert!(eval.justification.contains("No applicable coverage"));
    }

    #[test]
    fn unparsable_duration_skips_waiting_check() {
        let e = EligibilityEvaluator::default();
        let eval = e.evaluate(
            &entities(Some(30), Some("knee"), Some("recent")),
            &[clause("c1", "coverage limit 500,000")],
        );
        assert!(eval.eligible);
    }
}
