/// Rule-based core of the claims service.
///
/// Everything in here is pure, synchronous computation over in-memory strings
/// and small records. The only state is the pattern tables and thresholds,
/// compiled once at construction and read-only afterwards, so the types are
/// safe to share across concurrent request handlers behind an `Arc`.
///
/// This core is also the fallback decision path: when the hosted LLM is
/// unreachable or returns something that does not parse as a decision, the
/// same query and candidate clauses are run through `DecisionOrchestrator`.
mod clause_info;
mod decision;
mod eligibility;
mod entities;
mod relevance;

pub use clause_info::ClauseInfoExtractor;
pub use decision::{DecisionOrchestrator, MAX_MAPPED_CLAUSES};
pub use eligibility::{EligibilityEvaluator, EligibilityRules, Evaluation};
pub use entities::QueryEntityExtractor;
pub use relevance::RelevanceMatcher;
