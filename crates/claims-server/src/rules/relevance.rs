/// Lexical relevance scoring between a query and candidate clauses.
///
/// This is a heuristic ranking, not a learned model. It serves as an
/// independent re-ranker for vector-search candidates when their distance
/// scores are distrusted, and as the scoring path for clauses that arrive
/// without a score.
///
/// Score = |query words ∩ clause words| / |query words|
///       + 0.3 per shared medical term + 0.2 per shared city,
/// clamped to 1.0 at the end only. Clauses scoring <= 0.1 are dropped and the
/// rest are stable-sorted by descending score, so ties keep arrival order.
use std::collections::HashSet;

use crate::model::ClauseMatch;

const MEDICAL_TERMS: [&str; 6] = ["surgery", "knee", "hip", "heart", "cancer", "diabetes"];
const CITIES: [&str; 5] = ["mumbai", "delhi", "pune", "bangalore", "chennai"];
const MEDICAL_BONUS: f32 = 0.3;
const CITY_BONUS: f32 = 0.2;
const MIN_RELEVANCE: f32 = 0.1;

pub struct RelevanceMatcher {
    medical_terms: Vec<&'static str>,
    cities: Vec<&'static str>,
    threshold: f32,
}

impl Default for RelevanceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RelevanceMatcher {
    pub fn new() -> Self {
        Self {
            medical_terms: MEDICAL_TERMS.to_vec(),
            cities: CITIES.to_vec(),
            threshold: MIN_RELEVANCE,
        }
    }

    /// Score the candidates against the query, drop everything at or below
    /// the threshold, and sort by descending score.
    ///
    /// Each surviving clause's `relevance_score` is overwritten with the
    /// lexical score. Input order is preserved among equal scores.
    pub fn rank(&self, query: &str, clauses: Vec<ClauseMatch>) -> Vec<ClauseMatch> {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();

        let mut matched: Vec<ClauseMatch> = clauses
            .into_iter()
            .filter_map(|mut clause| {
                let score = self.score(&query_lower, &query_words, &clause.clause_content);
                if score > self.threshold {
                    clause.relevance_score = score;
                    Some(clause)
                } else {
                    None
                }
            })
            .collect();

        // Vec::sort_by is stable; ties keep input relative order.
        matched.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matched
    }

    /// Score one clause. An empty query scores 0 — not an error.
    pub fn score(&self, query_lower: &str, query_words: &HashSet<&str>, content: &str) -> f32 {
        let content_lower = content.to_lowercase();
        let content_words: HashSet<&str> = content_lower.split_whitespace().collect();

        let mut score = if query_words.is_empty() {
            0.0
        } else {
            let common = query_words.intersection(&content_words).count();
            common as f32 / query_words.len() as f32
        };

        // Bonus terms use substring containment on the whole strings, so
        // "knees" still credits "knee". Bonuses are additive and cumulative;
        // only the final clamp bounds them.
        for term in &self.medical_terms {
            if query_lower.contains(term) && content_lower.contains(term) {
                score += MEDICAL_BONUS;
            }
        }
        for city in &self.cities {
            if query_lower.contains(city) && content_lower.contains(city) {
                score += CITY_BONUS;
            }
        }

        score.min(1.0)
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
            relevance_score: 0.0,
            document_id: None,
        }
    }

    #[test]
    fn disjoint_clause_scores_zero_and_is_dropped() {
        let m = RelevanceMatcher::new();
        let ranked = m.rank(
            "knee surgery coverage",
            vec![clause("c1", "premium payment schedule and grace periods")],
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn score_exactly_at_threshold_is_dropped() {
        let m = RelevanceMatcher::new();
        // ten query words, one shared, no bonus terms: base = 1/10 = threshold
        let query = "alpha bravo charlie delta echo foxtrot golf hotel india juliet";
        let ranked = m.rank(query, vec![clause("c1", "alpha filings")]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn score_just_above_threshold_is_kept() {
        let m = RelevanceMatcher::new();
        // nine query words, one shared: base = 1/9 > threshold
        let query = "alpha bravo charlie delta echo foxtrot golf hotel india";
        let ranked = m.rank(query, vec![clause("c1", "alpha filings")]);
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].relevance_score > MIN_RELEVANCE);
    }

    #[test]
    fn score_clamped_to_one() {
        let m = RelevanceMatcher::new();
        let query = "knee surgery heart cancer diabetes in pune mumbai";
        let content = "knee surgery heart cancer diabetes covered in pune and mumbai hospitals";
        let query_lower = query.to_lowercase();
        let words: HashSet<&str> = query_lower.split_whitespace().collect();
        let score = m.score(&query_lower, &words, content);
        assert!((score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_query_scores_zero() {
        let m = RelevanceMatcher::new();
        let words: HashSet<&str> = HashSet::new();
        assert_eq!(m.score("", &words, "knee surgery is covered"), 0.0);
    }

    #[test]
    fn ties_preserve_input_order() {
        let m = RelevanceMatcher::new();
        // identical content gives identical scores
        let ranked = m.rank(
            "knee surgery",
            vec![
                clause("first", "knee surgery covered"),
                clause("second", "knee surgery covered"),
            ],
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].clause_id, "first");
        assert_eq!(ranked[1].clause_id, "second");
        assert_eq!(ranked[0].relevance_score, ranked[1].relevance_score);
    }

    #[test]
    fn higher_scores_sort_first() {
        let m = RelevanceMatcher::new();
        let ranked = m.rank(
            "knee surgery in pune",
            vec![
                clause("weak", "surgery related terms only"),
                clause("strong", "knee surgery in pune is covered"),
            ],
        );
        assert_eq!(ranked[0].clause_id, "strong");
        assert!(ranked[0].relevance_score > ranked[1].relevance_score);
    }

    #[test]
    fn medical_bonus_is_additive() {
        let m = RelevanceMatcher::new();
        let query_lower = "zzz knee heart".to_string();
        let words: HashSet<&str> = query_lower.split_whitespace().collect();
        // no word overlap with the query's words beyond bonus terms:
        // base = 2/3 (knee, heart shared as words) plus two 0.3 bonuses -> clamped
        let with_both = m.score(&query_lower, &words, "knee heart");
        assert!((with_both - 1.0).abs() < f32::EPSILON);

        let with_one = m.score(&query_lower, &words, "knee only here");
        // base 1/3 + single 0.3 bonus
        assert!((with_one - (1.0 / 3.0 + 0.3)).abs() < 1e-6);
    }
}
