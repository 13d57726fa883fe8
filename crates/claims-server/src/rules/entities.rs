/// Pattern-based entity extraction from free-text insurance queries.
///
/// This is the primary structured view of a query and also the fallback when
/// the LLM's entity extraction fails or returns unparsable output. Every field
/// is scanned independently; a missing field never blocks the others and there
/// is no error path — the extractor returns whatever subset it finds.
use regex::Regex;

use crate::model::QueryEntities;

/// Cities recognized for the location field, scanned in this order with the
/// canonical capitalization returned.
const CITIES: [&str; 6] = ["Mumbai", "Delhi", "Pune", "Bangalore", "Chennai", "Kolkata"];

pub struct QueryEntityExtractor {
    age_re: Regex,
    gender_re: Regex,
    condition_groups: Vec<Regex>,
    duration_month_re: Regex,
    duration_year_re: Regex,
    cities: Vec<&'static str>,
}

impl Default for QueryEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryEntityExtractor {
    pub fn new() -> Self {
        let age_re = Regex::new(r"(?i)(\d+)[\s-]*(?:year|yr)s?[\s-]*old").expect("valid regex");
        let gender_re = Regex::new(r"(?i)\b(male|female|man|woman)\b").expect("valid regex");
        // Ordered groups: procedures, then body parts, then named conditions.
        // The first group with any match supplies the condition and scanning stops.
        let condition_groups = vec![
            Regex::new(r"(?i)\b(surgery|operation|procedure|treatment|therapy)\b")
                .expect("valid regex"),
            Regex::new(r"(?i)\b(knee|hip|heart|brain|spine|joint)\b").expect("valid regex"),
            Regex::new(r"(?i)\b(cancer|diabetes|hypertension|asthma)\b").expect("valid regex"),
        ];
        let duration_month_re =
            Regex::new(r"(?i)(\d+)[\s-]*months?[\s-]*(?:old|policy)").expect("valid regex");
        let duration_year_re =
            Regex::new(r"(?i)(\d+)[\s-]*(?:year|yr)s?[\s-]*(?:old|policy)").expect("valid regex");

        Self {
            age_re,
            gender_re,
            condition_groups,
            duration_month_re,
            duration_year_re,
            cities: CITIES.to_vec(),
        }
    }

    pub fn extract(&self, query: &str) -> QueryEntities {
        let mut entities = QueryEntities::default();
        let query_lower = query.to_lowercase();

        let age_span = self.age_re.captures(query).map(|caps| {
            let m = caps.get(0).expect("whole match");
            if let Ok(age) = caps[1].parse::<u32>() {
                entities.age = Some(age);
            }
            (m.start(), m.end())
        });

        if let Some(caps) = self.gender_re.captures(query) {
            entities.gender = Some(caps[1].to_lowercase());
        }

        for group in &self.condition_groups {
            if let Some(caps) = group.captures(query) {
                entities.condition = Some(caps[1].to_lowercase());
                break;
            }
        }

        for city in &self.cities {
            if query_lower.contains(&city.to_lowercase()) {
                entities.location = Some((*city).to_string());
                break;
            }
        }

        entities.policy_duration = self.policy_duration(query, age_span);

        entities
    }

    /// Policy duration as the captured count string.
    ///
    /// Month phrasing is preferred; a year-based match is only taken when it
    /// does not overlap the age span, so "46-year-old" never doubles as a
    /// 46-unit policy duration.
    fn policy_duration(&self, query: &str, age_span: Option<(usize, usize)>) -> Option<String> {
        if let Some(caps) = self.duration_month_re.captures(query) {
            return Some(caps[1].to_string());
        }
        for caps in self.duration_year_re.captures_iter(query) {
            let m = caps.get(0).expect("whole match");
            let overlaps_age = age_span
                .map(|(start, end)| m.start() < end && m.end() > start)
                .unwrap_or(false);
            if !overlaps_age {
                return Some(caps[1].to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_query_extraction() {
        let x = QueryEntityExtractor::new();
        let e = x.extract("46-year-old male, knee surgery in Pune, 3-month-old insurance policy");
        assert_eq!(e.age, Some(46));
        assert_eq!(e.gender.as_deref(), Some("male"));
        assert_eq!(e.condition.as_deref(), Some("surgery"));
        assert_eq!(e.location.as_deref(), Some("Pune"));
        assert_eq!(e.policy_duration.as_deref(), Some("3"));
        assert_eq!(e.coverage_type, None);
    }

    #[test]
    fn fields_are_independent() {
        let x = QueryEntityExtractor::new();
        let e = x.extract("Is diabetes treatment available in Chennai?");
        assert_eq!(e.age, None);
        assert_eq!(e.gender, None);
        // procedures group matches "treatment" before named conditions
        assert_eq!(e.condition.as_deref(), Some("treatment"));
        assert_eq!(e.location.as_deref(), Some("Chennai"));
    }

    #[test]
    fn condition_group_order() {
        let x = QueryEntityExtractor::new();
        assert_eq!(
            x.extract("my knee hurts").condition.as_deref(),
            Some("knee")
        );
        assert_eq!(
            x.extract("diagnosed with cancer").condition.as_deref(),
            Some("cancer")
        );
    }

    #[test]
    fn gender_woman_not_shadowed_by_man() {
        let x = QueryEntityExtractor::new();
        assert_eq!(
            x.extract("a 30 year old woman").gender.as_deref(),
            Some("woman")
        );
    }

    #[test]
    fn age_span_does_not_leak_into_duration() {
        let x = QueryEntityExtractor::new();
        let e = x.extract("46-year-old male with asthma");
        assert_eq!(e.age, Some(46));
        assert_eq!(e.policy_duration, None);
    }

    #[test]
    fn year_based_policy_duration() {
        let x = QueryEntityExtractor::new();
        let e = x.extract("coverage under my 2 year policy");
        assert_eq!(e.policy_duration.as_deref(), Some("2"));
    }

    #[test]
    fn no_entities_is_a_normal_result() {
        let x = QueryEntityExtractor::new();
        let e = x.extract("what does the policy say?");
        assert_eq!(e.age, None);
        assert_eq!(e.gender, None);
        assert_eq!(e.condition, None);
        assert_eq!(e.location, None);
        assert_eq!(e.policy_duration, None);
    }
}
