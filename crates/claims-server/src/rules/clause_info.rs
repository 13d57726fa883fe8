/// Structured extraction from clause text.
///
/// Each pattern family (waiting period, coverage limit, exclusions,
/// pre-existing) is a named method returning an `Option`, so families can be
/// unit-tested and swapped independently of `extract`. Within a family the
/// patterns are tried in order and the first match wins — no accumulation.
///
/// Extraction never fails: free text with no recognizable structure yields the
/// default `ClauseInfo` with `clause_type == General`.
use regex::Regex;

use crate::model::{ClauseInfo, ClauseType};

pub struct ClauseInfoExtractor {
    waiting_patterns: Vec<Regex>,
    coverage_patterns: Vec<Regex>,
    exclusion_patterns: Vec<Regex>,
    pre_existing_pattern: Regex,
}

impl Default for ClauseInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseInfoExtractor {
    pub fn new() -> Self {
        let waiting_patterns = vec![
            Regex::new(r"(?i)(\d+)\s*(?:month|year)s?\s*waiting").expect("valid regex"),
            Regex::new(r"(?i)waiting\s*period\s*of\s*(\d+)\s*(?:month|year)s?")
                .expect("valid regex"),
        ];
        let coverage_patterns = vec![
            Regex::new(r"(?i)(\d+(?:,\d+)*)\s*(?:lakh|lac|thousand|million)")
                .expect("valid regex"),
            Regex::new(r"(?i)coverage\s*limit\s*(?:of\s*)?(?:rs\.?\s*|inr\s*)?(\d+(?:,\d+)*)")
                .expect("valid regex"),
            Regex::new(
                r"(?i)(?:maximum\s*coverage|sum\s*insured)\s*(?:of\s*)?(?:rs\.?\s*|inr\s*)?(\d+(?:,\d+)*)",
            )
            .expect("valid regex"),
            Regex::new(r"(?i)(\d+(?:,\d+)*)\s*(?:rupees|rs\b)").expect("valid regex"),
        ];
        // Post-colon whitespace stays on the same line so an empty list does
        // not capture the following line's text.
        let exclusion_patterns = vec![
            Regex::new(r"(?im)exclusions?\s*:[ \t]*([^\n]*)").expect("valid regex"),
            Regex::new(r"(?im)not\s*covered\s*:[ \t]*([^\n]*)").expect("valid regex"),
        ];
        let pre_existing_pattern =
            Regex::new(r"(?i)pre[\s-]*existing\s*conditions?").expect("valid regex");

        Self {
            waiting_patterns,
            coverage_patterns,
            exclusion_patterns,
            pre_existing_pattern,
        }
    }

    /// Run all pattern families over the clause text.
    ///
    /// Field population is independent of the type label: a clause that
    /// mentions both a waiting period and a coverage limit gets both fields.
    /// The `clause_type` label goes to the highest-priority family that
    /// matched (waiting period, then coverage limit, then exclusion, then
    /// pre-existing).
    pub fn extract(&self, content: &str) -> ClauseInfo {
        let waiting_period_months = self.waiting_period(content);
        let coverage_limit = self.coverage_limit(content);
        let exclusions = self.exclusions(content).unwrap_or_default();

        let clause_type = if waiting_period_months.is_some() {
            ClauseType::WaitingPeriod
        } else if coverage_limit.is_some() {
            ClauseType::CoverageLimit
        } else if !exclusions.is_empty() {
            ClauseType::Exclusion
        } else if self.pre_existing_pattern.is_match(content) {
            ClauseType::PreExisting
        } else {
            ClauseType::General
        };

        ClauseInfo {
            clause_type,
            waiting_period_months,
            coverage_limit,
            exclusions,
        }
    }

    /// Waiting period in the unit the clause states it (months in practice).
    pub fn waiting_period(&self, content: &str) -> Option<u32> {
        for pattern in &self.waiting_patterns {
            if let Some(caps) = pattern.captures(content) {
                if let Ok(n) = caps[1].parse::<u32>() {
                    return Some(n);
                }
            }
        }
        None
    }

    /// Maximum payable amount. Commas are stripped; the magnitude word is a
    /// match anchor only, never a multiplier.
    pub fn coverage_limit(&self, content: &str) -> Option<u64> {
        for pattern in &self.coverage_patterns {
            if let Some(caps) = pattern.captures(content) {
                let digits = caps[1].replace(',', "");
                if let Ok(n) = digits.parse::<u64>() {
                    return Some(n);
                }
            }
        }
        None
    }

    /// Comma-separated exclusion list following "exclusion(s):" or
    /// "not covered:", up to end of line, each entry trimmed and empty
    /// entries dropped. The first pattern that matches decides the result,
    /// even when its list is empty.
    pub fn exclusions(&self, content: &str) -> Option<Vec<String>> {
        for pattern in &self.exclusion_patterns {
            if let Some(caps) = pattern.captures(content) {
                let items: Vec<String> = caps[1]
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                return Some(items);
            }
        }
        None
    }
}
