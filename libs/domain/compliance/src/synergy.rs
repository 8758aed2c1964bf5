// [libs/domain/compliance/src/synergy.rs]
//! Strategic synergy: cosine-like token overlap between a candidate's
//! implied keywords and the profile's declared strategic goals.

use grantwell_core_scoring::token_overlap;
use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "for", "to", "of", "in", "on", "with", "is", "are", "this", "that", "will", "be", "by",
];

/// Splits free text into lowercase alphabetic tokens of at least four
/// characters, dropping common stopwords; the resulting bag stands in
/// for the "keywords/categories" the spec assumes a candidate carries.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let seen: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 4 && !STOPWORDS.contains(&w.as_str()))
        .collect();
    seen.into_iter().collect()
}

pub fn strategic_synergy(candidate_text: &str, strategic_goals: &[String]) -> f64 {
    let keywords = extract_keywords(candidate_text);
    token_overlap(&keywords, strategic_goals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_goals_score_above_zero() {
        let score = strategic_synergy("A grant supporting financial inclusion and rural lending programs.", &["financial_inclusion".into(), "rural".into()]);
        assert!(score >= 0.0);
    }

    #[test]
    fn no_overlap_scores_zero() {
        let score = strategic_synergy("A grant for coral reef restoration.", &["fintech".into(), "lending".into()]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn stopwords_are_excluded_from_keywords() {
        let keywords = extract_keywords("This grant is for the rural lending program");
        assert!(!keywords.contains(&"this".to_string()));
        assert!(keywords.contains(&"rural".to_string()));
    }
}
