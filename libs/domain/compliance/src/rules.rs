// [libs/domain/compliance/src/rules.rs]
//! Business-logic alignment: each configured rule either rewards a
//! candidate for matching an include-keyword or penalizes it for
//! missing one, and separately penalizes (or hard-blocks) a match
//! against any exclude-keyword.

use grantwell_domain_models::config::ComplianceRule;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    pub score: f64,
    /// `Some(rule_key)` once a `hard_block` rule's excludes matched;
    /// the candidate must be dropped from the run, not scored.
    pub hard_rejected_by: Option<String>,
}

/// Evaluates every rule that applies to the candidate's sectors against
/// its searchable text, starting from a perfect 1.0 and subtracting
/// penalties as rules fail. Evaluation stops early once a hard-block
/// rejection fires, since the candidate will be dropped regardless of
/// the remaining rules' scores.
pub fn evaluate_business_logic_alignment(searchable_text: &str, sectors: &[String], rules: &[ComplianceRule]) -> RuleEvaluation {
    let haystack = searchable_text.to_lowercase();
    let mut score = 1.0_f64;

    for rule in rules.iter().filter(|r| r.applies_to(sectors)) {
        let excludes_hit = rule.exclude_keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase()));
        if excludes_hit {
            if rule.hard_block {
                return RuleEvaluation { score: 0.0, hard_rejected_by: Some(rule.rule_key.clone()) };
            }
            score -= rule.hard_reject_penalty;
            continue;
        }

        let includes_configured = !rule.include_keywords.is_empty();
        let includes_hit = rule.include_keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase()));
        if includes_configured && !includes_hit {
            score -= rule.penalty;
        }
    }

    RuleEvaluation { score: score.clamp(0.0, 1.0), hard_rejected_by: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn rule(key: &str, hard_block: bool, includes: &[&str], excludes: &[&str]) -> ComplianceRule {
        ComplianceRule {
            id: Uuid::new_v4(),
            rule_key: key.into(),
            description: String::new(),
            hard_block,
            applies_to_sectors: vec![],
            include_keywords: includes.iter().map(|s| s.to_string()).collect(),
            exclude_keywords: excludes.iter().map(|s| s.to_string()).collect(),
            penalty: ComplianceRule::DEFAULT_PENALTY,
            hard_reject_penalty: ComplianceRule::DEFAULT_HARD_REJECT_PENALTY,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_rules_scores_perfectly() {
        let result = evaluate_business_logic_alignment("anything", &[], &[]);
        assert_eq!(result.score, 1.0);
        assert!(result.hard_rejected_by.is_none());
    }

    #[test]
    fn missing_include_keyword_applies_penalty() {
        let rules = vec![rule("women_owned", false, &["women-owned"], &[])];
        let result = evaluate_business_logic_alignment("a general small business grant", &[], &rules);
        assert_eq!(result.score, 1.0 - ComplianceRule::DEFAULT_PENALTY);
    }

    #[test]
    fn matching_include_keyword_applies_no_penalty() {
        let rules = vec![rule("women_owned", false, &["women-owned"], &[])];
        let result = evaluate_business_logic_alignment("a grant for women-owned businesses", &[], &rules);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn soft_exclude_match_applies_hard_reject_penalty_without_dropping() {
        let rules = vec![rule("no_lobbying", false, &[], &["lobbying"])];
        let result = evaluate_business_logic_alignment("funds for lobbying activities", &[], &rules);
        assert_eq!(result.score, 1.0 - ComplianceRule::DEFAULT_HARD_REJECT_PENALTY);
        assert!(result.hard_rejected_by.is_none());
    }

    #[test]
    fn hard_block_exclude_match_rejects_with_rule_key() {
        let rules = vec![rule("no_gambling", true, &[], &["gambling"])];
        let result = evaluate_business_logic_alignment("a grant for online gambling platforms", &[], &rules);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.hard_rejected_by.as_deref(), Some("no_gambling"));
    }

    #[test]
    fn rule_not_applicable_to_sector_is_skipped() {
        let mut r = rule("ag_only", false, &["irrigation"], &[]);
        r.applies_to_sectors = vec!["agriculture".to_string()];
        let result = evaluate_business_logic_alignment("a fintech lending platform", &["fintech".to_string()], &[r]);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn score_never_goes_below_zero_with_many_penalties() {
        let rules = vec![
            rule("a", false, &["zzz1"], &[]),
            rule("b", false, &["zzz2"], &[]),
            rule("c", false, &["zzz3"], &[]),
            rule("d", false, &["zzz4"], &[]),
            rule("e", false, &["zzz5"], &[]),
            rule("f", false, &["zzz6"], &[]),
        ];
        let result = evaluate_business_logic_alignment("no matches here", &[], &rules);
        assert_eq!(result.score, 0.0);
    }
}
