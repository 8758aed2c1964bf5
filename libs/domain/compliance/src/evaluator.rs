// [libs/domain/compliance/src/evaluator.rs]
//! Wires Layer-1 scores carried on a research candidate to the Layer-2
//! scores this crate computes, then folds both into the final
//! composite used for ordering and persistence.

use grantwell_domain_models::config::ComplianceRule;
use grantwell_domain_models::grant::ScoreVector;
use grantwell_domain_models::profile::BusinessProfile;
use grantwell_domain_research::layer1::infer_reporting_complexity;
use grantwell_domain_research::EnrichedCandidate;

use grantwell_core_scoring::{composite_score, CompositeWeights};

use crate::feasibility::feasibility;
use crate::rules::evaluate_business_logic_alignment;
use crate::synergy::strategic_synergy;

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: EnrichedCandidate,
    pub score: ScoreVector,
    pub composite_score: f64,
}

#[derive(Debug, Clone)]
pub struct RejectedCandidate {
    pub candidate: EnrichedCandidate,
    pub rule_key: String,
}

pub enum EvaluationOutcome {
    Scored(ScoredCandidate),
    Rejected(RejectedCandidate),
}

pub struct ComplianceAgent {
    weights: CompositeWeights,
}

impl Default for ComplianceAgent {
    fn default() -> Self {
        ComplianceAgent { weights: CompositeWeights::DEFAULT }
    }
}

impl ComplianceAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&self, candidate: EnrichedCandidate, profile: &BusinessProfile, rules: &[ComplianceRule]) -> EvaluationOutcome {
        let searchable_text = format!("{} {} {}", candidate.title, candidate.description, candidate.eligibility.as_deref().unwrap_or_default());

        let rule_eval = evaluate_business_logic_alignment(&searchable_text, &profile.sectors, rules);
        if let Some(rule_key) = rule_eval.hard_rejected_by {
            tracing::debug!(rule_key = %rule_key, title = %candidate.title, "candidate hard-rejected by compliance rule");
            return EvaluationOutcome::Rejected(RejectedCandidate { candidate, rule_key });
        }

        let reporting_hint = infer_reporting_complexity(&candidate.description);
        let feasibility_score = feasibility(&candidate.description, candidate.funding, reporting_hint, &profile.resource_constraints);
        let strategic_score = strategic_synergy(&searchable_text, &profile.strategic_goals);

        let score = ScoreVector {
            sector_relevance: candidate.sector_relevance,
            geographic_relevance: candidate.geographic_relevance,
            operational_alignment: candidate.operational_alignment,
            business_logic_alignment: rule_eval.score,
            feasibility: feasibility_score,
            strategic_synergy: strategic_score,
        }
        .clamped();

        let composite = composite_score(score, self.weights, candidate.stale);

        EvaluationOutcome::Scored(ScoredCandidate { candidate, score, composite_score: composite })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grantwell_domain_models::grant::FundingBounds;
    use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
    use grantwell_domain_research::GeographicTier;
    use uuid::Uuid;

    fn profile() -> BusinessProfile {
        BusinessProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            narrative: "fintech".into(),
            sectors: vec!["fintech".into()],
            focus_areas: vec!["lending".into()],
            revenue_band: "under_1m".into(),
            team_size: 5,
            geographic_focus: vec![],
            strategic_goals: vec!["financial_inclusion".into()],
            resource_constraints: ResourceConstraints {
                max_project_duration_months: 24,
                max_reporting_complexity: ReportingComplexity::Standard,
                max_budget_management_capacity: 200_000.0,
            },
            vector_namespace: "user_test".into(),
            embeddings_generated_at: None,
            updated_at: Utc::now(),
        }
    }

    fn candidate() -> EnrichedCandidate {
        EnrichedCandidate {
            title: "Financial Inclusion Lending Fund".into(),
            description: "Supports lenders expanding financial inclusion in underserved areas.".into(),
            source_url: Some("https://example.gov/fil".into()),
            source_name: None,
            deadline: None,
            funding: FundingBounds { min_amount: Some(20_000.0), max_amount: Some(40_000.0) },
            eligibility: None,
            tier: GeographicTier::State,
            sector_relevance: 0.8,
            geographic_relevance: 0.75,
            operational_alignment: 0.9,
            stale: false,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn scores_candidate_without_matching_rules() {
        let agent = ComplianceAgent::new();
        match agent.evaluate(candidate(), &profile(), &[]) {
            EvaluationOutcome::Scored(scored) => {
                assert!(scored.composite_score > 0.0);
                assert!(scored.score.strategic_synergy > 0.0);
            }
            EvaluationOutcome::Rejected(_) => panic!("expected scored outcome"),
        }
    }

    #[test]
    fn hard_block_rule_rejects_candidate() {
        let rule = ComplianceRule {
            id: Uuid::new_v4(),
            rule_key: "no_predatory".into(),
            description: String::new(),
            hard_block: true,
            applies_to_sectors: vec![],
            include_keywords: vec![],
            exclude_keywords: vec!["predatory".into()],
            penalty: ComplianceRule::DEFAULT_PENALTY,
            hard_reject_penalty: ComplianceRule::DEFAULT_HARD_REJECT_PENALTY,
            version: 1,
            updated_at: Utc::now(),
        };
        let mut c = candidate();
        c.description = "A predatory lending scheme disguised as a grant.".into();

        match (ComplianceAgent::new()).evaluate(c, &profile(), std::slice::from_ref(&rule)) {
            EvaluationOutcome::Rejected(rejected) => assert_eq!(rejected.rule_key, "no_predatory"),
            EvaluationOutcome::Scored(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn stale_candidate_discounted_in_composite() {
        let agent = ComplianceAgent::new();
        let mut stale_candidate = candidate();
        stale_candidate.stale = true;

        let fresh = match agent.evaluate(candidate(), &profile(), &[]) {
            EvaluationOutcome::Scored(s) => s.composite_score,
            _ => panic!("expected scored"),
        };
        let stale = match agent.evaluate(stale_candidate, &profile(), &[]) {
            EvaluationOutcome::Scored(s) => s.composite_score,
            _ => panic!("expected scored"),
        };
        assert!((stale - fresh * 0.9).abs() < 1e-9);
    }
}
