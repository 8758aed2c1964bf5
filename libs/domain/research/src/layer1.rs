// [libs/domain/research/src/layer1.rs]
//! Layer-1 scores: the three sub-scores the research agent can compute
//! from a candidate and the profile alone, before any compliance-rule
//! evaluation happens in C6.

use grantwell_domain_models::config::SectorConfig;
use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};

use crate::plan::GeographicTier;

/// Weighted keyword match between a candidate's searchable text and a
/// sector's keyword list, with a smaller bonus for matching any of the
/// sector's related (sub-)sectors as a tie-break.
pub fn sector_relevance(searchable_text: &str, sector: &SectorConfig) -> f64 {
    let haystack = searchable_text.to_lowercase();
    if sector.keywords.is_empty() {
        return 0.0;
    }

    let primary_hits = sector.keywords.iter().filter(|kw| haystack.contains(&kw.to_lowercase())).count();
    let primary_score = primary_hits as f64 / sector.keywords.len() as f64;

    let related_bonus = if sector.related_sectors.iter().any(|s| haystack.contains(&s.to_lowercase())) {
        0.1
    } else {
        0.0
    };

    (primary_score + related_bonus).clamp(0.0, 1.0)
}

/// Best sector match across the configured taxonomy; a candidate is
/// scored against every sector the profile declared interest in and
/// the highest match wins.
pub fn best_sector_relevance(searchable_text: &str, sectors: &[SectorConfig]) -> f64 {
    sectors.iter().map(|s| sector_relevance(searchable_text, s)).fold(0.0_f64, f64::max)
}

/// Geographic relevance is simply the tier's priority weight; the tier
/// itself was already chosen by the chunk the candidate came from.
pub fn geographic_relevance(tier: GeographicTier) -> f64 {
    tier.relevance_weight()
}

/// Rough estimate of the grant's resource footprint from the amount
/// mentioned and any reporting-complexity language in its description,
/// then a linear penalty when either exceeds the profile's stated
/// constraints.
pub fn operational_alignment(
    estimated_funding_midpoint: Option<f64>,
    reporting_hint: ReportingComplexity,
    constraints: &ResourceConstraints,
) -> f64 {
    let budget_score = match estimated_funding_midpoint {
        None => 1.0,
        Some(amount) if amount <= constraints.max_budget_management_capacity => 1.0,
        Some(amount) => {
            let overshoot = (amount - constraints.max_budget_management_capacity) / constraints.max_budget_management_capacity.max(1.0);
            (1.0 - overshoot).clamp(0.0, 1.0)
        }
    };

    let reporting_score = if reporting_hint <= constraints.max_reporting_complexity { 1.0 } else { 0.5 };

    (budget_score * 0.7 + reporting_score * 0.3).clamp(0.0, 1.0)
}

/// Infers a reporting-complexity hint from free-text mentions in a
/// candidate's description; defaults to `Standard` absent any signal.
pub fn infer_reporting_complexity(description: &str) -> ReportingComplexity {
    let text = description.to_lowercase();
    if text.contains("quarterly report") || text.contains("site visit") || text.contains("audited financial") {
        ReportingComplexity::Heavy
    } else if text.contains("annual report") || text.contains("progress report") {
        ReportingComplexity::Standard
    } else {
        ReportingComplexity::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sector(keywords: &[&str], related: &[&str]) -> SectorConfig {
        SectorConfig {
            id: Uuid::new_v4(),
            sector_key: "fintech".into(),
            display_name: "Fintech".into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            related_sectors: related.iter().map(|s| s.to_string()).collect(),
            version: 1,
            updated_at: Utc::now(),
        }
    }

    fn constraints() -> ResourceConstraints {
        ResourceConstraints {
            max_project_duration_months: 12,
            max_reporting_complexity: ReportingComplexity::Standard,
            max_budget_management_capacity: 100_000.0,
        }
    }

    #[test]
    fn sector_relevance_scales_with_keyword_hits() {
        let s = sector(&["blockchain", "payments", "lending"], &[]);
        let full = sector_relevance("a blockchain payments and lending platform", &s);
        let partial = sector_relevance("a blockchain platform", &s);
        assert!(full > partial);
        assert!((full - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sector_relevance_zero_for_no_keywords_configured() {
        let s = sector(&[], &[]);
        assert_eq!(sector_relevance("anything", &s), 0.0);
    }

    #[test]
    fn related_sector_match_adds_tie_break_bonus() {
        let s = sector(&["blockchain"], &["crypto"]);
        let with_related = sector_relevance("a crypto and blockchain startup", &s);
        let without_related = sector_relevance("a blockchain startup", &s);
        assert!(with_related > without_related);
    }

    #[test]
    fn geographic_relevance_matches_tier_weight() {
        assert_eq!(geographic_relevance(GeographicTier::Local), 1.0);
        assert_eq!(geographic_relevance(GeographicTier::Federal), 0.25);
    }

    #[test]
    fn operational_alignment_penalizes_overshoot() {
        let within = operational_alignment(Some(50_000.0), ReportingComplexity::Standard, &constraints());
        let over = operational_alignment(Some(500_000.0), ReportingComplexity::Standard, &constraints());
        assert_eq!(within, 1.0);
        assert!(over < within);
    }

    #[test]
    fn operational_alignment_unknown_funding_is_neutral_on_budget() {
        let score = operational_alignment(None, ReportingComplexity::Standard, &constraints());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn infers_heavy_reporting_from_site_visit_mention() {
        assert_eq!(infer_reporting_complexity("Requires quarterly reports and an annual site visit."), ReportingComplexity::Heavy);
        assert_eq!(infer_reporting_complexity("No special reporting requirements."), ReportingComplexity::Light);
    }
}
