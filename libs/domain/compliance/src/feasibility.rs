// [libs/domain/compliance/src/feasibility.rs]
//! Feasibility: how well a grant's implied requirements fit inside the
//! profile's stated resource constraints. Linear penalty proportional
//! to overshoot on each dimension, floor at zero.

use grantwell_domain_models::grant::FundingBounds;
use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
use std::sync::OnceLock;

use regex::Regex;

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)[\s-]*(month|year)s?").unwrap())
}

/// Extracts a project-duration estimate in months from free text, e.g.
/// "a 12-month project" or "over 2 years". Returns `None` absent any
/// duration language, treated as no constraint pressure.
pub fn infer_project_duration_months(text: &str) -> Option<u32> {
    let caps = duration_regex().captures(text)?;
    let value: u32 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();
    Some(if unit == "year" { value * 12 } else { value })
}

/// Linear penalty proportional to how far a requirement overshoots its
/// constraint; 1.0 when fully within bounds, clamped to never go
/// negative regardless of how large the overshoot is.
fn overshoot_penalty(actual: f64, limit: f64) -> f64 {
    if limit <= 0.0 || actual <= limit {
        return 1.0;
    }
    (1.0 - (actual - limit) / limit).clamp(0.0, 1.0)
}

pub fn feasibility(description: &str, funding: FundingBounds, reporting_hint: ReportingComplexity, constraints: &ResourceConstraints) -> f64 {
    let budget_component = match funding.midpoint() {
        Some(amount) => overshoot_penalty(amount, constraints.max_budget_management_capacity),
        None => 1.0,
    };

    let reporting_component = if reporting_hint <= constraints.max_reporting_complexity { 1.0 } else { 0.6 };

    let duration_component = match infer_project_duration_months(description) {
        Some(months) => overshoot_penalty(months as f64, constraints.max_project_duration_months as f64),
        None => 1.0,
    };

    ((budget_component + reporting_component + duration_component) / 3.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> ResourceConstraints {
        ResourceConstraints {
            max_project_duration_months: 12,
            max_reporting_complexity: ReportingComplexity::Standard,
            max_budget_management_capacity: 100_000.0,
        }
    }

    #[test]
    fn fully_within_bounds_scores_one() {
        let funding = FundingBounds { min_amount: Some(10_000.0), max_amount: Some(20_000.0) };
        let score = feasibility("a 6-month pilot project", funding, ReportingComplexity::Light, &constraints());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn budget_overshoot_reduces_score() {
        let funding = FundingBounds { min_amount: Some(500_000.0), max_amount: Some(500_000.0) };
        let score = feasibility("a 6-month pilot project", funding, ReportingComplexity::Light, &constraints());
        assert!(score < 1.0);
    }

    #[test]
    fn duration_overshoot_reduces_score() {
        let funding = FundingBounds { min_amount: None, max_amount: None };
        let score = feasibility("a 36-month multi-year project", funding, ReportingComplexity::Light, &constraints());
        assert!(score < 1.0);
    }

    #[test]
    fn heavy_reporting_above_tolerance_reduces_score() {
        let funding = FundingBounds { min_amount: None, max_amount: None };
        let score = feasibility("requires quarterly reports", funding, ReportingComplexity::Heavy, &constraints());
        assert!(score < 1.0);
    }

    #[test]
    fn duration_parses_years_into_months() {
        assert_eq!(infer_project_duration_months("a 2 year program"), Some(24));
        assert_eq!(infer_project_duration_months("no duration mentioned"), None);
    }
}
