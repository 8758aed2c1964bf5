// [libs/core/scoring/src/composite.rs]
//! The composite-score formula: a fixed-weight linear combination of
//! the six sub-scores, discounted when the grant's data is stale.

use grantwell_domain_models::ScoreVector;

/// Implementation constants for the weighted sum. Not configurable at
/// runtime: changing these is a scoring-model change that needs its
/// own migration plan, not a config flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeWeights {
    pub sector: f64,
    pub geographic: f64,
    pub operational: f64,
    pub business_logic: f64,
    pub feasibility: f64,
    pub strategic: f64,
}

impl CompositeWeights {
    pub const DEFAULT: CompositeWeights = CompositeWeights {
        sector: 0.20,
        geographic: 0.10,
        operational: 0.20,
        business_logic: 0.20,
        feasibility: 0.15,
        strategic: 0.15,
    };
}

/// A grant is considered stale once its source data has not been
/// re-verified in a refresh sweep; a stale match still surfaces but
/// is discounted by 10% relative to a freshly-retrieved one.
pub const STALE_DISCOUNT: f64 = 0.9;

pub fn composite_score(score: ScoreVector, weights: CompositeWeights, stale: bool) -> f64 {
    let raw = weights.sector * score.sector_relevance
        + weights.geographic * score.geographic_relevance
        + weights.operational * score.operational_alignment
        + weights.business_logic * score.business_logic_alignment
        + weights.feasibility * score.feasibility
        + weights.strategic * score.strategic_synergy;

    if stale {
        raw * STALE_DISCOUNT
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perfect_score() -> ScoreVector {
        ScoreVector {
            sector_relevance: 1.0,
            geographic_relevance: 1.0,
            operational_alignment: 1.0,
            business_logic_alignment: 1.0,
            feasibility: 1.0,
            strategic_synergy: 1.0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let w = CompositeWeights::DEFAULT;
        let sum = w.sector + w.geographic + w.operational + w.business_logic + w.feasibility + w.strategic;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perfect_inputs_yield_one() {
        let score = composite_score(perfect_score(), CompositeWeights::DEFAULT, false);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_inputs_yield_zero() {
        let score = composite_score(ScoreVector::ZERO, CompositeWeights::DEFAULT, false);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn stale_grant_discounted_by_ten_percent() {
        let fresh = composite_score(perfect_score(), CompositeWeights::DEFAULT, false);
        let stale = composite_score(perfect_score(), CompositeWeights::DEFAULT, true);
        assert!((stale - fresh * 0.9).abs() < 1e-9);
    }

    #[test]
    fn is_pure_function_of_its_inputs() {
        let score = ScoreVector {
            sector_relevance: 0.4,
            geographic_relevance: 0.6,
            operational_alignment: 0.9,
            business_logic_alignment: 0.2,
            feasibility: 0.7,
            strategic_synergy: 0.5,
        };
        let a = composite_score(score, CompositeWeights::DEFAULT, false);
        let b = composite_score(score, CompositeWeights::DEFAULT, false);
        assert_eq!(a, b);
    }
}
