// [libs/domain/research/src/plan.rs]
//! Search-plan construction: the Cartesian product of a profile's focus
//! areas and the four geographic tiers the agent queries at, capped at
//! 16 chunks so one run never fans out into an unbounded LLM bill.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Maximum focus areas considered per run; combined with the four
/// geographic tiers this is also the hard cap on chunk count (4x4=16).
pub const MAX_FOCUS_AREAS_PER_PLAN: usize = 4;
pub const MAX_CHUNKS_PER_PLAN: usize = 16;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeographicTier {
    Local,
    State,
    Regional,
    Federal,
}

impl GeographicTier {
    pub const ALL: [GeographicTier; 4] = [
        GeographicTier::Local,
        GeographicTier::State,
        GeographicTier::Regional,
        GeographicTier::Federal,
    ];

    /// Priority weight used directly as the geographic Layer-1 score:
    /// local-first funding is assumed easiest for a small business to
    /// win and administer.
    pub fn relevance_weight(self) -> f64 {
        match self {
            GeographicTier::Local => 1.0,
            GeographicTier::State => 0.75,
            GeographicTier::Regional => 0.5,
            GeographicTier::Federal => 0.25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeographicTier::Local => "local",
            GeographicTier::State => "state",
            GeographicTier::Regional => "regional",
            GeographicTier::Federal => "federal",
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub focus_area: String,
    pub tier: GeographicTier,
}

/// Builds the deterministic chunk list for a run. Focus areas beyond
/// `MAX_FOCUS_AREAS_PER_PLAN` are dropped, in list order, so the plan
/// never exceeds the 16-chunk cap; callers that want different focus
/// areas covered should split across runs rather than widen the cap.
pub fn build_search_plan(focus_areas: &[String]) -> Vec<ChunkSpec> {
    let mut plan = Vec::new();
    for focus_area in focus_areas.iter().take(MAX_FOCUS_AREAS_PER_PLAN) {
        for tier in GeographicTier::ALL {
            plan.push(ChunkSpec { focus_area: focus_area.clone(), tier });
            if plan.len() == MAX_CHUNKS_PER_PLAN {
                return plan;
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_focus_areas_yield_sixteen_chunks() {
        let areas = vec!["fintech".to_string(), "clean_energy".to_string(), "health".to_string(), "ag_tech".to_string()];
        assert_eq!(build_search_plan(&areas).len(), 16);
    }

    #[test]
    fn extra_focus_areas_are_dropped_not_overflowed() {
        let areas: Vec<String> = (0..10).map(|i| format!("sector_{i}")).collect();
        let plan = build_search_plan(&areas);
        assert_eq!(plan.len(), 16);
        assert!(plan.iter().all(|c| c.focus_area != "sector_9"));
    }

    #[test]
    fn single_focus_area_yields_four_chunks_one_per_tier() {
        let plan = build_search_plan(&["fintech".to_string()]);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].tier, GeographicTier::Local);
        assert_eq!(plan[3].tier, GeographicTier::Federal);
    }

    #[test]
    fn relevance_weights_rank_local_over_federal() {
        assert!(GeographicTier::Local.relevance_weight() > GeographicTier::State.relevance_weight());
        assert!(GeographicTier::State.relevance_weight() > GeographicTier::Regional.relevance_weight());
        assert!(GeographicTier::Regional.relevance_weight() > GeographicTier::Federal.relevance_weight());
    }
}
