// [libs/domain/models/src/analysis.rs]
//! Analysis: the per-grant, per-user scoring verdict produced by the
//! compliance agent after the research agent's sub-scores are available.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

use crate::grant::ScoreVector;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub grant_id: Uuid,
    pub user_id: Uuid,
    pub search_run_id: Uuid,
    pub score: ScoreVector,
    pub composite_score: f64,
    pub rationale: String,
    /// Populated only when a compliance rule hard-blocked the grant;
    /// `composite_score` is forced to 0.0 in that case.
    pub blocked_by_rule: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn is_blocked(&self) -> bool {
        self.blocked_by_rule.is_some()
    }
}
