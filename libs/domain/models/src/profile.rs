// [libs/domain/models/src/profile.rs]
//! Business profile: the narrative and structured attributes the research
//! and compliance agents match candidate grants against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Narrative is bounded to 2000 characters; callers validate at the HTTP
/// boundary and return `VALIDATION` rather than silently truncating.
pub const NARRATIVE_MAX_CHARS: usize = 2000;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub narrative: String,
    pub sectors: Vec<String>,
    pub focus_areas: Vec<String>,
    pub revenue_band: String,
    pub team_size: u32,
    pub geographic_focus: Vec<String>,
    pub strategic_goals: Vec<String>,
    pub resource_constraints: ResourceConstraints,
    /// `user_<id>` once embeddings exist; invariant checked alongside
    /// `embeddings_generated_at` rather than stored redundantly.
    pub vector_namespace: String,
    pub embeddings_generated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessProfile {
    pub fn namespace_for(user_id: Uuid) -> String {
        format!("user_{user_id}")
    }

    /// Invariant from spec §3: if embeddings exist, the namespace must be
    /// populated and non-empty; this is the pure-function half of that
    /// check, the vector-count half lives where the vector index is queried.
    pub fn embeddings_invariant_holds(&self) -> bool {
        self.embeddings_generated_at.is_none() || !self.vector_namespace.is_empty()
    }
}

/// Resource limits used by the Research Agent's operational-alignment
/// score and the Compliance Agent's feasibility score.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConstraints {
    pub max_project_duration_months: u32,
    pub max_reporting_complexity: ReportingComplexity,
    pub max_budget_management_capacity: f64,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReportingComplexity {
    Light,
    Standard,
    Heavy,
}
