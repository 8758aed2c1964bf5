// [libs/domain/models/src/search_run.rs]
//! Search run: one execution of the discovery pipeline for a user's
//! business profile, from trigger to completion or failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Scheduled,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    /// Every chunk the research agent dispatched succeeded.
    Success,
    /// At least one chunk succeeded and at least one failed.
    Partial,
    Failed,
    Cancelled,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunError {
    AdapterTimeout,
    AdapterUnavailable,
    NoProfileEmbeddings,
    Cancelled,
    Internal,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRun {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub trigger: TriggerType,
    pub status: RunStatus,
    /// True when the run completed but one or more adapters degraded
    /// mid-run (partial results rather than a full failure).
    pub degraded: bool,
    pub grants_found: u32,
    pub grants_new: u32,
    pub error: Option<RunError>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SearchRun {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Success | RunStatus::Partial | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}
