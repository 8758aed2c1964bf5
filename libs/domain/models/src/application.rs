// [libs/domain/models/src/application.rs]
//! Application tracking: the user's declared pursuit of a grant, and
//! the narrative draft the RAG generator produced for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Considering,
    Drafting,
    Submitted,
    Awarded,
    Rejected,
    Withdrawn,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub grant_id: Uuid,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a generated draft, separate from `ApplicationStatus`:
/// this tracks the document itself (has it been edited since generation,
/// has it been sent) rather than the user's pursuit of the grant.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedApplicationStatus {
    Draft,
    Generated,
    Edited,
    Submitted,
    Awarded,
    Rejected,
}

/// The six-section generated narrative draft for a given application.
/// A section left `None` means its generation step failed or was
/// skipped; the document is still returned to the caller rather than
/// discarded wholesale on partial failure.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedApplication {
    pub id: Uuid,
    pub application_id: Uuid,
    pub status: GeneratedApplicationStatus,
    pub executive_summary: Option<String>,
    pub needs_statement: Option<String>,
    pub project_description: Option<String>,
    pub budget_narrative: Option<String>,
    pub organizational_capacity: Option<String>,
    pub impact_statement: Option<String>,
    pub sections_failed: Vec<String>,
    pub tokens_used: u32,
    pub generation_duration_ms: u64,
    pub model_identifier: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedApplication {
    pub fn is_complete(&self) -> bool {
        self.sections_failed.is_empty()
    }
}
