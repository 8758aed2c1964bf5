// [libs/infra/db/src/repositories/application.rs]
//! Application tracking and the generated narrative draft attached to it.

use chrono::Utc;
use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_models::{ApplicationHistory, ApplicationStatus, GeneratedApplication, GeneratedApplicationStatus};

use crate::errors::DbError;
use crate::repositories::json_columns::{parse_timestamp, to_json};

mod queries {
    pub const INSERT_HISTORY: &str = "INSERT INTO application_history (id, user_id, grant_id, status, notes, created_at, updated_at) VALUES (?1, ?2, ?3, 'considering', NULL, ?4, ?4)";
    pub const FIND_HISTORY_BY_ID: &str = "SELECT id, user_id, grant_id, status, notes, created_at, updated_at FROM application_history WHERE id = ?1";
    pub const LIST_HISTORY_FOR_USER: &str = "SELECT id, user_id, grant_id, status, notes, created_at, updated_at FROM application_history WHERE user_id = ?1 ORDER BY updated_at DESC";
    pub const UPDATE_STATUS: &str = "UPDATE application_history SET status = ?2, notes = ?3, updated_at = ?4 WHERE id = ?1";

    pub const INSERT_GENERATED: &str = r#"
        INSERT INTO generated_applications (
            id, application_id, status, executive_summary, needs_statement, project_description,
            budget_narrative, organizational_capacity, impact_statement, sections_failed,
            tokens_used, generation_duration_ms, model_identifier, generated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    "#;
    pub const FIND_GENERATED_BY_APPLICATION: &str = r#"
        SELECT id, application_id, status, executive_summary, needs_statement, project_description,
               budget_narrative, organizational_capacity, impact_statement, sections_failed,
               tokens_used, generation_duration_ms, model_identifier, generated_at
        FROM generated_applications WHERE application_id = ?1 ORDER BY generated_at DESC LIMIT 1
    "#;
}

pub struct ApplicationRepository {
    connection: Connection,
}

impl ApplicationRepository {
    pub fn new(connection: Connection) -> Self {
        ApplicationRepository { connection }
    }

    pub async fn create(&self, user_id: Uuid, grant_id: Uuid) -> Result<ApplicationHistory, DbError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.connection
            .execute(queries::INSERT_HISTORY, params![id.to_string(), user_id.to_string(), grant_id.to_string(), now.to_rfc3339()])
            .await?;
        Ok(ApplicationHistory { id, user_id, grant_id, status: ApplicationStatus::Considering, notes: None, created_at: now, updated_at: now })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicationHistory>, DbError> {
        let mut rows = self.connection.query(queries::FIND_HISTORY_BY_ID, params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_history(row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApplicationHistory>, DbError> {
        let mut rows = self.connection.query(queries::LIST_HISTORY_FOR_USER, params![user_id.to_string()]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_history(row)?);
        }
        Ok(out)
    }

    pub async fn update_status(&self, id: Uuid, status: ApplicationStatus, notes: Option<String>) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(queries::UPDATE_STATUS, params![id.to_string(), status_str(status), notes, now.to_rfc3339()])
            .await?;
        Ok(())
    }

    /// Persists whatever sections the generator produced, even on
    /// partial failure; `sections_failed` names which sections are
    /// `None` so a caller doesn't have to infer it from nullness alone.
    pub async fn save_generated(&self, application_id: Uuid, draft: GeneratedApplication) -> Result<GeneratedApplication, DbError> {
        self.connection
            .execute(
                queries::INSERT_GENERATED,
                params![
                    draft.id.to_string(),
                    application_id.to_string(),
                    generated_status_str(draft.status),
                    draft.executive_summary.clone(),
                    draft.needs_statement.clone(),
                    draft.project_description.clone(),
                    draft.budget_narrative.clone(),
                    draft.organizational_capacity.clone(),
                    draft.impact_statement.clone(),
                    to_json(&draft.sections_failed)?,
                    draft.tokens_used,
                    draft.generation_duration_ms as i64,
                    draft.model_identifier.clone(),
                    draft.generated_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(draft)
    }

    pub async fn find_latest_generated(&self, application_id: Uuid) -> Result<Option<GeneratedApplication>, DbError> {
        let mut rows = self.connection.query(queries::FIND_GENERATED_BY_APPLICATION, params![application_id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_generated(row)?)),
            None => Ok(None),
        }
    }
}

fn status_str(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Considering => "considering",
        ApplicationStatus::Drafting => "drafting",
        ApplicationStatus::Submitted => "submitted",
        ApplicationStatus::Awarded => "awarded",
        ApplicationStatus::Rejected => "rejected",
        ApplicationStatus::Withdrawn => "withdrawn",
    }
}

fn row_to_history(row: libsql::Row) -> Result<ApplicationHistory, DbError> {
    let status = match row.get::<String>(3)?.as_str() {
        "considering" => ApplicationStatus::Considering,
        "drafting" => ApplicationStatus::Drafting,
        "submitted" => ApplicationStatus::Submitted,
        "awarded" => ApplicationStatus::Awarded,
        "rejected" => ApplicationStatus::Rejected,
        "withdrawn" => ApplicationStatus::Withdrawn,
        other => return Err(DbError::Mapping(format!("unknown application status: {other}"))),
    };
    Ok(ApplicationHistory {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        user_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        grant_id: Uuid::parse_str(&row.get::<String>(2)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        status,
        notes: row.get(4)?,
        created_at: parse_timestamp(&row.get::<String>(5)?)?,
        updated_at: parse_timestamp(&row.get::<String>(6)?)?,
    })
}

fn generated_status_str(status: GeneratedApplicationStatus) -> &'static str {
    match status {
        GeneratedApplicationStatus::Draft => "draft",
        GeneratedApplicationStatus::Generated => "generated",
        GeneratedApplicationStatus::Edited => "edited",
        GeneratedApplicationStatus::Submitted => "submitted",
        GeneratedApplicationStatus::Awarded => "awarded",
        GeneratedApplicationStatus::Rejected => "rejected",
    }
}

fn row_to_generated(row: libsql::Row) -> Result<GeneratedApplication, DbError> {
    let status = match row.get::<String>(2)?.as_str() {
        "draft" => GeneratedApplicationStatus::Draft,
        "generated" => GeneratedApplicationStatus::Generated,
        "edited" => GeneratedApplicationStatus::Edited,
        "submitted" => GeneratedApplicationStatus::Submitted,
        "awarded" => GeneratedApplicationStatus::Awarded,
        "rejected" => GeneratedApplicationStatus::Rejected,
        other => return Err(DbError::Mapping(format!("unknown generated application status: {other}"))),
    };
    Ok(GeneratedApplication {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        application_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        status,
        executive_summary: row.get(3)?,
        needs_statement: row.get(4)?,
        project_description: row.get(5)?,
        budget_narrative: row.get(6)?,
        organizational_capacity: row.get(7)?,
        impact_statement: row.get(8)?,
        sections_failed: crate::repositories::json_columns::from_json(&row.get::<String>(9)?)?,
        tokens_used: row.get::<i64>(10)? as u32,
        generation_duration_ms: row.get::<i64>(11)? as u64,
        model_identifier: row.get(12)?,
        generated_at: parse_timestamp(&row.get::<String>(13)?)?,
    })
}
