// [libs/infra/db/src/repositories/search_run.rs]
//! Search run lifecycle: create, transition, and record outcome.

use chrono::Utc;
use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_models::{RunError, RunStatus, SearchRun, TriggerType};

use crate::errors::DbError;
use crate::repositories::json_columns::{parse_optional_timestamp, parse_timestamp, to_json};

mod queries {
    pub const INSERT: &str = "INSERT INTO search_runs (id, user_id, profile_id, trigger, status, degraded, grants_found, grants_new, error, error_details, started_at, completed_at) VALUES (?1, ?2, ?3, ?4, 'running', 0, 0, 0, NULL, '[]', ?5, NULL)";
    pub const FIND_BY_ID: &str = "SELECT id, user_id, profile_id, trigger, status, degraded, grants_found, grants_new, error, started_at, completed_at FROM search_runs WHERE id = ?1";
    pub const COMPLETE: &str = "UPDATE search_runs SET status = ?2, degraded = ?3, grants_found = ?4, grants_new = ?5, error = ?6, error_details = ?7, completed_at = ?8 WHERE id = ?1";
    pub const CANCEL_IF_RUNNING: &str = "UPDATE search_runs SET status = 'cancelled', completed_at = ?2 WHERE id = ?1 AND status = 'running'";
}

pub struct SearchRunRepository {
    connection: Connection,
}

impl SearchRunRepository {
    pub fn new(connection: Connection) -> Self {
        SearchRunRepository { connection }
    }

    pub async fn create(&self, user_id: Uuid, profile_id: Uuid, trigger: TriggerType) -> Result<SearchRun, DbError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.connection
            .execute(
                queries::INSERT,
                params![id.to_string(), user_id.to_string(), profile_id.to_string(), trigger_str(trigger), now.to_rfc3339()],
            )
            .await?;
        Ok(SearchRun {
            id,
            user_id,
            profile_id,
            trigger,
            status: RunStatus::Running,
            degraded: false,
            grants_found: 0,
            grants_new: 0,
            error: None,
            started_at: now,
            completed_at: None,
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SearchRun>, DbError> {
        let mut rows = self.connection.query(queries::FIND_BY_ID, params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_search_run(row)?)),
            None => Ok(None),
        }
    }

    pub async fn complete(
        &self,
        id: Uuid,
        status: RunStatus,
        degraded: bool,
        grants_found: u32,
        grants_new: u32,
        error: Option<RunError>,
        error_details: &[String],
    ) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(
                queries::COMPLETE,
                params![
                    id.to_string(),
                    status_str(status),
                    degraded as i64,
                    grants_found as i64,
                    grants_new as i64,
                    error.map(|e| error_str(e).to_string()),
                    to_json(error_details)?,
                    now.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Used by the scheduler's soft-timeout path: only transitions a
    /// run that is still `running`, so a run that already completed
    /// between the timeout check and this call isn't clobbered.
    pub async fn cancel_if_running(&self, id: Uuid) -> Result<bool, DbError> {
        let now = Utc::now();
        let affected = self.connection.execute(queries::CANCEL_IF_RUNNING, params![id.to_string(), now.to_rfc3339()]).await?;
        Ok(affected > 0)
    }
}

fn trigger_str(trigger: TriggerType) -> &'static str {
    match trigger {
        TriggerType::Manual => "manual",
        TriggerType::Scheduled => "scheduled",
    }
}

fn status_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Queued => "queued",
        RunStatus::Running => "running",
        RunStatus::Success => "success",
        RunStatus::Partial => "partial",
        RunStatus::Failed => "failed",
        RunStatus::Cancelled => "cancelled",
    }
}

fn error_str(error: RunError) -> &'static str {
    match error {
        RunError::AdapterTimeout => "ADAPTER_TIMEOUT",
        RunError::AdapterUnavailable => "ADAPTER_UNAVAILABLE",
        RunError::NoProfileEmbeddings => "NO_PROFILE_EMBEDDINGS",
        RunError::Cancelled => "CANCELLED",
        RunError::Internal => "INTERNAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GrantStoreClient;

    async fn repo() -> (GrantStoreClient, SearchRunRepository) {
        let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
        let connection = client.connection().expect("connection");
        (client, SearchRunRepository::new(connection))
    }

    #[tokio::test]
    async fn completed_run_has_end_ts_at_or_after_start_ts() {
        let (_client, repo) = repo().await;
        let run = repo.create(Uuid::new_v4(), Uuid::new_v4(), TriggerType::Manual).await.expect("create");

        repo.complete(run.id, RunStatus::Success, false, 13, 13, None, &[]).await.expect("complete");

        let reloaded = repo.find_by_id(run.id).await.expect("find").expect("present");
        let completed_at = reloaded.completed_at.expect("completed run has an end timestamp");
        assert!(completed_at >= reloaded.started_at);
    }

    #[tokio::test]
    async fn cancel_if_running_is_a_noop_once_already_terminal() {
        let (_client, repo) = repo().await;
        let run = repo.create(Uuid::new_v4(), Uuid::new_v4(), TriggerType::Scheduled).await.expect("create");
        repo.complete(run.id, RunStatus::Failed, false, 0, 0, Some(RunError::Internal), &["boom".to_string()]).await.expect("complete");

        assert!(!repo.cancel_if_running(run.id).await.expect("cancel"));
    }
}

fn row_to_search_run(row: libsql::Row) -> Result<SearchRun, DbError> {
    let trigger = match row.get::<String>(3)?.as_str() {
        "manual" => TriggerType::Manual,
        "scheduled" => TriggerType::Scheduled,
        other => return Err(DbError::Mapping(format!("unknown trigger type: {other}"))),
    };
    let status = match row.get::<String>(4)?.as_str() {
        "queued" => RunStatus::Queued,
        "running" => RunStatus::Running,
        "success" => RunStatus::Success,
        "partial" => RunStatus::Partial,
        "failed" => RunStatus::Failed,
        "cancelled" => RunStatus::Cancelled,
        other => return Err(DbError::Mapping(format!("unknown run status: {other}"))),
    };
    let error: Option<String> = row.get(8)?;
    let error = error
        .map(|raw| match raw.as_str() {
            "ADAPTER_TIMEOUT" => Ok(RunError::AdapterTimeout),
            "ADAPTER_UNAVAILABLE" => Ok(RunError::AdapterUnavailable),
            "NO_PROFILE_EMBEDDINGS" => Ok(RunError::NoProfileEmbeddings),
            "CANCELLED" => Ok(RunError::Cancelled),
            "INTERNAL" => Ok(RunError::Internal),
            other => Err(DbError::Mapping(format!("unknown run error: {other}"))),
        })
        .transpose()?;

    Ok(SearchRun {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        user_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        profile_id: Uuid::parse_str(&row.get::<String>(2)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        trigger,
        status,
        degraded: row.get::<i64>(5)? != 0,
        grants_found: row.get::<i64>(6)? as u32,
        grants_new: row.get::<i64>(7)? as u32,
        error,
        started_at: parse_timestamp(&row.get::<String>(9)?)?,
        completed_at: parse_optional_timestamp(row.get::<Option<String>>(10)?)?,
    })
}
