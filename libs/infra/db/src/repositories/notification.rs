// [libs/infra/db/src/repositories/notification.rs]
//! Persistence for dispatched notifications; the dispatcher writes one
//! row per signal, the API reads them back paginated by recency.

use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_notification::{NotificationSeverity, SystemNotification};

use crate::errors::DbError;
use crate::repositories::json_columns::parse_timestamp;

mod queries {
    pub const INSERT: &str = "INSERT INTO system_notifications (id, user_id, severity, message_context_key, metadata, created_at, is_read) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)";
    pub const LIST_FOR_USER: &str = "SELECT id, user_id, severity, message_context_key, metadata, created_at, is_read FROM system_notifications WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2";
    pub const MARK_READ: &str = "UPDATE system_notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2";
}

pub struct NotificationRepository {
    connection: Connection,
}

impl NotificationRepository {
    pub fn new(connection: Connection) -> Self {
        NotificationRepository { connection }
    }

    pub async fn insert(&self, notification: &SystemNotification) -> Result<(), DbError> {
        self.connection
            .execute(
                queries::INSERT,
                params![
                    notification.id.to_string(),
                    notification.user_id.to_string(),
                    severity_str(notification.severity),
                    notification.message_context_key.clone(),
                    notification.metadata.as_ref().map(|v| v.to_string()),
                    notification.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: u32) -> Result<Vec<SystemNotification>, DbError> {
        let mut rows = self.connection.query(queries::LIST_FOR_USER, params![user_id.to_string(), limit as i64]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_notification(row)?);
        }
        Ok(out)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, DbError> {
        let affected = self.connection.execute(queries::MARK_READ, params![id.to_string(), user_id.to_string()]).await?;
        Ok(affected > 0)
    }
}

fn severity_str(severity: NotificationSeverity) -> &'static str {
    match severity {
        NotificationSeverity::Info => "info",
        NotificationSeverity::Warning => "warning",
        NotificationSeverity::Critical => "critical",
    }
}

fn row_to_notification(row: libsql::Row) -> Result<SystemNotification, DbError> {
    let severity = match row.get::<String>(2)?.as_str() {
        "info" => NotificationSeverity::Info,
        "warning" => NotificationSeverity::Warning,
        "critical" => NotificationSeverity::Critical,
        other => return Err(DbError::Mapping(format!("unknown notification severity: {other}"))),
    };
    let metadata_raw: Option<String> = row.get(4)?;
    let metadata = metadata_raw.map(|raw| serde_json::from_str(&raw)).transpose().map_err(|e| DbError::Mapping(e.to_string()))?;

    Ok(SystemNotification {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        user_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        severity,
        message_context_key: row.get(3)?,
        metadata,
        created_at: parse_timestamp(&row.get::<String>(5)?)?,
        is_read: row.get::<i64>(6)? != 0,
    })
}
