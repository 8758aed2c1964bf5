// [libs/domain/notification/src/lib.rs]
/*!
 * NOTIFICATION CONTRACTS
 * RESPONSIBILITY: the shape of a signal sent from the scheduler or an
 * agent to a user, and the i18n key the frontend resolves it against.
 *
 * `metadata` carries structured context (grant id, deadline, run id)
 * rather than being interpolated into `message_context_key` directly,
 * so translation stays a pure frontend concern.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    Info,
    Warning,
    Critical,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub severity: NotificationSeverity,
    pub message_context_key: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl SystemNotification {
    fn new(user_id: Uuid, severity: NotificationSeverity, message_context_key: &str, metadata: Option<Value>) -> Self {
        SystemNotification {
            id: Uuid::new_v4(),
            user_id,
            severity,
            message_context_key: message_context_key.to_string(),
            metadata,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    pub fn new_grant_match(user_id: Uuid, grant_id: Uuid, composite_score: f64) -> Self {
        Self::new(
            user_id,
            NotificationSeverity::Info,
            "NOTIF_NEW_GRANT_MATCH",
            Some(serde_json::json!({ "grant_id": grant_id, "composite_score": composite_score })),
        )
    }

    pub fn deadline_reminder(user_id: Uuid, grant_id: Uuid, deadline: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            NotificationSeverity::Warning,
            "NOTIF_DEADLINE_APPROACHING",
            Some(serde_json::json!({ "grant_id": grant_id, "deadline": deadline })),
        )
    }

    pub fn search_run_failed(user_id: Uuid, search_run_id: Uuid, reason: &str) -> Self {
        Self::new(
            user_id,
            NotificationSeverity::Critical,
            "NOTIF_SEARCH_RUN_FAILED",
            Some(serde_json::json!({ "search_run_id": search_run_id, "reason": reason })),
        )
    }

    pub fn search_run_degraded(user_id: Uuid, search_run_id: Uuid, unavailable_adapters: &[String]) -> Self {
        Self::new(
            user_id,
            NotificationSeverity::Warning,
            "NOTIF_SEARCH_RUN_DEGRADED",
            Some(serde_json::json!({ "search_run_id": search_run_id, "unavailable_adapters": unavailable_adapters })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grant_match_starts_unread() {
        let n = SystemNotification::new_grant_match(Uuid::new_v4(), Uuid::new_v4(), 0.82);
        assert!(!n.is_read);
        assert_eq!(n.severity, NotificationSeverity::Info);
    }

    #[test]
    fn search_run_failed_is_critical() {
        let n = SystemNotification::search_run_failed(Uuid::new_v4(), Uuid::new_v4(), "adapter timeout");
        assert_eq!(n.severity, NotificationSeverity::Critical);
    }
}
