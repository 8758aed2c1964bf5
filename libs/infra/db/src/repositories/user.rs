// [libs/infra/db/src/repositories/user.rs]
//! User lookups and quota counter mutation.

use chrono::Utc;
use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_models::{SubscriptionTier, User};

use crate::errors::DbError;
use crate::repositories::json_columns::{parse_optional_timestamp, parse_timestamp};

mod queries {
    pub const FIND_BY_SUBJECT: &str = "SELECT id, external_subject, subscription_tier, searches_used, applications_used, billing_period_started_at, deactivated_at, created_at FROM users WHERE external_subject = ?1";
    pub const FIND_BY_ID: &str = "SELECT id, external_subject, subscription_tier, searches_used, applications_used, billing_period_started_at, deactivated_at, created_at FROM users WHERE id = ?1";
    pub const INSERT: &str = "INSERT INTO users (id, external_subject, subscription_tier, searches_used, applications_used, billing_period_started_at, deactivated_at, created_at) VALUES (?1, ?2, ?3, 0, 0, ?4, NULL, ?4)";
    pub const INCREMENT_SEARCHES: &str = "UPDATE users SET searches_used = searches_used + 1 WHERE id = ?1 AND searches_used < (SELECT CASE subscription_tier WHEN 'free' THEN 5 WHEN 'standard' THEN 50 ELSE 500 END)";
    pub const INCREMENT_APPLICATIONS: &str = "UPDATE users SET applications_used = applications_used + 1 WHERE id = ?1 AND applications_used < (SELECT CASE subscription_tier WHEN 'free' THEN 1 WHEN 'standard' THEN 10 ELSE 100 END)";
    pub const RESET_BILLING_PERIOD: &str = "UPDATE users SET searches_used = 0, applications_used = 0, billing_period_started_at = ?2 WHERE id = ?1";
    pub const LIST_ACTIVE: &str = "SELECT id, external_subject, subscription_tier, searches_used, applications_used, billing_period_started_at, deactivated_at, created_at FROM users WHERE deactivated_at IS NULL";
}

pub struct UserRepository {
    connection: Connection,
}

impl UserRepository {
    pub fn new(connection: Connection) -> Self {
        UserRepository { connection }
    }

    pub async fn find_by_external_subject(&self, subject: &str) -> Result<Option<User>, DbError> {
        let mut rows = self.connection.query(queries::FIND_BY_SUBJECT, params![subject]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let mut rows = self.connection.query(queries::FIND_BY_ID, params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    /// Creates a free-tier user for a never-before-seen external
    /// subject. Callers should check `find_by_external_subject` first;
    /// this does not upsert, a duplicate subject fails on the unique
    /// constraint.
    pub async fn create(&self, external_subject: &str) -> Result<User, DbError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.connection
            .execute(queries::INSERT, params![id.to_string(), external_subject, "free", now.to_rfc3339()])
            .await?;
        Ok(User {
            id,
            external_subject: external_subject.to_string(),
            subscription_tier: SubscriptionTier::Free,
            searches_used: 0,
            applications_used: 0,
            billing_period_started_at: now,
            deactivated_at: None,
            created_at: now,
        })
    }

    /// Atomic increment-then-check: the `WHERE` clause re-validates
    /// the quota ceiling inside the same statement, so a concurrent
    /// caller can never push `searches_used` past the tier limit.
    /// Returns `false` if the row existed but was already at quota.
    pub async fn try_increment_searches_used(&self, id: Uuid) -> Result<bool, DbError> {
        let affected = self.connection.execute(queries::INCREMENT_SEARCHES, params![id.to_string()]).await?;
        Ok(affected > 0)
    }

    pub async fn try_increment_applications_used(&self, id: Uuid) -> Result<bool, DbError> {
        let affected = self.connection.execute(queries::INCREMENT_APPLICATIONS, params![id.to_string()]).await?;
        Ok(affected > 0)
    }

    pub async fn reset_billing_period(&self, id: Uuid, started_at: chrono::DateTime<Utc>) -> Result<(), DbError> {
        self.connection
            .execute(queries::RESET_BILLING_PERIOD, params![id.to_string(), started_at.to_rfc3339()])
            .await?;
        Ok(())
    }

    pub async fn list_active(&self) -> Result<Vec<User>, DbError> {
        let mut rows = self.connection.query(queries::LIST_ACTIVE, ()).await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(row)?);
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GrantStoreClient;

    async fn repo() -> (GrantStoreClient, UserRepository) {
        let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
        let connection = client.connection().expect("connection");
        (client, UserRepository::new(connection))
    }

    #[tokio::test]
    async fn free_tier_search_quota_never_exceeds_limit() {
        let (_client, repo) = repo().await;
        let user = repo.create("free-tier-subject").await.expect("create");

        for _ in 0..5 {
            assert!(repo.try_increment_searches_used(user.id).await.expect("increment"));
        }
        assert!(!repo.try_increment_searches_used(user.id).await.expect("increment"));

        let reloaded = repo.find_by_id(user.id).await.expect("find").expect("present");
        assert_eq!(reloaded.searches_used, 5);
    }

    #[tokio::test]
    async fn reset_billing_period_zeroes_both_counters() {
        let (_client, repo) = repo().await;
        let user = repo.create("reset-subject").await.expect("create");
        repo.try_increment_searches_used(user.id).await.expect("increment");
        repo.try_increment_applications_used(user.id).await.expect("increment");

        repo.reset_billing_period(user.id, Utc::now()).await.expect("reset");

        let reloaded = repo.find_by_id(user.id).await.expect("find").expect("present");
        assert_eq!(reloaded.searches_used, 0);
        assert_eq!(reloaded.applications_used, 0);
    }
}

fn row_to_user(row: libsql::Row) -> Result<User, DbError> {
    let tier_raw: String = row.get(2)?;
    let subscription_tier = match tier_raw.as_str() {
        "free" => SubscriptionTier::Free,
        "standard" => SubscriptionTier::Standard,
        "premium" => SubscriptionTier::Premium,
        other => return Err(DbError::Mapping(format!("unknown subscription tier: {other}"))),
    };

    Ok(User {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        external_subject: row.get(1)?,
        subscription_tier,
        searches_used: row.get::<i64>(3)? as u32,
        applications_used: row.get::<i64>(4)? as u32,
        billing_period_started_at: parse_timestamp(&row.get::<String>(5)?)?,
        deactivated_at: parse_optional_timestamp(row.get::<Option<String>>(6)?)?,
        created_at: parse_timestamp(&row.get::<String>(7)?)?,
    })
}
