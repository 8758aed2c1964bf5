// [libs/infra/db/src/repositories/grant/mod.rs]
/*!
 * GRANT REPOSITORY
 * RESPONSIBILITY: candidate dedup against a user's existing grants,
 * field-wise merge on a hit, and the grant lifecycle queries the
 * scheduler's cleanup daemon runs against expired records.
 *
 * The three dedup strategies (exact URL, title+deadline, fuzzy title)
 * are tried in order inside one transaction per candidate, so a
 * concurrent insert for the same URL can't slip past as a duplicate
 * row between the lookup and the write.
 */

mod dedup;
mod queries;

use chrono::Utc;
use libsql::{params, Connection, Transaction};
use uuid::Uuid;

use grantwell_core_scoring::is_fuzzy_title_match;
use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus, ScoreVector};
use grantwell_domain_models::Grant;

use crate::errors::DbError;
use crate::repositories::json_columns::{from_json, parse_optional_timestamp, parse_timestamp, to_json};

pub use dedup::normalize_url;

#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Inserted(Grant),
    Merged(Grant),
}

pub struct GrantRepository {
    connection: Connection,
}

impl GrantRepository {
    pub fn new(connection: Connection) -> Self {
        GrantRepository { connection }
    }

    /// Runs the full dedup + merge + write sequence for one candidate
    /// inside a single transaction, per the "one transaction per
    /// candidate" rule.
    pub async fn upsert_candidate(&self, user_id: Uuid, candidate: Grant) -> Result<UpsertOutcome, DbError> {
        let normalized = dedup::normalize_url(&candidate.source_url);

        let tx = self.connection.transaction().await.map_err(|_| DbError::Transaction)?;

        let existing = find_exact_url_match(&tx, user_id, &normalized)
            .await?
            .or(find_title_deadline_match(&tx, user_id, &candidate).await?)
            .or(find_fuzzy_title_match(&tx, user_id, &candidate).await?);

        let outcome = match existing {
            Some(existing_grant) => {
                let merged = dedup::merge(&existing_grant, &candidate);
                write_merged(&tx, &merged).await?;
                UpsertOutcome::Merged(merged)
            }
            None => {
                let to_insert = Grant { id: Uuid::new_v4(), ..candidate };
                insert(&tx, user_id, &to_insert, &normalized).await?;
                UpsertOutcome::Inserted(to_insert)
            }
        };

        tx.commit().await.map_err(|_| DbError::Transaction)?;
        Ok(outcome)
    }

    /// Ranked listing used by the grants list endpoint: active, expired,
    /// and draft grants ordered by composite score, unscored candidates
    /// last; archived grants are excluded.
    pub async fn list_ranked_for_user(&self, user_id: Uuid, limit: u32, offset: u32) -> Result<Vec<Grant>, DbError> {
        let mut rows = self
            .connection
            .query(queries::LIST_RANKED_FOR_USER, params![user_id.to_string(), limit, offset])
            .await?;
        let mut grants = Vec::new();
        while let Some(row) = rows.next().await? {
            grants.push(row_to_grant(row)?);
        }
        Ok(grants)
    }

    pub async fn find_by_id(&self, user_id: Uuid, grant_id: Uuid) -> Result<Option<Grant>, DbError> {
        let mut rows = self
            .connection
            .query(queries::FIND_BY_ID, params![user_id.to_string(), grant_id.to_string()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_grant(row)?)),
            None => Ok(None),
        }
    }

    pub async fn write_score(&self, grant_id: Uuid, score: ScoreVector, composite_score: f64) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(queries::WRITE_SCORE, params![grant_id.to_string(), to_json(&score)?, composite_score, now.to_rfc3339()])
            .await?;
        Ok(())
    }

    /// Moves active grants whose deadline is more than `stale_after_days`
    /// in the past to `expired`, then physically deletes expired grants
    /// whose deadline is more than `delete_after_days` in the past.
    /// Returns `(expired_count, deleted_count)`.
    pub async fn run_cleanup(&self, stale_after_days: i64, delete_after_days: i64) -> Result<(u32, u32), DbError> {
        let now = Utc::now();
        let stale_cutoff = (now - chrono::Duration::days(stale_after_days)).to_rfc3339();
        let delete_cutoff = (now - chrono::Duration::days(delete_after_days)).to_rfc3339();

        let mut rows = self.connection.query(queries::FIND_STALE_CANDIDATES, params![stale_cutoff.clone()]).await?;
        let mut expired = 0u32;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        for id in ids {
            self.connection.execute(queries::MARK_EXPIRED, params![id, now.to_rfc3339()]).await?;
            expired += 1;
        }

        let deleted = self.connection.execute(queries::DELETE_EXPIRED_BEFORE, params![delete_cutoff]).await? as u32;

        Ok((expired, deleted))
    }
}

async fn find_exact_url_match(tx: &Transaction, user_id: Uuid, normalized_url: &str) -> Result<Option<Grant>, DbError> {
    let mut rows = tx.query(queries::FIND_BY_NORMALIZED_URL, params![user_id.to_string(), normalized_url]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_grant(row)?)),
        None => Ok(None),
    }
}

async fn find_title_deadline_match(tx: &Transaction, user_id: Uuid, candidate: &Grant) -> Result<Option<Grant>, DbError> {
    let (title_key, deadline_key) = candidate.dedup_key_by_title_deadline();
    let deadline_param = deadline_key.map(|d| d.to_string());
    let mut rows = tx
        .query(queries::FIND_BY_TITLE_AND_DEADLINE, params![user_id.to_string(), title_key, deadline_param])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_grant(row)?)),
        None => Ok(None),
    }
}

async fn find_fuzzy_title_match(tx: &Transaction, user_id: Uuid, candidate: &Grant) -> Result<Option<Grant>, DbError> {
    let mut rows = tx.query(queries::LIST_TITLES_FOR_USER, params![user_id.to_string()]).await?;
    while let Some(row) = rows.next().await? {
        let existing = row_to_grant(row)?;
        if is_fuzzy_title_match(&existing.title, &candidate.title) {
            return Ok(Some(existing));
        }
    }
    Ok(None)
}

async fn insert(tx: &Transaction, user_id: Uuid, grant: &Grant, normalized_url: &str) -> Result<(), DbError> {
    tx.execute(
        queries::INSERT,
        params![
            grant.id.to_string(),
            user_id.to_string(),
            grant.source_url.clone(),
            normalized_url.to_string(),
            grant.title.clone(),
            grant.description.clone(),
            grant.funder_name.clone(),
            to_json(&grant.sectors)?,
            grant.funding.min_amount,
            grant.funding.max_amount,
            grant.deadline.map(|d| d.to_rfc3339()),
            geographic_scope_str(grant.geographic_scope),
            to_json(&grant.eligible_regions)?,
            record_status_str(grant.status),
            grant.score.map(|s| to_json(&s)).transpose()?,
            grant.composite_score,
            to_json(&grant.raw_source_data)?,
            grant.first_found_at.to_rfc3339(),
            grant.retrieved_at.to_rfc3339(),
            grant.created_at.to_rfc3339(),
            grant.updated_at.to_rfc3339(),
        ],
    )
    .await?;
    Ok(())
}

async fn write_merged(tx: &Transaction, grant: &Grant) -> Result<(), DbError> {
    tx.execute(
        queries::UPDATE_MERGED,
        params![
            grant.id.to_string(),
            grant.source_url.clone(),
            grant.title.clone(),
            grant.description.clone(),
            grant.funder_name.clone(),
            to_json(&grant.sectors)?,
            grant.funding.min_amount,
            grant.funding.max_amount,
            grant.deadline.map(|d| d.to_rfc3339()),
            to_json(&grant.eligible_regions)?,
            record_status_str(grant.status),
            to_json(&grant.raw_source_data)?,
            grant.retrieved_at.to_rfc3339(),
            grant.updated_at.to_rfc3339(),
        ],
    )
    .await?;
    Ok(())
}

fn geographic_scope_str(scope: GeographicScope) -> &'static str {
    match scope {
        GeographicScope::National => "national",
        GeographicScope::Regional => "regional",
        GeographicScope::Local => "local",
    }
}

fn record_status_str(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Draft => "draft",
        RecordStatus::Active => "active",
        RecordStatus::Expired => "expired",
        RecordStatus::Archived => "archived",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GrantStoreClient;
    use std::collections::HashMap;

    async fn repo() -> (GrantStoreClient, GrantRepository) {
        let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
        let connection = client.connection().expect("connection");
        (client, GrantRepository::new(connection))
    }

    fn sample_grant(source_url: &str) -> Grant {
        Grant {
            id: Uuid::new_v4(),
            source_url: source_url.to_string(),
            title: "AI in Education Fund".to_string(),
            description: "Supports AI literacy programs in K-12 schools.".to_string(),
            funder_name: "Example Foundation".to_string(),
            sectors: vec!["education".to_string()],
            funding: FundingBounds { min_amount: Some(10_000.0), max_amount: Some(50_000.0) },
            deadline: None,
            geographic_scope: GeographicScope::Regional,
            eligible_regions: vec!["Louisiana".to_string()],
            status: RecordStatus::Active,
            score: None,
            composite_score: None,
            raw_source_data: HashMap::new(),
            first_found_at: Utc::now(),
            retrieved_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upserting_the_same_url_twice_yields_one_row() {
        let (_client, repo) = repo().await;
        let user_id = Uuid::new_v4();

        let first = repo.upsert_candidate(user_id, sample_grant("https://example.gov/fund?utm_source=x")).await.expect("upsert");
        assert!(matches!(first, UpsertOutcome::Inserted(_)));

        let second = repo.upsert_candidate(user_id, sample_grant("https://example.gov/fund?utm_source=y")).await.expect("upsert");
        assert!(matches!(second, UpsertOutcome::Merged(_)));

        let listed = repo.list_ranked_for_user(user_id, 100, 0).await.expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn second_upsert_widens_funding_bounds_on_a_higher_max() {
        let (_client, repo) = repo().await;
        let user_id = Uuid::new_v4();

        repo.upsert_candidate(user_id, sample_grant("https://example.gov/widen")).await.expect("upsert");

        let mut richer = sample_grant("https://example.gov/widen");
        richer.funding.max_amount = Some(75_000.0);
        let merged = repo.upsert_candidate(user_id, richer).await.expect("upsert");

        match merged {
            UpsertOutcome::Merged(grant) => assert_eq!(grant.funding.max_amount, Some(75_000.0)),
            UpsertOutcome::Inserted(_) => panic!("expected a merge on the second occurrence"),
        }
    }

    #[tokio::test]
    async fn cleanup_archives_stale_then_deletes_long_archived() {
        let (_client, repo) = repo().await;
        let user_id = Uuid::new_v4();

        let mut stale = sample_grant("https://example.gov/stale");
        stale.deadline = Some(Utc::now() - chrono::Duration::days(45));
        repo.upsert_candidate(user_id, stale).await.expect("upsert");

        let (archived, deleted) = repo.run_cleanup(30, 90).await.expect("cleanup");
        assert_eq!(archived, 1);
        assert_eq!(deleted, 0);
    }
}

fn row_to_grant(row: libsql::Row) -> Result<Grant, DbError> {
    let geographic_scope = match row.get::<String>(10)?.as_str() {
        "national" => GeographicScope::National,
        "regional" => GeographicScope::Regional,
        "local" => GeographicScope::Local,
        other => return Err(DbError::Mapping(format!("unknown geographic scope: {other}"))),
    };
    let status = match row.get::<String>(12)?.as_str() {
        "draft" => RecordStatus::Draft,
        "active" => RecordStatus::Active,
        "expired" => RecordStatus::Expired,
        "archived" => RecordStatus::Archived,
        other => return Err(DbError::Mapping(format!("unknown record status: {other}"))),
    };
    let score_json: Option<String> = row.get(13)?;
    let score = score_json.map(|raw| from_json::<ScoreVector>(&raw)).transpose()?;

    Ok(Grant {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        source_url: row.get(1)?,
        title: row.get(3)?,
        description: row.get(4)?,
        funder_name: row.get(5)?,
        sectors: from_json(&row.get::<String>(6)?)?,
        funding: FundingBounds { min_amount: row.get(7)?, max_amount: row.get(8)? },
        deadline: parse_optional_timestamp(row.get::<Option<String>>(9)?)?,
        geographic_scope,
        eligible_regions: from_json(&row.get::<String>(11)?)?,
        status,
        score,
        composite_score: row.get(14)?,
        raw_source_data: from_json(&row.get::<String>(15)?)?,
        first_found_at: parse_timestamp(&row.get::<String>(16)?)?,
        retrieved_at: parse_timestamp(&row.get::<String>(17)?)?,
        created_at: parse_timestamp(&row.get::<String>(18)?)?,
        updated_at: parse_timestamp(&row.get::<String>(19)?)?,
    })
}
