// [libs/infra/db/src/repositories/profile.rs]
//! Business profile reads, writes, and embedding-namespace bookkeeping.

use chrono::Utc;
use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_models::{profile::ResourceConstraints, BusinessProfile};

use crate::errors::DbError;
use crate::repositories::json_columns::{from_json, parse_optional_timestamp, parse_timestamp, to_json};

mod queries {
    pub const FIND_BY_USER: &str = "SELECT id, user_id, narrative, sectors, focus_areas, revenue_band, team_size, geographic_focus, strategic_goals, resource_constraints, vector_namespace, embeddings_generated_at, updated_at FROM business_profiles WHERE user_id = ?1";
    pub const UPSERT: &str = r#"
        INSERT INTO business_profiles (id, user_id, narrative, sectors, focus_areas, revenue_band, team_size, geographic_focus, strategic_goals, resource_constraints, vector_namespace, embeddings_generated_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(user_id) DO UPDATE SET
            narrative = excluded.narrative,
            sectors = excluded.sectors,
            focus_areas = excluded.focus_areas,
            revenue_band = excluded.revenue_band,
            team_size = excluded.team_size,
            geographic_focus = excluded.geographic_focus,
            strategic_goals = excluded.strategic_goals,
            resource_constraints = excluded.resource_constraints,
            updated_at = excluded.updated_at
    "#;
    pub const MARK_EMBEDDINGS_GENERATED: &str = "UPDATE business_profiles SET embeddings_generated_at = ?2, vector_namespace = ?3 WHERE id = ?1";
}

pub struct ProfileRepository {
    connection: Connection,
}

impl ProfileRepository {
    pub fn new(connection: Connection) -> Self {
        ProfileRepository { connection }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<BusinessProfile>, DbError> {
        let mut rows = self.connection.query(queries::FIND_BY_USER, params![user_id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_profile(row)?)),
            None => Ok(None),
        }
    }

    /// `business_profiles` has one row per user; a second call for the
    /// same user overwrites in place rather than creating a history.
    pub async fn upsert(&self, user_id: Uuid, draft: ProfileDraft) -> Result<BusinessProfile, DbError> {
        let existing = self.find_by_user(user_id).await?;
        let id = existing.as_ref().map(|p| p.id).unwrap_or_else(Uuid::new_v4);
        let vector_namespace = existing.map(|p| p.vector_namespace).unwrap_or_else(|| BusinessProfile::namespace_for(user_id));
        let now = Utc::now();

        self.connection
            .execute(
                queries::UPSERT,
                params![
                    id.to_string(),
                    user_id.to_string(),
                    draft.narrative.clone(),
                    to_json(&draft.sectors)?,
                    to_json(&draft.focus_areas)?,
                    draft.revenue_band.clone(),
                    draft.team_size as i64,
                    to_json(&draft.geographic_focus)?,
                    to_json(&draft.strategic_goals)?,
                    to_json(&draft.resource_constraints)?,
                    vector_namespace.clone(),
                    None::<String>,
                    now.to_rfc3339(),
                ],
            )
            .await?;

        Ok(BusinessProfile {
            id,
            user_id,
            narrative: draft.narrative,
            sectors: draft.sectors,
            focus_areas: draft.focus_areas,
            revenue_band: draft.revenue_band,
            team_size: draft.team_size,
            geographic_focus: draft.geographic_focus,
            strategic_goals: draft.strategic_goals,
            resource_constraints: draft.resource_constraints,
            vector_namespace,
            embeddings_generated_at: None,
            updated_at: now,
        })
    }

    pub async fn mark_embeddings_generated(&self, profile_id: Uuid, namespace: &str) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(queries::MARK_EMBEDDINGS_GENERATED, params![profile_id.to_string(), now.to_rfc3339(), namespace])
            .await?;
        Ok(())
    }
}

/// The subset of `BusinessProfile` a caller supplies; server-assigned
/// fields (`id`, `vector_namespace`, timestamps) are filled in by the
/// repository.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub narrative: String,
    pub sectors: Vec<String>,
    pub focus_areas: Vec<String>,
    pub revenue_band: String,
    pub team_size: u32,
    pub geographic_focus: Vec<String>,
    pub strategic_goals: Vec<String>,
    pub resource_constraints: ResourceConstraints,
}

fn row_to_profile(row: libsql::Row) -> Result<BusinessProfile, DbError> {
    let resource_constraints: ResourceConstraints = from_json(&row.get::<String>(9)?)?;
    Ok(BusinessProfile {
        id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        user_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| DbError::Mapping(e.to_string()))?,
        narrative: row.get(2)?,
        sectors: from_json(&row.get::<String>(3)?)?,
        focus_areas: from_json(&row.get::<String>(4)?)?,
        revenue_band: row.get(5)?,
        team_size: row.get::<i64>(6)? as u32,
        geographic_focus: from_json(&row.get::<String>(7)?)?,
        strategic_goals: from_json(&row.get::<String>(8)?)?,
        resource_constraints,
        vector_namespace: row.get(10)?,
        embeddings_generated_at: parse_optional_timestamp(row.get::<Option<String>>(11)?)?,
        updated_at: parse_timestamp(&row.get::<String>(12)?)?,
    })
}
