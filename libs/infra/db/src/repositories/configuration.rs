// [libs/infra/db/src/repositories/configuration.rs]
//! Operator-maintained reference data: sector and geographic taxonomies,
//! and compliance rules. Each document is replaced wholesale on update
//! rather than patched field-by-field, and `version` is bumped so the
//! compliance agent can log which ruleset version scored a grant.

use chrono::Utc;
use libsql::{params, Connection};
use uuid::Uuid;

use grantwell_domain_models::{ComplianceRule, GeographicConfig, GeographicTier, SectorConfig};

use crate::errors::DbError;
use crate::repositories::json_columns::{from_json, parse_timestamp, to_json};

mod queries {
    pub const LIST_SECTORS: &str = "SELECT id, sector_key, display_name, keywords, related_sectors, version, updated_at FROM sector_configs";
    pub const UPSERT_SECTOR: &str = r#"
        INSERT INTO sector_configs (id, sector_key, display_name, keywords, related_sectors, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        ON CONFLICT(sector_key) DO UPDATE SET
            display_name = excluded.display_name, keywords = excluded.keywords,
            related_sectors = excluded.related_sectors, version = sector_configs.version + 1,
            updated_at = excluded.updated_at
    "#;

    pub const LIST_GEOGRAPHIES: &str = "SELECT id, region_key, display_name, tier, parent_region_key, version, updated_at FROM geographic_configs";
    pub const UPSERT_GEOGRAPHY: &str = r#"
        INSERT INTO geographic_configs (id, region_key, display_name, tier, parent_region_key, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        ON CONFLICT(region_key) DO UPDATE SET
            display_name = excluded.display_name, tier = excluded.tier,
            parent_region_key = excluded.parent_region_key, version = geographic_configs.version + 1,
            updated_at = excluded.updated_at
    "#;

    pub const LIST_COMPLIANCE_RULES: &str = "SELECT id, rule_key, description, hard_block, applies_to_sectors, include_keywords, exclude_keywords, penalty, hard_reject_penalty, version, updated_at FROM compliance_rules";
    pub const UPSERT_COMPLIANCE_RULE: &str = r#"
        INSERT INTO compliance_rules (id, rule_key, description, hard_block, applies_to_sectors, include_keywords, exclude_keywords, penalty, hard_reject_penalty, version, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)
        ON CONFLICT(rule_key) DO UPDATE SET
            description = excluded.description, hard_block = excluded.hard_block,
            applies_to_sectors = excluded.applies_to_sectors, include_keywords = excluded.include_keywords,
            exclude_keywords = excluded.exclude_keywords, penalty = excluded.penalty,
            hard_reject_penalty = excluded.hard_reject_penalty, version = compliance_rules.version + 1,
            updated_at = excluded.updated_at
    "#;
}

pub struct ConfigurationRepository {
    connection: Connection,
}

impl ConfigurationRepository {
    pub fn new(connection: Connection) -> Self {
        ConfigurationRepository { connection }
    }

    pub async fn list_sectors(&self) -> Result<Vec<SectorConfig>, DbError> {
        let mut rows = self.connection.query(queries::LIST_SECTORS, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(SectorConfig {
                id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
                sector_key: row.get(1)?,
                display_name: row.get(2)?,
                keywords: from_json(&row.get::<String>(3)?)?,
                related_sectors: from_json(&row.get::<String>(4)?)?,
                version: row.get::<i64>(5)? as u32,
                updated_at: parse_timestamp(&row.get::<String>(6)?)?,
            });
        }
        Ok(out)
    }

    pub async fn upsert_sector(&self, sector_key: &str, display_name: &str, keywords: &[String], related_sectors: &[String]) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(
                queries::UPSERT_SECTOR,
                params![Uuid::new_v4().to_string(), sector_key, display_name, to_json(keywords)?, to_json(related_sectors)?, now.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn list_geographies(&self) -> Result<Vec<GeographicConfig>, DbError> {
        let mut rows = self.connection.query(queries::LIST_GEOGRAPHIES, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let tier = match row.get::<String>(3)?.as_str() {
                "national" => GeographicTier::National,
                "state" => GeographicTier::State,
                "county" => GeographicTier::County,
                "city" => GeographicTier::City,
                other => return Err(DbError::Mapping(format!("unknown geographic tier: {other}"))),
            };
            out.push(GeographicConfig {
                id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
                region_key: row.get(1)?,
                display_name: row.get(2)?,
                tier,
                parent_region_key: row.get(4)?,
                version: row.get::<i64>(5)? as u32,
                updated_at: parse_timestamp(&row.get::<String>(6)?)?,
            });
        }
        Ok(out)
    }

    pub async fn upsert_geography(&self, region_key: &str, display_name: &str, tier: GeographicTier, parent_region_key: Option<&str>) -> Result<(), DbError> {
        let now = Utc::now();
        let tier_str = match tier {
            GeographicTier::National => "national",
            GeographicTier::State => "state",
            GeographicTier::County => "county",
            GeographicTier::City => "city",
        };
        self.connection
            .execute(
                queries::UPSERT_GEOGRAPHY,
                params![Uuid::new_v4().to_string(), region_key, display_name, tier_str, parent_region_key, now.to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub async fn list_compliance_rules(&self) -> Result<Vec<ComplianceRule>, DbError> {
        let mut rows = self.connection.query(queries::LIST_COMPLIANCE_RULES, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(ComplianceRule {
                id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| DbError::Mapping(e.to_string()))?,
                rule_key: row.get(1)?,
                description: row.get(2)?,
                hard_block: row.get::<i64>(3)? != 0,
                applies_to_sectors: from_json(&row.get::<String>(4)?)?,
                include_keywords: from_json(&row.get::<String>(5)?)?,
                exclude_keywords: from_json(&row.get::<String>(6)?)?,
                penalty: row.get(7)?,
                hard_reject_penalty: row.get(8)?,
                version: row.get::<i64>(9)? as u32,
                updated_at: parse_timestamp(&row.get::<String>(10)?)?,
            });
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_compliance_rule(
        &self,
        rule_key: &str,
        description: &str,
        hard_block: bool,
        applies_to_sectors: &[String],
        include_keywords: &[String],
        exclude_keywords: &[String],
        penalty: f64,
        hard_reject_penalty: f64,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        self.connection
            .execute(
                queries::UPSERT_COMPLIANCE_RULE,
                params![
                    Uuid::new_v4().to_string(),
                    rule_key,
                    description,
                    hard_block as i64,
                    to_json(applies_to_sectors)?,
                    to_json(include_keywords)?,
                    to_json(exclude_keywords)?,
                    penalty,
                    hard_reject_penalty,
                    now.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }
}
