// [libs/infra/db/src/schema.rs]
/*!
 * SCHEMA MIGRATION
 * RESPONSIBILITY: idempotent schema bootstrap in two phases: base
 * table creation, then additive column migrations applied with
 * `ALTER TABLE`. A duplicate-column error from the second phase means
 * a prior run already applied it and is treated as success, since
 * libsql has no `IF NOT EXISTS` for columns.
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            external_subject TEXT NOT NULL UNIQUE,
            subscription_tier TEXT NOT NULL DEFAULT 'free',
            searches_used INTEGER NOT NULL DEFAULT 0,
            applications_used INTEGER NOT NULL DEFAULT 0,
            billing_period_started_at TEXT NOT NULL,
            deactivated_at TEXT,
            created_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "business_profiles",
        r#"
        CREATE TABLE IF NOT EXISTS business_profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            narrative TEXT NOT NULL,
            sectors TEXT NOT NULL DEFAULT '[]',
            focus_areas TEXT NOT NULL DEFAULT '[]',
            revenue_band TEXT NOT NULL DEFAULT '',
            team_size INTEGER NOT NULL DEFAULT 0,
            geographic_focus TEXT NOT NULL DEFAULT '[]',
            strategic_goals TEXT NOT NULL DEFAULT '[]',
            resource_constraints TEXT NOT NULL DEFAULT '{}',
            vector_namespace TEXT NOT NULL DEFAULT '',
            embeddings_generated_at TEXT,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        );
    "#,
    ),
    (
        "grants",
        r#"
        CREATE TABLE IF NOT EXISTS grants (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            source_url TEXT NOT NULL,
            normalized_url TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            funder_name TEXT NOT NULL DEFAULT '',
            sectors TEXT NOT NULL DEFAULT '[]',
            min_amount REAL,
            max_amount REAL,
            deadline TEXT,
            geographic_scope TEXT NOT NULL DEFAULT 'national',
            eligible_regions TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'active',
            score_json TEXT,
            composite_score REAL,
            raw_source_data TEXT NOT NULL DEFAULT '{}',
            first_found_at TEXT NOT NULL,
            retrieved_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, normalized_url)
        );
    "#,
    ),
    (
        "analyses",
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            grant_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            search_run_id TEXT NOT NULL,
            score_json TEXT NOT NULL,
            composite_score REAL NOT NULL,
            rationale TEXT NOT NULL DEFAULT '',
            blocked_by_rule TEXT,
            created_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "search_runs",
        r#"
        CREATE TABLE IF NOT EXISTS search_runs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            profile_id TEXT NOT NULL,
            trigger TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            degraded INTEGER NOT NULL DEFAULT 0,
            grants_found INTEGER NOT NULL DEFAULT 0,
            grants_new INTEGER NOT NULL DEFAULT 0,
            error TEXT,
            error_details TEXT NOT NULL DEFAULT '[]',
            started_at TEXT NOT NULL,
            completed_at TEXT
        );
    "#,
    ),
    (
        "application_history",
        r#"
        CREATE TABLE IF NOT EXISTS application_history (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            grant_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'considering',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "generated_applications",
        r#"
        CREATE TABLE IF NOT EXISTS generated_applications (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            executive_summary TEXT,
            needs_statement TEXT,
            project_description TEXT,
            budget_narrative TEXT,
            organizational_capacity TEXT,
            impact_statement TEXT,
            sections_failed TEXT NOT NULL DEFAULT '[]',
            tokens_used INTEGER NOT NULL DEFAULT 0,
            generation_duration_ms INTEGER NOT NULL DEFAULT 0,
            model_identifier TEXT NOT NULL DEFAULT '',
            generated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "sector_configs",
        r#"
        CREATE TABLE IF NOT EXISTS sector_configs (
            id TEXT PRIMARY KEY,
            sector_key TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            keywords TEXT NOT NULL DEFAULT '[]',
            related_sectors TEXT NOT NULL DEFAULT '[]',
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "geographic_configs",
        r#"
        CREATE TABLE IF NOT EXISTS geographic_configs (
            id TEXT PRIMARY KEY,
            region_key TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            tier TEXT NOT NULL,
            parent_region_key TEXT,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "compliance_rules",
        r#"
        CREATE TABLE IF NOT EXISTS compliance_rules (
            id TEXT PRIMARY KEY,
            rule_key TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            hard_block INTEGER NOT NULL DEFAULT 0,
            applies_to_sectors TEXT NOT NULL DEFAULT '[]',
            include_keywords TEXT NOT NULL DEFAULT '[]',
            exclude_keywords TEXT NOT NULL DEFAULT '[]',
            penalty REAL NOT NULL DEFAULT 0.2,
            hard_reject_penalty REAL NOT NULL DEFAULT 0.5,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "quota_transactions",
        r#"
        CREATE TABLE IF NOT EXISTS quota_transactions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            units INTEGER NOT NULL DEFAULT 1,
            reference_id TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "system_notifications",
        r#"
        CREATE TABLE IF NOT EXISTS system_notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            severity TEXT NOT NULL,
            message_context_key TEXT NOT NULL,
            metadata TEXT,
            created_at TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
];

/// Additive column migrations applied after base tables exist. Each
/// entry is attempted independently; a "duplicate column" failure is
/// the expected steady-state once a migration has already landed.
const EVOLUTIONARY_COLUMNS: &[(&str, &str)] = &[
    ("grants_first_found_backfill", "ALTER TABLE grants ADD COLUMN first_found_at TEXT"),
    ("search_runs_degraded_backfill", "ALTER TABLE search_runs ADD COLUMN degraded INTEGER NOT NULL DEFAULT 0"),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("idx_grants_user", "CREATE INDEX IF NOT EXISTS idx_grants_user ON grants(user_id);"),
    ("idx_grants_deadline", "CREATE INDEX IF NOT EXISTS idx_grants_deadline ON grants(deadline);"),
    ("idx_grants_status", "CREATE INDEX IF NOT EXISTS idx_grants_status ON grants(status);"),
    ("idx_analyses_grant", "CREATE INDEX IF NOT EXISTS idx_analyses_grant ON analyses(grant_id);"),
    ("idx_search_runs_user", "CREATE INDEX IF NOT EXISTS idx_search_runs_user ON search_runs(user_id);"),
    (
        "idx_application_history_user",
        "CREATE INDEX IF NOT EXISTS idx_application_history_user ON application_history(user_id);",
    ),
    (
        "idx_notifications_user_unread",
        "CREATE INDEX IF NOT EXISTS idx_notifications_user_unread ON system_notifications(user_id, is_read);",
    ),
];

#[instrument(skip(connection))]
pub async fn apply_schema(connection: &Connection) -> Result<()> {
    info!("applying grant store schema");
    create_base_tables(connection).await?;
    apply_evolutionary_columns(connection).await?;
    create_indexes(connection).await?;
    info!("grant store schema up to date");
    Ok(())
}

async fn create_base_tables(db: &Connection) -> Result<()> {
    for (name, sql) in BASE_TABLES {
        debug!(table = name, "creating base table");
        db.execute(sql, ()).await.with_context(|| format!("failed to create table {name}"))?;
    }
    Ok(())
}

async fn apply_evolutionary_columns(db: &Connection) -> Result<()> {
    for (name, sql) in EVOLUTIONARY_COLUMNS {
        match db.execute(sql, ()).await {
            Ok(_) => info!(migration = name, "applied evolutionary column migration"),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!(migration = name, "already applied");
                } else {
                    warn!(migration = name, error = %message, "migration did not apply cleanly");
                }
            }
        }
    }
    Ok(())
}

async fn create_indexes(db: &Connection) -> Result<()> {
    for (name, sql) in ACCELERATION_INDEXES {
        debug!(index = name, "creating index");
        db.execute(sql, ()).await.with_context(|| format!("failed to create index {name}"))?;
    }
    Ok(())
}
