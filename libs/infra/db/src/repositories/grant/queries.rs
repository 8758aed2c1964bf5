// [libs/infra/db/src/repositories/grant/queries.rs]
//! SQL statements for the grant table. Kept as named constants rather
//! than inline strings so `EXPLAIN QUERY PLAN` output in an incident
//! can be matched back to a name without re-deriving the statement.

pub const FIND_BY_NORMALIZED_URL: &str = r#"
    SELECT id, source_url, normalized_url, title, description, funder_name, sectors,
           min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
           score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
           created_at, updated_at
    FROM grants WHERE user_id = ?1 AND normalized_url = ?2
"#;

pub const FIND_BY_TITLE_AND_DEADLINE: &str = r#"
    SELECT id, source_url, normalized_url, title, description, funder_name, sectors,
           min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
           score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
           created_at, updated_at
    FROM grants
    WHERE user_id = ?1 AND lower(trim(title)) = ?2 AND (
        (?3 IS NULL AND deadline IS NULL) OR date(deadline) = ?3
    )
"#;

pub const LIST_TITLES_FOR_USER: &str = r#"
    SELECT id, source_url, normalized_url, title, description, funder_name, sectors,
           min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
           score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
           created_at, updated_at
    FROM grants WHERE user_id = ?1 AND status != 'archived'
"#;

pub const INSERT: &str = r#"
    INSERT INTO grants (
        id, user_id, source_url, normalized_url, title, description, funder_name, sectors,
        min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
        score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
        created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
"#;

pub const UPDATE_MERGED: &str = r#"
    UPDATE grants SET
        source_url = ?2, title = ?3, description = ?4, funder_name = ?5, sectors = ?6,
        min_amount = ?7, max_amount = ?8, deadline = ?9, eligible_regions = ?10, status = ?11,
        score_json = NULL, composite_score = NULL, raw_source_data = ?12,
        retrieved_at = ?13, updated_at = ?14
    WHERE id = ?1
"#;

pub const WRITE_SCORE: &str = "UPDATE grants SET score_json = ?2, composite_score = ?3, updated_at = ?4 WHERE id = ?1";

pub const FIND_STALE_CANDIDATES: &str = "SELECT id FROM grants WHERE status = 'active' AND deadline IS NOT NULL AND date(deadline) < date(?1)";
pub const MARK_EXPIRED: &str = "UPDATE grants SET status = 'expired', updated_at = ?2 WHERE id = ?1";
pub const DELETE_EXPIRED_BEFORE: &str = "DELETE FROM grants WHERE status = 'expired' AND date(deadline) < date(?1)";

pub const FIND_BY_ID: &str = r#"
    SELECT id, source_url, normalized_url, title, description, funder_name, sectors,
           min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
           score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
           created_at, updated_at
    FROM grants WHERE user_id = ?1 AND id = ?2
"#;

/// Ranked listing for a user: highest composite score first, ties broken
/// by nearest deadline (grants with no deadline sort last), remaining
/// ties broken alphabetically by title.
pub const LIST_RANKED_FOR_USER: &str = r#"
    SELECT id, source_url, normalized_url, title, description, funder_name, sectors,
           min_amount, max_amount, deadline, geographic_scope, eligible_regions, status,
           score_json, composite_score, raw_source_data, first_found_at, retrieved_at,
           created_at, updated_at
    FROM grants
    WHERE user_id = ?1 AND status != 'archived'
    ORDER BY composite_score DESC, deadline IS NULL, deadline ASC, title ASC
    LIMIT ?2 OFFSET ?3
"#;
