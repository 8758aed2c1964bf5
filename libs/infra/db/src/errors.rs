// [libs/infra/db/src/errors.rs]
//! Error catalog for the persistence layer. Bracketed prefixes group
//! failures by origin so log aggregation can filter on them without
//! parsing the message text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("[DB_CONN]: connection to storage backend failed: {0}")]
    Connection(String),

    #[error("[DB_CONFIG]: required configuration missing or invalid: {0}")]
    Configuration(String),

    #[error("[DB_QUERY]: query rejected by storage engine: {0}")]
    Query(#[from] libsql::Error),

    #[error("[DB_MAPPING]: row could not be mapped to a domain type: {0}")]
    Mapping(String),

    #[error("[DB_TX]: transaction could not be committed")]
    Transaction,

    #[error("[DB_NOT_FOUND]: {0}")]
    NotFound(String),

    #[error("[DB_CONFLICT]: {0}")]
    Conflict(String),
}
