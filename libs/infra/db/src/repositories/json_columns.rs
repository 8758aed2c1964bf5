// [libs/infra/db/src/repositories/json_columns.rs]
//! Shared helpers for the TEXT-as-JSON columns every repository uses
//! for list- and map-shaped fields that don't earn their own table.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::DbError;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|e| DbError::Mapping(e.to_string()))
}

pub fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, DbError> {
    serde_json::from_str(raw).map_err(|e| DbError::Mapping(e.to_string()))
}

pub fn optional_timestamp(value: Option<chrono::DateTime<chrono::Utc>>) -> Option<String> {
    value.map(|v| v.to_rfc3339())
}

pub fn parse_optional_timestamp(raw: Option<String>) -> Result<Option<chrono::DateTime<chrono::Utc>>, DbError> {
    raw.map(|s| {
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| DbError::Mapping(e.to_string()))
    })
    .transpose()
}

pub fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::Mapping(e.to_string()))
}
