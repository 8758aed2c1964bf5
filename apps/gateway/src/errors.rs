// [apps/gateway/src/errors.rs]
//! Central error taxonomy for the HTTP surface. Every fallible path in
//! `handlers` and `services` converges on `AppError`, which is the only
//! type allowed to implement `IntoResponse` for a handler result — this
//! keeps the taxonomy-to-status mapping in one place rather than
//! scattered across handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use grantwell_domain_rag::RetrievalError;
use grantwell_infra_db::DbError;
use grantwell_infra_adapters::AdapterError;
use grantwell_infra_resilience::BreakerError;
use grantwell_infra_vector::VectorIndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Quota,
    NotFound,
    Conflict,
    Transient,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Quota => "QUOTA",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Transient => "TRANSIENT",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Quota => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
    pub retry_after_secs: Option<u64>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        AppError { kind, message: message.into(), details: None, retry_after_secs: None }
    }

    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        AppError { kind: ErrorKind::Validation, message: message.into(), details: Some(details), retry_after_secs: None }
    }

    pub fn not_found(entity: &str) -> Self {
        AppError::new(ErrorKind::NotFound, format!("{entity} not found"))
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        AppError::new(ErrorKind::Quota, message)
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: &'static str,
    error_id: Uuid,
    message: String,
    details: Option<Value>,
    timestamp: chrono::DateTime<Utc>,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        if self.kind == ErrorKind::Internal {
            tracing::error!(error_id = %error_id, message = %self.message, "internal error");
        } else {
            tracing::warn!(error_id = %error_id, kind = self.kind.as_str(), message = %self.message, "request failed");
        }

        let envelope = ErrorEnvelope {
            error: self.kind.as_str(),
            error_id,
            message: self.message,
            details: self.details,
            timestamp: Utc::now(),
        };

        let mut response = (self.kind.status(), Json(envelope)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response.headers_mut().insert(axum::http::header::RETRY_AFTER, secs.into());
        }
        response
    }
}

impl From<DbError> for AppError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound(entity) => AppError::new(ErrorKind::NotFound, entity),
            DbError::Conflict(message) => AppError::new(ErrorKind::Conflict, message),
            DbError::Connection(message) | DbError::Configuration(message) => {
                AppError::new(ErrorKind::Transient, message)
            }
            DbError::Query(e) => AppError::new(ErrorKind::Transient, e.to_string()),
            DbError::Transaction => AppError::new(ErrorKind::Transient, "transaction failed"),
            DbError::Mapping(message) => AppError::new(ErrorKind::Internal, message),
        }
    }
}

impl From<AdapterError> for AppError {
    fn from(error: AdapterError) -> Self {
        match error {
            AdapterError::Unauthorized => AppError::new(ErrorKind::ServiceUnavailable, "upstream credentials rejected"),
            AdapterError::RateLimited { retry_after_secs } => {
                AppError::new(ErrorKind::Transient, "upstream rate limited").with_retry_after(retry_after_secs)
            }
            AdapterError::Network(_) | AdapterError::ServerRejection { .. } => {
                AppError::new(ErrorKind::Transient, error.to_string())
            }
            AdapterError::Decoding(message) => AppError::new(ErrorKind::Internal, message),
        }
    }
}

impl<E: Into<AppError>> From<BreakerError<E>> for AppError {
    fn from(error: BreakerError<E>) -> Self {
        match error {
            BreakerError::Open => AppError::new(ErrorKind::ServiceUnavailable, "upstream circuit breaker is open").with_retry_after(30),
            BreakerError::Inner(inner) => inner.into(),
        }
    }
}

impl From<VectorIndexError> for AppError {
    fn from(error: VectorIndexError) -> Self {
        AppError::new(ErrorKind::Transient, error.to_string())
    }
}

impl From<RetrievalError> for AppError {
    fn from(error: RetrievalError) -> Self {
        match error {
            RetrievalError::Embedding(e) => e.into(),
            RetrievalError::VectorIndex(e) => e.into(),
        }
    }
}
