// [apps/gateway/src/handlers/system.rs]
//! GET /api/system/info — unauthenticated build/version metadata, the
//! kind of thing an ops dashboard polls without needing a token. GET
//! /api/system/quota sits behind `auth_guard` and reports the calling
//! user's subscription-tier quota snapshot.

use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use grantwell_domain_billing::QuotaSnapshot;

use crate::errors::AppError;
use crate::state::{AppState, OperatorIdentity};

pub struct SystemInfoHandler;

impl SystemInfoHandler {
    pub async fn info() -> Response {
        Json(json!({
            "name": "grantwell-gateway",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response()
    }
}

pub struct QuotaHandler;

impl QuotaHandler {
    #[tracing::instrument(skip(state))]
    pub async fn get(State(state): State<AppState>, Extension(identity): Extension<OperatorIdentity>) -> Result<Response, AppError> {
        let users = state.users()?;
        let user = users.find_by_id(identity.user_id).await?.ok_or_else(|| AppError::not_found("user"))?;
        Ok(Json(QuotaSnapshot::from_user(&user)).into_response())
    }
}
