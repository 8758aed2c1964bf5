// [apps/gateway/src/middleware.rs]
//! Two `axum::middleware::from_fn` guards composed in `routes.rs`:
//! `health_guard` rejects every request while the system is in
//! maintenance, and `auth_guard` accepts either the worker pool's
//! shared secret or a Supabase-issued JWT, resolving the latter to a
//! `User` row (creating one on first sight) and injecting an
//! `OperatorIdentity` for handlers to read back out of the request
//! extensions.
//!
//! JWT signature verification is delegated upstream (API gateway /
//! Supabase's own edge) — this guard only decodes the `sub` claim out
//! of the second segment, mirroring how the worker-token path trusts a
//! shared secret rather than a certificate chain.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::state::{AppState, OperatorIdentity};

#[derive(Debug, Deserialize)]
struct SupabaseClaims {
    sub: String,
}

/// Records every 5xx response against `HealthState::record_error`, the
/// counter `/health/detailed` and `/health/recovery-stats` surface as
/// `errors_per_minute`. Runs outermost so it sees the final status
/// code regardless of which inner guard or handler produced it.
pub async fn error_recorder(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status().is_server_error() {
        state.health.record_error().await;
    }
    response
}

pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "SERVICE_UNAVAILABLE",
                "message": "system is in maintenance mode",
                "details": { "reason": reason },
            })),
        )
            .into_response();
    }
    next.run(req).await
}

pub async fn auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let worker_token = &state.current_config().await.worker_auth_token;
    if !worker_token.is_empty() && token == worker_token.as_str() {
        req.extensions_mut().insert(OperatorIdentity { user_id: uuid::Uuid::nil(), is_worker_node: true });
        return Ok(next.run(req).await);
    }

    let subject = decode_subject(token).ok_or(StatusCode::UNAUTHORIZED)?;
    let user_id = resolve_user(&state, &subject).await.ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(OperatorIdentity { user_id, is_worker_node: false });
    Ok(next.run(req).await)
}

fn decode_subject(token: &str) -> Option<String> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }
    let payload = URL_SAFE_NO_PAD.decode(segments[1]).ok()?;
    let claims: SupabaseClaims = serde_json::from_slice(&payload).ok()?;
    Some(claims.sub)
}

async fn resolve_user(state: &AppState, subject: &str) -> Option<uuid::Uuid> {
    let users = state.users().ok()?;
    if let Ok(Some(user)) = users.find_by_external_subject(subject).await {
        return Some(user.id);
    }
    users.create(subject).await.ok().map(|user| user.id)
}
