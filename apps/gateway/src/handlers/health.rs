// [apps/gateway/src/handlers/health.rs]
//! GET /health, /health/readiness, /health/detailed,
//! /health/circuit-breakers, /health/recovery-stats. Unauthenticated,
//! outside the `auth_guard` nest, read-only against `HealthState`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use grantwell_infra_resilience::BreakerState;

use crate::state::AppState;

pub struct HealthHandler;

impl HealthHandler {
    pub async fn liveness() -> Response {
        Json(json!({ "status": "ok" })).into_response()
    }

    pub async fn readiness(State(state): State<AppState>) -> Response {
        if state.health.is_ready(state.db_breaker.state().await).await {
            Json(json!({ "status": "ready" })).into_response()
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not_ready" }))).into_response()
        }
    }

    pub async fn detailed(State(state): State<AppState>) -> Response {
        let database = state.health.database().await;
        let components = state.health.components().await;

        Json(json!({
            "database": database.map(|d| json!({ "reachable": d.reachable, "checked_at": d.checked_at })),
            "components": components.iter().map(|c| json!({
                "name": c.name,
                "state": breaker_state_str(c.breaker_state),
                "checked_at": c.checked_at,
            })).collect::<Vec<_>>(),
            "errors_per_minute": state.health.errors_per_minute().await,
            "fallback_activations_per_minute": state.health.fallback_activations_per_minute().await,
        }))
        .into_response()
    }

    pub async fn circuit_breakers(State(state): State<AppState>) -> Response {
        let components = state.health.components().await;
        Json(json!({
            "breakers": components.iter().map(|c| json!({ "name": c.name, "state": breaker_state_str(c.breaker_state) })).collect::<Vec<_>>(),
        }))
        .into_response()
    }

    pub async fn recovery_stats(State(state): State<AppState>) -> Response {
        Json(json!({
            "errors_per_minute": state.health.errors_per_minute().await,
            "fallback_activations_per_minute": state.health.fallback_activations_per_minute().await,
        }))
        .into_response()
    }
}

fn breaker_state_str(state: BreakerState) -> &'static str {
    match state {
        BreakerState::Closed => "closed",
        BreakerState::Open => "open",
        BreakerState::HalfOpen => "half_open",
    }
}
