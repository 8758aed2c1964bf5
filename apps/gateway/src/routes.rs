// [apps/gateway/src/routes.rs]
//! Route composition: four strata (grants, applications, profile,
//! system) nested under `/api`, CORS applied globally, then
//! `health_guard` and `auth_guard` layered over the authenticated
//! nest only — `/health*` and `/api/system/info` stay reachable while
//! the rest of the surface is in maintenance or unauthenticated.

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::applications::ApplicationsHandler;
use crate::handlers::grants::{GrantsHandler, SystemSearchHandler};
use crate::handlers::health::HealthHandler;
use crate::handlers::profile::ProfileHandler;
use crate::handlers::system::{QuotaHandler, SystemInfoHandler};
use crate::middleware::{auth_guard, error_recorder, health_guard};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let grants_stratum = Router::new()
        .route("/", get(GrantsHandler::list))
        .route("/:id", get(GrantsHandler::get_by_id))
        .route("/search", post(GrantsHandler::trigger_search));

    let applications_stratum = Router::new()
        .route("/generate", post(ApplicationsHandler::generate))
        .route("/status/:task_id", get(ApplicationsHandler::status))
        .route("/feedback", post(ApplicationsHandler::feedback));

    let profile_stratum = Router::new()
        .route("/", get(ProfileHandler::get).put(ProfileHandler::put))
        .route("/documents", post(ProfileHandler::upload_document));

    let system_stratum = Router::new()
        .route("/run-search", post(SystemSearchHandler::run_search))
        .route("/quota", get(QuotaHandler::get));

    let authenticated_api = Router::new()
        .nest("/grants", grants_stratum)
        .nest("/applications", applications_stratum)
        .nest("/business-profile", profile_stratum)
        .nest("/system", system_stratum)
        .layer(middleware::from_fn_with_state(state.clone(), health_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    Router::new()
        .route("/health", get(HealthHandler::liveness))
        .route("/health/readiness", get(HealthHandler::readiness))
        .route("/health/detailed", get(HealthHandler::detailed))
        .route("/health/circuit-breakers", get(HealthHandler::circuit_breakers))
        .route("/health/recovery-stats", get(HealthHandler::recovery_stats))
        .route("/api/system/info", get(SystemInfoHandler::info))
        .nest("/api", authenticated_api)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.clone(), error_recorder))
        .with_state(state)
}

