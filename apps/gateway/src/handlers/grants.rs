// [apps/gateway/src/handlers/grants.rs]
//! GET /api/grants, GET /api/grants/{id}, POST /api/grants/search,
//! POST /api/system/run-search.

use axum::extract::{Extension, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use grantwell_domain_models::grant::{GeographicScope, RecordStatus};
use grantwell_domain_models::{Grant, TriggerType};

use crate::errors::AppError;
use crate::services::worker_pool::SearchJob;
use crate::state::{AppState, OperatorIdentity};

pub struct GrantsHandler;

#[derive(Debug, Deserialize)]
pub struct ListGrantsQuery {
    pub status: Option<String>,
    pub sector: Option<String>,
    pub geographic_scope: Option<String>,
    pub min_score: Option<f64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListGrantsResponse {
    pub grants: Vec<Grant>,
    pub total_returned: usize,
}

impl GrantsHandler {
    #[tracing::instrument(skip(state))]
    pub async fn list(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Query(query): Query<ListGrantsQuery>,
    ) -> Result<Response, AppError> {
        let limit = query.limit.unwrap_or(50).min(200);
        let offset = query.offset.unwrap_or(0);

        let repo = state.grants()?;
        let user_id = identity.user_id;
        let mut grants = state.db_breaker.call(|| async move { repo.list_ranked_for_user(user_id, limit, offset).await }).await?;

        if let Some(status) = &query.status {
            grants.retain(|g| record_status_matches(g.status, status));
        }
        if let Some(sector) = &query.sector {
            grants.retain(|g| g.sectors.iter().any(|s| s.eq_ignore_ascii_case(sector)));
        }
        if let Some(scope) = &query.geographic_scope {
            grants.retain(|g| geographic_scope_matches(g.geographic_scope, scope));
        }
        if let Some(min_score) = query.min_score {
            grants.retain(|g| g.composite_score.unwrap_or(0.0) >= min_score);
        }

        Ok(Json(ListGrantsResponse { total_returned: grants.len(), grants }).into_response())
    }

    #[tracing::instrument(skip(state))]
    pub async fn get_by_id(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Path(grant_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let repo = state.grants()?;
        let user_id = identity.user_id;
        let grant = state.db_breaker.call(|| async move { repo.find_by_id(user_id, grant_id).await }).await?.ok_or_else(|| AppError::not_found("grant"))?;
        Ok(Json(grant).into_response())
    }

    #[tracing::instrument(skip(state))]
    pub async fn trigger_search(State(state): State<AppState>, Extension(identity): Extension<OperatorIdentity>) -> Result<Response, AppError> {
        enqueue_search(&state, identity.user_id, TriggerType::Manual).await
    }
}

pub struct SystemSearchHandler;

impl SystemSearchHandler {
    #[tracing::instrument(skip(state))]
    pub async fn run_search(State(state): State<AppState>, Extension(identity): Extension<OperatorIdentity>) -> Result<Response, AppError> {
        enqueue_search(&state, identity.user_id, TriggerType::Manual).await
    }
}

/// Quota is only committed once the job is durably on the queue: every
/// early-return path below (in-flight conflict, missing profile, queue
/// full) must leave `searches_used` untouched, per spec.md §8 scenario
/// 2 ("degraded-empty runs do not increment usage"). The pre-check
/// against the user's current counters fails fast without mutating
/// anything; the actual commit is the atomic `try_increment_searches_used`
/// call made only after `try_send` succeeds.
async fn enqueue_search(state: &AppState, user_id: Uuid, trigger: TriggerType) -> Result<Response, AppError> {
    let users = state.users()?;
    let user = users.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("user"))?;

    if user.searches_used >= user.subscription_tier.searches_limit() {
        return Err(AppError::quota_exceeded("search quota exhausted for this billing period"));
    }

    if state.is_run_in_flight(user_id).await {
        return Err(AppError::new(crate::errors::ErrorKind::Conflict, "a search run is already in flight for this user"));
    }

    let profiles = state.profiles()?;
    let profile = profiles.find_by_user(user_id).await?.ok_or_else(|| AppError::validation("business profile must be created before a search can run", serde_json::json!({})))?;

    let search_runs = state.search_runs()?;
    let run = search_runs.create(user_id, profile.id, trigger).await?;

    if !state.try_start_run(user_id).await {
        let _ = search_runs.cancel_if_running(run.id).await;
        return Err(AppError::new(crate::errors::ErrorKind::Conflict, "a search run is already in flight for this user"));
    }

    let job = SearchJob { user_id, profile_id: profile.id, search_run_id: run.id, trigger };
    if state.job_sender.try_send(job).is_err() {
        state.finish_run(user_id).await;
        let _ = search_runs.cancel_if_running(run.id).await;
        return Err(AppError::new(crate::errors::ErrorKind::ServiceUnavailable, "search queue is full, try again shortly").with_retry_after(30));
    }

    if !users.try_increment_searches_used(user_id).await? {
        tracing::warn!(%user_id, "quota raced past the limit between the pre-check and commit; job is already queued and runs regardless");
    }

    Ok(Json(run).into_response())
}

fn record_status_matches(status: RecordStatus, filter: &str) -> bool {
    match filter.to_ascii_lowercase().as_str() {
        "draft" => status == RecordStatus::Draft,
        "active" => status == RecordStatus::Active,
        "expired" => status == RecordStatus::Expired,
        "archived" => status == RecordStatus::Archived,
        _ => true,
    }
}

fn geographic_scope_matches(scope: GeographicScope, filter: &str) -> bool {
    match filter.to_ascii_lowercase().as_str() {
        "national" => scope == GeographicScope::National,
        "regional" => scope == GeographicScope::Regional,
        "local" => scope == GeographicScope::Local,
        _ => true,
    }
}
