// [apps/gateway/src/handlers/applications.rs]
//! POST /api/applications/generate, GET /api/applications/status/{task_id},
//! POST /api/applications/feedback.
//!
//! Generation runs synchronously inside the request rather than through
//! a task queue: the six-section LLM draft the teacher's pipeline would
//! hand to a background worker instead runs inline, bounded by the
//! `llm_breaker`, and the `task_id` the status route polls is simply the
//! `ApplicationHistory` id the generate call already returned.

use axum::extract::{Extension, Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use grantwell_domain_models::ApplicationStatus;
use grantwell_domain_rag::build_query_text;
use grantwell_infra_vector::ScoredChunk;

use crate::errors::AppError;
use crate::state::{AppState, OperatorIdentity};

pub struct ApplicationsHandler;

#[derive(Debug, Deserialize)]
pub struct GenerateApplicationRequest {
    pub grant_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

impl ApplicationsHandler {
    #[tracing::instrument(skip(state))]
    pub async fn generate(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Json(request): Json<GenerateApplicationRequest>,
    ) -> Result<Response, AppError> {
        let users = state.users()?;
        if !users.try_increment_applications_used(identity.user_id).await? {
            return Err(AppError::quota_exceeded("application quota exhausted for this billing period"));
        }

        let profiles = state.profiles()?;
        let profile = profiles.find_by_user(identity.user_id).await?.ok_or_else(|| AppError::not_found("business profile"))?;

        let grants = state.grants()?;
        let grant = grants.find_by_id(identity.user_id, request.grant_id).await?.ok_or_else(|| AppError::not_found("grant"))?;

        let applications = state.applications()?;
        let history = applications.create(identity.user_id, grant.id).await?;

        let eligibility_summary = grant.eligible_regions.join(", ");
        let query_text = build_query_text(&grant, &eligibility_summary);

        let context_chunks: Vec<ScoredChunk> = if profile.embeddings_generated_at.is_some() {
            let retrieval = retrieve_with_breakers(&state, &profile.vector_namespace, &query_text).await;
            match retrieval {
                Ok(chunks) => chunks,
                Err(error) => {
                    tracing::warn!(%error, "retrieval unavailable, generating without grounding context");
                    state.health.record_fallback().await;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let generated = state.rag_generator.generate_application(history.id, &profile, &grant, &context_chunks).await;

        let saved = applications.save_generated(history.id, generated).await?;
        Ok(Json(saved).into_response())
    }

    #[tracing::instrument(skip(state))]
    pub async fn status(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Path(task_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let applications = state.applications()?;
        let history = applications.find_by_id(task_id).await?.ok_or_else(|| AppError::not_found("application"))?;
        if history.user_id != identity.user_id {
            return Err(AppError::not_found("application"));
        }

        let generated = applications.find_latest_generated(task_id).await?;
        Ok(Json(json!({ "application": history, "generated": generated })).into_response())
    }

    #[tracing::instrument(skip(state))]
    pub async fn feedback(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Json(request): Json<FeedbackRequest>,
    ) -> Result<Response, AppError> {
        let applications = state.applications()?;
        let history = applications.find_by_id(request.application_id).await?.ok_or_else(|| AppError::not_found("application"))?;
        if history.user_id != identity.user_id {
            return Err(AppError::not_found("application"));
        }

        applications.update_status(request.application_id, request.status, request.notes).await?;
        Ok(Json(json!({ "ok": true })).into_response())
    }
}

/// Retrieval is two distinct dependencies, each behind its own breaker:
/// the embedding call trips `embedding_breaker`, the namespace query
/// trips `vector_breaker`. Folding both under one breaker would let a
/// vector-store outage look like an embedding outage in `/health`.
async fn retrieve_with_breakers(state: &AppState, namespace: &str, query_text: &str) -> Result<Vec<ScoredChunk>, AppError> {
    let embedder = state.embedding_adapter.clone();
    let text = query_text.to_string();
    let mut embeddings = state.embedding_breaker.call(|| async move { embedder.embed(std::slice::from_ref(&text)).await }).await?;
    let embedding = embeddings.pop().unwrap_or_default();

    let vector_index = state.vector_index.clone();
    let namespace = namespace.to_string();
    let chunks = state
        .vector_breaker
        .call(|| async move { vector_index.query(&namespace, embedding, grantwell_domain_rag::TOP_K).await })
        .await?;
    Ok(chunks)
}
