// [apps/gateway/src/handlers/profile.rs]
//! GET/PUT /api/business-profile, POST /api/business-profile/documents.

use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use grantwell_domain_models::profile::{NARRATIVE_MAX_CHARS, ReportingComplexity, ResourceConstraints};
use grantwell_infra_db::repositories::profile::ProfileDraft;

use crate::errors::AppError;
use crate::state::{AppState, OperatorIdentity};

pub struct ProfileHandler;

#[derive(Debug, Deserialize)]
pub struct UpsertProfileRequest {
    pub narrative: String,
    pub sectors: Vec<String>,
    pub focus_areas: Vec<String>,
    pub revenue_band: String,
    pub team_size: u32,
    pub geographic_focus: Vec<String>,
    pub strategic_goals: Vec<String>,
    pub resource_constraints: ResourceConstraintsRequest,
}

#[derive(Debug, Deserialize)]
pub struct ResourceConstraintsRequest {
    pub max_project_duration_months: u32,
    pub max_reporting_complexity: ReportingComplexity,
    pub max_budget_management_capacity: f64,
}

#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    pub text: String,
}

impl ProfileHandler {
    #[tracing::instrument(skip(state))]
    pub async fn get(State(state): State<AppState>, Extension(identity): Extension<OperatorIdentity>) -> Result<Response, AppError> {
        let repo = state.profiles()?;
        let profile = repo.find_by_user(identity.user_id).await?.ok_or_else(|| AppError::not_found("business profile"))?;
        Ok(Json(profile).into_response())
    }

    #[tracing::instrument(skip(state, request))]
    pub async fn put(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Json(request): Json<UpsertProfileRequest>,
    ) -> Result<Response, AppError> {
        if request.narrative.chars().count() > NARRATIVE_MAX_CHARS {
            return Err(AppError::validation(
                "narrative exceeds the maximum allowed length",
                json!({ "max_chars": NARRATIVE_MAX_CHARS, "actual_chars": request.narrative.chars().count() }),
            ));
        }
        if request.sectors.is_empty() {
            return Err(AppError::validation("at least one sector is required", json!({ "field": "sectors" })));
        }

        let draft = ProfileDraft {
            narrative: request.narrative,
            sectors: request.sectors,
            focus_areas: request.focus_areas,
            revenue_band: request.revenue_band,
            team_size: request.team_size,
            geographic_focus: request.geographic_focus,
            strategic_goals: request.strategic_goals,
            resource_constraints: ResourceConstraints {
                max_project_duration_months: request.resource_constraints.max_project_duration_months,
                max_reporting_complexity: request.resource_constraints.max_reporting_complexity,
                max_budget_management_capacity: request.resource_constraints.max_budget_management_capacity,
            },
        };

        let repo = state.profiles()?;
        let profile = repo.upsert(identity.user_id, draft).await?;
        Ok(Json(profile).into_response())
    }

    /// Accepts a narrative document, embeds it via the embedding
    /// breaker, and upserts the resulting chunks into the user's
    /// vector namespace — the step `execute_search` checks for via
    /// `embeddings_generated_at` before a research run can proceed.
    #[tracing::instrument(skip(state, request))]
    pub async fn upload_document(
        State(state): State<AppState>,
        Extension(identity): Extension<OperatorIdentity>,
        Json(request): Json<UploadDocumentRequest>,
    ) -> Result<Response, AppError> {
        if request.text.trim().is_empty() {
            return Err(AppError::validation("document text must not be empty", json!({ "field": "text" })));
        }

        let profiles = state.profiles()?;
        let profile = profiles.find_by_user(identity.user_id).await?.ok_or_else(|| AppError::not_found("business profile"))?;

        let chunks = grantwell_domain_rag::chunk_narrative(&request.text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let embedder = state.embedding_adapter.clone();
        let embeddings = state.embedding_breaker.call(|| async move { embedder.embed(&texts).await }).await?;

        let namespace = grantwell_domain_models::BusinessProfile::namespace_for(identity.user_id);
        let vector_chunks: Vec<grantwell_infra_vector::Chunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| grantwell_infra_vector::Chunk {
                chunk_id: chunk.chunk_id,
                namespace: namespace.clone(),
                text: chunk.text,
                embedding,
            })
            .collect();

        let vector_index = state.vector_index.clone();
        let to_upsert = vector_chunks.clone();
        state.vector_breaker.call(|| async move { vector_index.upsert(&to_upsert).await }).await?;
        profiles.mark_embeddings_generated(profile.id, &namespace).await?;

        Ok(Json(json!({ "chunks_indexed": vector_chunks.len(), "namespace": namespace })).into_response())
    }
}
