// [libs/domain/research/src/orchestrator.rs]
//! The recursive chunked search: builds a plan, issues one bounded LLM
//! call per chunk, optionally refines each chunk's output, and folds
//! everything into scored candidates plus a record of what failed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use grantwell_domain_models::config::SectorConfig;
use grantwell_domain_models::profile::BusinessProfile;
use grantwell_domain_models::FundingBounds;
use grantwell_infra_adapters::{AdapterError, LlmAdapter, LlmRequest};
use grantwell_infra_resilience::{Breaker, BreakerError};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::layer1::{best_sector_relevance, geographic_relevance, infer_reporting_complexity, operational_alignment};
use crate::parsing::{parse_candidates, parse_deadline, parse_funding, RawCandidate};
use crate::plan::{build_search_plan, ChunkSpec, GeographicTier};

pub const DEFAULT_CHUNK_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_CHUNK_CONCURRENCY: usize = 4;
pub const REFINEMENT_TEMPERATURE: f32 = 0.5;
pub const REFINEMENT_MAX_TOKENS: u32 = 1500;
/// A candidate's source page is considered stale past this age; stale
/// candidates are kept but down-weighted at composite time.
pub const STALE_AFTER_DAYS: i64 = 60;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    pub title: String,
    pub description: String,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub funding: FundingBounds,
    pub eligibility: Option<String>,
    pub tier: GeographicTier,
    pub sector_relevance: f64,
    pub geographic_relevance: f64,
    pub operational_alignment: f64,
    pub stale: bool,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ChunkFailure {
    pub chunk: ChunkSpec,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcomeStatus {
    Completed,
    Partial,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub candidates: Vec<EnrichedCandidate>,
    pub failed_chunks: Vec<ChunkFailure>,
    pub status: RunOutcomeStatus,
}

pub struct ResearchAgent {
    llm: Arc<dyn LlmAdapter>,
    llm_breaker: Arc<Breaker>,
    chunk_max_tokens: u32,
    chunk_concurrency: usize,
    refine: bool,
}

impl ResearchAgent {
    /// `llm_breaker` is the same breaker the gateway's other LLM-bound
    /// call sites share: this is the highest-volume consumer (up to
    /// `chunk_concurrency`-wide fan-out per run), so it must observe the
    /// same circuit the rest of the system trips on.
    pub fn new(llm: Arc<dyn LlmAdapter>, llm_breaker: Arc<Breaker>) -> Self {
        ResearchAgent { llm, llm_breaker, chunk_max_tokens: DEFAULT_CHUNK_MAX_TOKENS, chunk_concurrency: DEFAULT_CHUNK_CONCURRENCY, refine: false }
    }

    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    pub fn with_chunk_max_tokens(mut self, tokens: u32) -> Self {
        self.chunk_max_tokens = tokens;
        self
    }

    #[tracing::instrument(skip(self, profile, sectors))]
    pub async fn run(&self, profile: &BusinessProfile, sectors: &[SectorConfig]) -> RunOutcome {
        let plan = build_search_plan(&profile.focus_areas);
        tracing::info!(chunks = plan.len(), "research agent starting run");

        let results: Vec<Result<Vec<EnrichedCandidate>, ChunkFailure>> = stream::iter(plan.into_iter())
            .map(|chunk| self.run_chunk(chunk, profile, sectors))
            .buffer_unordered(self.chunk_concurrency)
            .collect()
            .await;

        let mut candidates = Vec::new();
        let mut failed_chunks = Vec::new();
        for result in results {
            match result {
                Ok(mut chunk_candidates) => candidates.append(&mut chunk_candidates),
                Err(failure) => failed_chunks.push(failure),
            }
        }

        let total_chunks = candidates.len() + failed_chunks.len();
        let status = if failed_chunks.is_empty() {
            RunOutcomeStatus::Completed
        } else if failed_chunks.len() == total_chunks && total_chunks > 0 {
            RunOutcomeStatus::Failed
        } else {
            RunOutcomeStatus::Partial
        };

        RunOutcome { candidates, failed_chunks, status }
    }

    async fn run_chunk(&self, chunk: ChunkSpec, profile: &BusinessProfile, sectors: &[SectorConfig]) -> Result<Vec<EnrichedCandidate>, ChunkFailure> {
        let request = LlmRequest {
            system_prompt: chunk_system_prompt(),
            user_prompt: chunk_user_prompt(&chunk, profile),
            temperature: 0.2,
            max_tokens: self.chunk_max_tokens,
        };

        let response = self
            .llm_breaker
            .call(|| async { self.llm.complete(&request).await })
            .await
            .map_err(|e| ChunkFailure { chunk: chunk.clone(), reason: describe_breaker_error(e) })?;

        let mut raw_candidates = parse_candidates(&response.text);

        if self.refine && !raw_candidates.is_empty() {
            if let Ok(refined) = self.refine_chunk(&chunk, &response.text).await {
                raw_candidates = refined;
            }
        }

        let now = Utc::now();
        let enriched = raw_candidates
            .into_iter()
            .map(|raw| self.enrich(raw, &chunk, profile, sectors, now))
            .collect();

        Ok(enriched)
    }

    async fn refine_chunk(&self, chunk: &ChunkSpec, previous_text: &str) -> Result<Vec<RawCandidate>, String> {
        let request = LlmRequest {
            system_prompt: refinement_system_prompt(),
            user_prompt: format!("Normalize dates, funding bounds, and sector tags in this JSON for the {} / {} search:\n\n{previous_text}", chunk.focus_area, chunk.tier.as_str()),
            temperature: REFINEMENT_TEMPERATURE,
            max_tokens: REFINEMENT_MAX_TOKENS,
        };
        let response = self.llm_breaker.call(|| async { self.llm.complete(&request).await }).await.map_err(describe_breaker_error)?;
        Ok(parse_candidates(&response.text))
    }

    fn enrich(&self, raw: RawCandidate, chunk: &ChunkSpec, profile: &BusinessProfile, sectors: &[SectorConfig], now: DateTime<Utc>) -> EnrichedCandidate {
        let title = raw.title.unwrap_or_default();
        let description = raw.description.unwrap_or_default();
        let searchable_text = format!("{title} {description} {}", raw.eligibility.as_deref().unwrap_or_default());

        let funding = raw.funding.as_deref().map(parse_funding).unwrap_or(FundingBounds { min_amount: None, max_amount: None });
        let deadline = raw.deadline.as_deref().and_then(parse_deadline);
        let reporting_hint = infer_reporting_complexity(&description);

        EnrichedCandidate {
            sector_relevance: best_sector_relevance(&searchable_text, sectors),
            geographic_relevance: geographic_relevance(chunk.tier),
            operational_alignment: operational_alignment(funding.midpoint(), reporting_hint, &profile.resource_constraints),
            title,
            description,
            source_url: raw.source_url,
            source_name: raw.source_name,
            deadline,
            funding,
            eligibility: raw.eligibility,
            tier: chunk.tier,
            stale: false,
            observed_at: now,
        }
    }
}

fn chunk_system_prompt() -> String {
    "You are a grant research assistant. Respond with a JSON array of grant objects. \
     Each object must include: title, description, source_url, deadline, funding, eligibility, source_name. \
     Omit any grant you are not confident is real and currently open."
        .to_string()
}

fn chunk_user_prompt(chunk: &ChunkSpec, profile: &BusinessProfile) -> String {
    format!(
        "Find {} funding opportunities for a business in the \"{}\" focus area. \
         Business narrative: {} Sectors: {}.",
        chunk.tier.as_str(),
        chunk.focus_area,
        profile.narrative,
        profile.sectors.join(", "),
    )
}

fn refinement_system_prompt() -> String {
    "You normalize grant search results. Return the same JSON array with deadlines in ISO-8601 \
     and funding amounts in plain numeric ranges. Do not invent grants that were not present in the input."
        .to_string()
}

fn describe_error(error: &AdapterError) -> String {
    match error {
        AdapterError::Network(e) => format!("network error: {e}"),
        AdapterError::Decoding(msg) => format!("decoding error: {msg}"),
        AdapterError::ServerRejection { status, .. } => format!("server rejected request: {status}"),
        AdapterError::RateLimited { retry_after_secs } => format!("rate limited, retry after {retry_after_secs}s"),
        AdapterError::Unauthorized => "unauthorized".to_string(),
    }
}

fn describe_breaker_error(error: BreakerError<AdapterError>) -> String {
    match error {
        BreakerError::Open => "llm circuit breaker is open".to_string(),
        BreakerError::Inner(inner) => describe_error(&inner),
    }
}

/// Stamps candidates older than `STALE_AFTER_DAYS` at `reference_time`
/// relative to `observed_at`; applied against any candidate that turned
/// out to be a refresh of a previously-indexed grant rather than a
/// fresh discovery, which the pipeline determines at dedup time.
pub fn mark_stale_if_old(candidate: &mut EnrichedCandidate, reference_time: DateTime<Utc>) {
    candidate.stale = (reference_time - candidate.observed_at).num_days() > STALE_AFTER_DAYS;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
    use grantwell_infra_adapters::LlmResponse;
    use grantwell_infra_resilience::BreakerConfig;
    use uuid::Uuid;

    fn test_breaker() -> Arc<Breaker> {
        Arc::new(Breaker::new("test-llm", BreakerConfig { failure_threshold: 100, ..Default::default() }))
    }

    struct StubLlm {
        response_text: String,
    }

    #[async_trait]
    impl LlmAdapter for StubLlm {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, AdapterError> {
            Ok(LlmResponse { text: self.response_text.clone(), prompt_tokens: 10, completion_tokens: 10 })
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmAdapter for FailingLlm {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, AdapterError> {
            Err(AdapterError::Unauthorized)
        }
    }

    fn profile() -> BusinessProfile {
        BusinessProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            narrative: "A fintech startup focused on rural lending.".into(),
            sectors: vec!["fintech".into()],
            focus_areas: vec!["rural_lending".into()],
            revenue_band: "under_1m".into(),
            team_size: 5,
            geographic_focus: vec!["midwest".into()],
            strategic_goals: vec!["financial_inclusion".into()],
            resource_constraints: ResourceConstraints {
                max_project_duration_months: 18,
                max_reporting_complexity: ReportingComplexity::Standard,
                max_budget_management_capacity: 200_000.0,
            },
            vector_namespace: "user_test".into(),
            embeddings_generated_at: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn successful_run_scores_every_candidate() {
        let text = r#"[{"title":"Rural Lending Fund","description":"supports rural fintech lenders","source_url":"https://example.gov/rlf","deadline":"2026-12-01","funding":"$50,000"}]"#;
        let agent = ResearchAgent::new(Arc::new(StubLlm { response_text: text.to_string() }), test_breaker());
        let outcome = agent.run(&profile(), &[]).await;

        assert_eq!(outcome.status, RunOutcomeStatus::Completed);
        assert!(outcome.failed_chunks.is_empty());
        assert_eq!(outcome.candidates.len(), 4);
        assert!(outcome.candidates.iter().all(|c| c.title == "Rural Lending Fund"));
    }

    #[tokio::test]
    async fn every_chunk_failing_marks_run_failed() {
        let agent = ResearchAgent::new(Arc::new(FailingLlm), test_breaker());
        let outcome = agent.run(&profile(), &[]).await;
        assert_eq!(outcome.status, RunOutcomeStatus::Failed);
        assert_eq!(outcome.failed_chunks.len(), 4);
    }

    /// Scenario 2 (degraded LLM): the breaker is already OPEN before
    /// the run starts, so every chunk is rejected without a single
    /// request reaching the adapter.
    #[tokio::test]
    async fn open_breaker_fails_every_chunk_without_calling_the_adapter() {
        let breaker = Arc::new(Breaker::new("test-llm", BreakerConfig { failure_threshold: 1, ..Default::default() }));
        breaker.call(|| async { Err::<(), AdapterError>(AdapterError::Unauthorized) }).await.ok();

        let agent = ResearchAgent::new(Arc::new(FailingLlm), breaker);
        let outcome = agent.run(&profile(), &[]).await;

        assert_eq!(outcome.status, RunOutcomeStatus::Failed);
        assert!(outcome.failed_chunks.iter().all(|f| f.reason.contains("circuit breaker is open")));
    }

    #[test]
    fn stale_stamped_past_sixty_days() {
        let mut candidate = EnrichedCandidate {
            title: "x".into(),
            description: "x".into(),
            source_url: None,
            source_name: None,
            deadline: None,
            funding: FundingBounds { min_amount: None, max_amount: None },
            eligibility: None,
            tier: GeographicTier::Local,
            sector_relevance: 0.0,
            geographic_relevance: 0.0,
            operational_alignment: 0.0,
            stale: false,
            observed_at: Utc::now() - chrono::Duration::days(90),
        };
        mark_stale_if_old(&mut candidate, Utc::now());
        assert!(candidate.stale);
    }
}
