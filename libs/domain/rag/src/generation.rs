// [libs/domain/rag/src/generation.rs]
//! Six-section generation: one LLM call per section, in a fixed order,
//! grounded in the retrieved narrative chunks. A section failure is
//! recorded and generation continues; the draft is never discarded for
//! a single bad call.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use grantwell_domain_models::grant::Grant;
use grantwell_domain_models::profile::BusinessProfile;
use grantwell_domain_models::{GeneratedApplication, GeneratedApplicationStatus};
use grantwell_infra_adapters::{LlmAdapter, LlmRequest};
use grantwell_infra_resilience::{Breaker, BreakerError};
use grantwell_infra_vector::ScoredChunk;
use uuid::Uuid;

/// Target word-count bounds per section; translated into a token
/// budget at the call site since the adapter bills in tokens.
pub const MIN_SECTION_WORDS: u32 = 200;
pub const MAX_SECTION_WORDS: u32 = 600;
/// Rough words-per-token ratio for English prose, used only to size
/// the request's `max_tokens`; the model is still asked in the prompt
/// to stay within the word bounds.
const TOKENS_PER_WORD: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    ExecutiveSummary,
    NeedsStatement,
    ProjectDescription,
    BudgetNarrative,
    OrganizationalCapacity,
    ImpactStatement,
}

impl Section {
    /// Fixed generation order, matching the section order in the
    /// persisted `GeneratedApplication` record.
    pub const ORDER: [Section; 6] = [
        Section::ExecutiveSummary,
        Section::NeedsStatement,
        Section::ProjectDescription,
        Section::BudgetNarrative,
        Section::OrganizationalCapacity,
        Section::ImpactStatement,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::ExecutiveSummary => "executive_summary",
            Section::NeedsStatement => "needs_statement",
            Section::ProjectDescription => "project_description",
            Section::BudgetNarrative => "budget_narrative",
            Section::OrganizationalCapacity => "organizational_capacity",
            Section::ImpactStatement => "impact_statement",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Section::ExecutiveSummary => "Write an executive summary introducing the organization and the funding request.",
            Section::NeedsStatement => "Write a needs statement explaining the problem this funding would address.",
            Section::ProjectDescription => "Write a project description covering the planned activities and timeline.",
            Section::BudgetNarrative => "Write a budget narrative justifying how the requested funds would be used.",
            Section::OrganizationalCapacity => "Write an organizational capacity section describing why this organization can execute the project.",
            Section::ImpactStatement => "Write an impact statement describing the expected outcomes and how they will be measured.",
        }
    }
}

pub struct RagGenerator {
    llm: Arc<dyn LlmAdapter>,
    llm_breaker: Arc<Breaker>,
    model_identifier: String,
}

struct SectionResult {
    text: String,
    tokens: u32,
}

impl RagGenerator {
    pub fn new(llm: Arc<dyn LlmAdapter>, llm_breaker: Arc<Breaker>, model_identifier: impl Into<String>) -> Self {
        RagGenerator { llm, llm_breaker, model_identifier: model_identifier.into() }
    }

    /// Each section is its own breaker-wrapped call: a section that
    /// fails because the circuit is open is indistinguishable, from the
    /// caller's side, from one that failed outright — both are recorded
    /// in `sections_failed` and the remaining sections still get a shot.
    async fn generate_section(&self, section: Section, grant: &Grant, context_chunks: &[ScoredChunk]) -> Option<SectionResult> {
        let context = context_chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n---\n");
        let request = LlmRequest {
            system_prompt: format!(
                "You draft grant application sections. {} Write between {MIN_SECTION_WORDS} and {MAX_SECTION_WORDS} words. \
                 Ground every claim in the provided business narrative excerpts; never invent facts not supported by them.",
                section.instruction(),
            ),
            user_prompt: format!(
                "Grant: {}\nGrant description: {}\nBusiness narrative excerpts:\n{context}",
                grant.title, grant.description,
            ),
            temperature: 0.4,
            max_tokens: (MAX_SECTION_WORDS as f32 * TOKENS_PER_WORD) as u32,
        };

        match self.llm_breaker.call(|| async { self.llm.complete(&request).await }).await {
            Ok(response) => Some(SectionResult { text: response.text, tokens: response.prompt_tokens + response.completion_tokens }),
            Err(BreakerError::Open) => {
                tracing::warn!(section = section.key(), "section generation skipped, llm circuit breaker is open");
                None
            }
            Err(BreakerError::Inner(error)) => {
                tracing::warn!(section = section.key(), error = %error, "section generation failed");
                None
            }
        }
    }

    /// Generates all six sections in fixed order. Sections are not
    /// generated concurrently: later sections (budget narrative,
    /// impact statement) read more naturally when they can reference
    /// what earlier sections already committed to, so each call is
    /// awaited before the next begins.
    pub async fn generate_application(&self, application_id: Uuid, _profile: &BusinessProfile, grant: &Grant, context_chunks: &[ScoredChunk]) -> GeneratedApplication {
        let started = Instant::now();
        let mut sections: std::collections::HashMap<&'static str, String> = std::collections::HashMap::new();
        let mut sections_failed = Vec::new();
        let mut tokens_used = 0u32;

        for section in Section::ORDER {
            match self.generate_section(section, grant, context_chunks).await {
                Some(result) => {
                    tokens_used += result.tokens;
                    sections.insert(section.key(), result.text);
                }
                None => sections_failed.push(section.key().to_string()),
            }
        }

        GeneratedApplication {
            id: Uuid::new_v4(),
            application_id,
            // GENERATED regardless of partial section failure, per
            // spec.md §8 scenario 5: DRAFT is reserved for a document
            // that has not gone through generation at all.
            status: GeneratedApplicationStatus::Generated,
            executive_summary: sections.remove(Section::ExecutiveSummary.key()),
            needs_statement: sections.remove(Section::NeedsStatement.key()),
            project_description: sections.remove(Section::ProjectDescription.key()),
            budget_narrative: sections.remove(Section::BudgetNarrative.key()),
            organizational_capacity: sections.remove(Section::OrganizationalCapacity.key()),
            impact_statement: sections.remove(Section::ImpactStatement.key()),
            sections_failed,
            tokens_used,
            generation_duration_ms: started.elapsed().as_millis() as u64,
            model_identifier: self.model_identifier.clone(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc as ChronoUtc;
    use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus};
    use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
    use grantwell_infra_adapters::{AdapterError, LlmResponse};
    use grantwell_infra_resilience::BreakerConfig;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_breaker() -> Arc<Breaker> {
        Arc::new(Breaker::new("test-llm", BreakerConfig { failure_threshold: 100, ..Default::default() }))
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl LlmAdapter for AlwaysSucceeds {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, AdapterError> {
            Ok(LlmResponse { text: "generated section text".into(), prompt_tokens: 10, completion_tokens: 10 })
        }
    }

    struct FailsOnSecondCall {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmAdapter for FailsOnSecondCall {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, AdapterError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                Err(AdapterError::Unauthorized)
            } else {
                Ok(LlmResponse { text: "ok".into(), prompt_tokens: 1, completion_tokens: 1 })
            }
        }
    }

    fn profile() -> BusinessProfile {
        BusinessProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            narrative: "narrative".into(),
            sectors: vec![],
            focus_areas: vec![],
            revenue_band: "under_1m".into(),
            team_size: 3,
            geographic_focus: vec![],
            strategic_goals: vec![],
            resource_constraints: ResourceConstraints {
                max_project_duration_months: 12,
                max_reporting_complexity: ReportingComplexity::Standard,
                max_budget_management_capacity: 50_000.0,
            },
            vector_namespace: "user_test".into(),
            embeddings_generated_at: None,
            updated_at: ChronoUtc::now(),
        }
    }

    fn grant() -> Grant {
        Grant {
            id: Uuid::new_v4(),
            source_url: "https://example.gov/g".into(),
            title: "Test Grant".into(),
            description: "A test grant.".into(),
            funder_name: "Tester".into(),
            sectors: vec![],
            funding: FundingBounds { min_amount: None, max_amount: None },
            deadline: None,
            geographic_scope: GeographicScope::Local,
            eligible_regions: vec![],
            status: RecordStatus::Active,
            score: None,
            composite_score: None,
            raw_source_data: HashMap::new(),
            first_found_at: ChronoUtc::now(),
            retrieved_at: ChronoUtc::now(),
            created_at: ChronoUtc::now(),
            updated_at: ChronoUtc::now(),
        }
    }

    #[tokio::test]
    async fn all_sections_succeed_yields_complete_draft() {
        let generator = RagGenerator::new(Arc::new(AlwaysSucceeds), test_breaker(), "gpt-4o-mini");
        let draft = generator.generate_application(Uuid::new_v4(), &profile(), &grant(), &[]).await;
        assert!(draft.is_complete());
        assert_eq!(draft.status, GeneratedApplicationStatus::Generated);
        assert_eq!(draft.tokens_used, 120);
        assert_eq!(draft.model_identifier, "gpt-4o-mini");
        assert!(draft.executive_summary.is_some());
        assert!(draft.impact_statement.is_some());
    }

    #[tokio::test]
    async fn one_section_failing_marks_partial_but_keeps_others() {
        let generator = RagGenerator::new(Arc::new(FailsOnSecondCall { calls: AtomicUsize::new(0) }), test_breaker(), "gpt-4o-mini");
        let draft = generator.generate_application(Uuid::new_v4(), &profile(), &grant(), &[]).await;
        assert!(!draft.is_complete());
        assert_eq!(draft.status, GeneratedApplicationStatus::Generated);
        assert_eq!(draft.sections_failed, vec![Section::NeedsStatement.key().to_string()]);
        assert!(draft.executive_summary.is_some());
        assert!(draft.project_description.is_some());
    }
}
