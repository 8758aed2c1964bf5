// [libs/infra/db/tests/scenarios.rs]
//! End-to-end persistence scenarios from spec.md §8, driven straight
//! against an in-memory grant store with no network adapters involved.
//! These exercise the repository layer the way the gateway's handlers
//! and worker pool chain it together, without needing a live LLM,
//! embedding, or vector store to stand behind the HTTP surface.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus};
use grantwell_domain_models::profile::{ReportingComplexity, ResourceConstraints};
use grantwell_domain_models::{Grant, RunError, RunStatus, TriggerType};
use grantwell_infra_db::repositories::grant::{GrantRepository, UpsertOutcome};
use grantwell_infra_db::repositories::profile::{ProfileDraft, ProfileRepository};
use grantwell_infra_db::repositories::search_run::SearchRunRepository;
use grantwell_infra_db::repositories::user::UserRepository;
use grantwell_infra_db::GrantStoreClient;

fn sample_grant(source_url: &str) -> Grant {
    let now = Utc::now();
    Grant {
        id: Uuid::new_v4(),
        source_url: source_url.to_string(),
        title: "AI in Education Fund".to_string(),
        description: "Supports AI literacy programs in K-12 schools.".to_string(),
        funder_name: "Example Foundation".to_string(),
        sectors: vec!["education".to_string()],
        funding: FundingBounds { min_amount: Some(10_000.0), max_amount: Some(50_000.0) },
        deadline: None,
        geographic_scope: GeographicScope::Regional,
        eligible_regions: vec!["Louisiana".to_string()],
        status: RecordStatus::Active,
        score: Some(0.8),
        composite_score: Some(0.8),
        raw_source_data: HashMap::new(),
        first_found_at: now,
        retrieved_at: now,
        created_at: now,
        updated_at: now,
    }
}

fn profile_draft() -> ProfileDraft {
    ProfileDraft {
        narrative: "A nonprofit running after-school AI literacy programs.".to_string(),
        sectors: vec!["education".to_string()],
        focus_areas: vec!["AI in Education".to_string()],
        revenue_band: "under_1m".to_string(),
        team_size: 6,
        geographic_focus: vec!["Louisiana".to_string()],
        strategic_goals: vec!["expand_after_school_programs".to_string()],
        resource_constraints: ResourceConstraints {
            max_project_duration_months: 12,
            max_reporting_complexity: ReportingComplexity::Standard,
            max_budget_management_capacity: 50_000.0,
        },
    }
}

/// Scenario 1 (happy path): a run persists 13 scored candidates,
/// completes SUCCESS, and the triggering search consumed exactly one
/// unit of quota.
#[tokio::test]
async fn happy_path_run_persists_candidates_and_consumes_one_quota_unit() {
    let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
    let users = UserRepository::new(client.connection().expect("connection"));
    let profiles = ProfileRepository::new(client.connection().expect("connection"));
    let grants = GrantRepository::new(client.connection().expect("connection"));
    let search_runs = SearchRunRepository::new(client.connection().expect("connection"));

    let user = users.create("happy-path-subject").await.expect("create user");
    profiles.upsert(user.id, profile_draft()).await.expect("upsert profile");
    let run = search_runs.create(user.id, Uuid::new_v4(), TriggerType::Manual).await.expect("create run");

    let mut grants_new = 0u32;
    for i in 0..13 {
        let outcome = grants.upsert_candidate(user.id, sample_grant(&format!("https://example.gov/g{i}"))).await.expect("upsert");
        if matches!(outcome, UpsertOutcome::Inserted(_)) {
            grants_new += 1;
        }
    }
    assert_eq!(grants_new, 13);

    search_runs.complete(run.id, RunStatus::Success, false, 13, 13, None, &[]).await.expect("complete");
    assert!(users.try_increment_searches_used(user.id).await.expect("increment"));

    let completed = search_runs.find_by_id(run.id).await.expect("find").expect("present");
    assert_eq!(completed.status, RunStatus::Success);
    assert_eq!(completed.grants_new, 13);
    assert!(!completed.degraded);

    let reloaded_user = users.find_by_id(user.id).await.expect("find").expect("present");
    assert_eq!(reloaded_user.searches_used, 1);

    let ranked = grants.list_ranked_for_user(user.id, 5, 0).await.expect("list");
    assert_eq!(ranked.len(), 5);
}

/// Scenario 2 (degraded LLM): a run with the LLM unavailable completes
/// PARTIAL/degraded with zero grants found, and per spec.md §8's
/// "degraded-empty runs do not increment usage" policy, the handler
/// never calls `try_increment_searches_used` for this run at all.
#[tokio::test]
async fn degraded_run_persists_zero_grants_and_leaves_quota_untouched() {
    let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
    let users = UserRepository::new(client.connection().expect("connection"));
    let search_runs = SearchRunRepository::new(client.connection().expect("connection"));

    let user = users.create("degraded-subject").await.expect("create user");
    let run = search_runs.create(user.id, Uuid::new_v4(), TriggerType::Manual).await.expect("create run");

    search_runs
        .complete(run.id, RunStatus::Partial, true, 0, 0, Some(RunError::AdapterUnavailable), &["fallback=llm".to_string()])
        .await
        .expect("complete");

    let completed = search_runs.find_by_id(run.id).await.expect("find").expect("present");
    assert_eq!(completed.status, RunStatus::Partial);
    assert!(completed.degraded);
    assert_eq!(completed.grants_found, 0);

    let reloaded_user = users.find_by_id(user.id).await.expect("find").expect("present");
    assert_eq!(reloaded_user.searches_used, 0);
}

/// Scenario 4 (quota): a free-tier user already at their search limit
/// is rejected by the atomic quota check before any run is created.
#[tokio::test]
async fn quota_exhausted_user_is_rejected_before_a_run_is_created() {
    let client = GrantStoreClient::connect(":memory:", None).await.expect("connect");
    let users = UserRepository::new(client.connection().expect("connection"));

    let user = users.create("quota-exhausted-subject").await.expect("create user");
    for _ in 0..5 {
        assert!(users.try_increment_searches_used(user.id).await.expect("increment"));
    }

    let reloaded = users.find_by_id(user.id).await.expect("find").expect("present");
    assert_eq!(reloaded.searches_used, reloaded.subscription_tier.searches_limit());

    assert!(!users.try_increment_searches_used(user.id).await.expect("increment"));

    let final_state = users.find_by_id(user.id).await.expect("find").expect("present");
    assert_eq!(final_state.searches_used, 5);
}
