// [apps/gateway/src/services/worker_pool.rs]
//! Fixed worker pool consuming the bounded job queue. Each worker is
//! logically single-threaded (it never runs two jobs concurrently) but
//! the pool as a whole is genuinely parallel across `tokio::spawn`
//! tasks, per spec.md §4.9 and §5's scheduling model.
//!
//! The queue itself is an `mpsc` channel rather than the teacher's
//! `Mutex<VecDeque>`: an `mpsc::Receiver::recv` suspends a worker until
//! a job arrives, which is what lets §5's "no CPU-bound loop without
//! yielding" rule hold without busy-polling a mutex-guarded deque.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use grantwell_domain_compliance::EvaluationOutcome;
use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus};
use grantwell_domain_models::{Grant, RunError, RunStatus, SearchRun, TriggerType};
use grantwell_domain_notification::SystemNotification;
use grantwell_domain_research::{mark_stale_if_old, GeographicTier as ResearchTier, RunOutcomeStatus};
use grantwell_infra_db::repositories::grant::UpsertOutcome;

use crate::state::AppState;

pub const HARD_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const SOFT_TIMEOUT: Duration = Duration::from_secs(9 * 60);

#[derive(Debug, Clone)]
pub struct SearchJob {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub search_run_id: Uuid,
    pub trigger: TriggerType,
}

pub fn spawn_worker_pool(state: AppState, receiver: tokio::sync::mpsc::Receiver<SearchJob>, pool_size: usize, shutdown: watch::Receiver<bool>) {
    let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

    for worker_id in 0..pool_size {
        let state = state.clone();
        let receiver = receiver.clone();
        let mut shutdown = shutdown.clone();

        tokio::spawn(async move {
            loop {
                let job = {
                    let mut guard = receiver.lock().await;
                    tokio::select! {
                        job = guard.recv() => job,
                        _ = shutdown.changed() => None,
                    }
                };

                let Some(job) = job else {
                    tracing::info!(worker_id, "worker shutting down");
                    break;
                };

                run_job_with_timeout(&state, job, worker_id).await;
            }
        });
    }
}

async fn run_job_with_timeout(state: &AppState, job: SearchJob, worker_id: usize) {
    let deadline = tokio::time::timeout(HARD_TIMEOUT, run_job(state, job.clone(), worker_id));
    match deadline.await {
        Ok(()) => {}
        Err(_) => {
            tracing::warn!(worker_id, search_run_id = %job.search_run_id, "job exceeded hard timeout");
            if let Ok(repo) = state.search_runs() {
                let _ = repo
                    .complete(job.search_run_id, RunStatus::Failed, true, 0, 0, Some(RunError::Cancelled), &["hard timeout exceeded".to_string()])
                    .await;
            }
            state.finish_run(job.user_id).await;
        }
    }
}

#[tracing::instrument(skip(state, job), fields(search_run_id = %job.search_run_id, worker_id))]
async fn run_job(state: &AppState, job: SearchJob, worker_id: usize) {
    tracing::info!(worker_id, search_run_id = %job.search_run_id, "worker picked up job");

    let outcome = tokio::time::timeout(SOFT_TIMEOUT, execute_search(state, &job)).await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            tracing::error!(search_run_id = %job.search_run_id, %reason, "search job failed");
            if let Ok(repo) = state.search_runs() {
                let _ = repo.complete(job.search_run_id, RunStatus::Failed, false, 0, 0, Some(RunError::Internal), &[reason]).await;
            }
        }
        Err(_) => {
            tracing::warn!(search_run_id = %job.search_run_id, "soft timeout elapsed, cancelling run");
            if let Ok(repo) = state.search_runs() {
                let _ = repo.cancel_if_running(job.search_run_id).await;
            }
        }
    }

    state.finish_run(job.user_id).await;
}

async fn execute_search(state: &AppState, job: &SearchJob) -> Result<(), String> {
    let profiles = state.profiles().map_err(|e| e.to_string())?;
    let profile = profiles
        .find_by_user(job.user_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("profile missing for user with an enqueued search job")?;

    if profile.embeddings_generated_at.is_none() {
        let repo = state.search_runs().map_err(|e| e.to_string())?;
        repo.complete(job.search_run_id, RunStatus::Failed, false, 0, 0, Some(RunError::NoProfileEmbeddings), &[]).await.map_err(|e| e.to_string())?;
        return Ok(());
    }

    let config_repo = state.configuration().map_err(|e| e.to_string())?;
    let sectors = config_repo.list_sectors().await.map_err(|e| e.to_string())?;
    let rules = config_repo.list_compliance_rules().await.map_err(|e| e.to_string())?;

    let run_outcome = state.research_agent.run(&profile, &sectors).await;

    let now = Utc::now();
    let grant_repo = state.grants().map_err(|e| e.to_string())?;

    let mut grants_new = 0u32;
    let mut grants_found = 0u32;

    for mut candidate in run_outcome.candidates {
        mark_stale_if_old(&mut candidate, now);
        let Some(source_url) = candidate.source_url.clone() else { continue };

        match state.compliance_agent.evaluate(candidate, &profile, &rules) {
            EvaluationOutcome::Rejected(rejected) => {
                tracing::debug!(rule_key = %rejected.rule_key, "candidate hard-rejected by compliance rule");
            }
            EvaluationOutcome::Scored(scored) => {
                grants_found += 1;
                let candidate = &scored.candidate;
                let draft = Grant {
                    id: Uuid::new_v4(),
                    source_url,
                    title: candidate.title.clone(),
                    description: candidate.description.clone(),
                    funder_name: candidate.source_name.clone().unwrap_or_else(|| "Unknown funder".to_string()),
                    sectors: profile.sectors.clone(),
                    funding: FundingBounds { min_amount: candidate.funding.min_amount, max_amount: candidate.funding.max_amount },
                    deadline: candidate.deadline,
                    geographic_scope: geographic_scope_for(candidate.tier),
                    eligible_regions: profile.geographic_focus.clone(),
                    status: RecordStatus::Active,
                    score: Some(scored.score),
                    composite_score: Some(scored.composite_score),
                    raw_source_data: candidate
                        .eligibility
                        .as_ref()
                        .map(|e| HashMap::from([("eligibility".to_string(), serde_json::Value::String(e.clone()))]))
                        .unwrap_or_default(),
                    first_found_at: now,
                    retrieved_at: now,
                    created_at: now,
                    updated_at: now,
                };

                let upsert_result = state.db_breaker.call(|| grant_repo.upsert_candidate(job.user_id, draft)).await.map_err(|e| e.to_string());
                match upsert_result {
                    Ok(UpsertOutcome::Inserted(grant)) => {
                        grants_new += 1;
                        maybe_notify_match(state, job.user_id, grant.id, grant.composite_score.unwrap_or(0.0));
                    }
                    Ok(UpsertOutcome::Merged(_)) => {}
                    Err(error) => tracing::warn!(%error, "failed to persist scored candidate"),
                }
            }
        }
    }

    let degraded = run_outcome.status == RunOutcomeStatus::Partial;
    let status = match run_outcome.status {
        RunOutcomeStatus::Completed => RunStatus::Success,
        RunOutcomeStatus::Partial => RunStatus::Partial,
        RunOutcomeStatus::Failed => RunStatus::Failed,
    };
    let error = if run_outcome.status == RunOutcomeStatus::Failed { Some(RunError::AdapterUnavailable) } else { None };
    let failure_reasons: Vec<String> = run_outcome.failed_chunks.iter().map(|f| f.reason.clone()).collect();

    let search_runs = state.search_runs().map_err(|e| e.to_string())?;
    search_runs.complete(job.search_run_id, status, degraded, grants_found, grants_new, error, &failure_reasons).await.map_err(|e| e.to_string())?;

    if degraded {
        if let Ok(notifications) = state.notifications() {
            let _ = notifications.insert(&SystemNotification::search_run_degraded(job.user_id, job.search_run_id, &failure_reasons)).await;
        }
    }

    if status == RunStatus::Success {
        if let Ok(run) = search_runs.find_by_id(job.search_run_id).await {
            dispatch_summary_email(state, job.user_id, run).await;
        }
    }

    Ok(())
}

async fn dispatch_summary_email(state: &AppState, user_id: Uuid, run: Option<SearchRun>) {
    let Some(run) = run else { return };
    let Ok(users) = state.users() else { return };
    let Ok(user) = users.find_by_id(user_id).await else { return };
    let Some(user) = user else { return };
    let Ok(grants) = state.grants() else { return };
    let top_grants = grants.list_ranked_for_user(user_id, 5, 0).await.unwrap_or_default();
    crate::services::notification_dispatcher::dispatch_run_summary(state, &user, &run, &top_grants).await;
}

fn geographic_scope_for(tier: ResearchTier) -> GeographicScope {
    match tier {
        ResearchTier::Local => GeographicScope::Local,
        ResearchTier::State | ResearchTier::Regional => GeographicScope::Regional,
        ResearchTier::Federal => GeographicScope::National,
    }
}

fn maybe_notify_match(state: &AppState, user_id: Uuid, grant_id: Uuid, composite_score: f64) {
    if composite_score < 0.6 {
        return;
    }
    let state = state.clone();
    tokio::spawn(async move {
        if let Ok(notifications) = state.notifications() {
            let _ = notifications.insert(&SystemNotification::new_grant_match(user_id, grant_id, composite_score)).await;
        }
    });
}
