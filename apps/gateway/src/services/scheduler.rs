// [apps/gateway/src/services/scheduler.rs]
//! The search-sweep cron: ticks on a fixed cadence, enumerates active
//! users, and enqueues one search job per user — the scheduled-trigger
//! counterpart to the `/api/system/run-search` handler's manual
//! trigger. Shaped after the teacher's pacemaker daemons
//! (`tokio::time::interval` + `MissedTickBehavior::Skip`, a spawned
//! task per daemon rather than one monolithic scheduler loop).

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use grantwell_domain_models::TriggerType;

use crate::services::worker_pool::SearchJob;
use crate::state::AppState;

pub fn spawn_search_sweep(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if state.is_operational().await.is_err() {
                        tracing::warn!("search sweep skipped, system in maintenance");
                        continue;
                    }
                    run_sweep(&state).await;
                }
                _ = shutdown.changed() => {
                    tracing::info!("search sweep daemon shutting down");
                    break;
                }
            }
        }
    });
}

#[tracing::instrument(skip(state))]
async fn run_sweep(state: &AppState) {
    let users = match state.users() {
        Ok(repo) => repo.list_active().await,
        Err(error) => Err(error),
    };

    let users = match users {
        Ok(users) => users,
        Err(error) => {
            tracing::error!(%error, "search sweep failed to list active users");
            return;
        }
    };

    tracing::info!(user_count = users.len(), "search sweep enumerating active users");

    for user in users {
        if state.is_run_in_flight(user.id).await {
            tracing::debug!(user_id = %user.id, "skipping user, search already in flight");
            continue;
        }

        let profiles = match state.profiles() {
            Ok(repo) => repo,
            Err(error) => {
                tracing::error!(%error, "failed to open profile repository");
                continue;
            }
        };

        let profile = match profiles.find_by_user(user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => continue,
            Err(error) => {
                tracing::error!(%error, user_id = %user.id, "failed to load profile for scheduled sweep");
                continue;
            }
        };

        let search_runs = match state.search_runs() {
            Ok(repo) => repo,
            Err(error) => {
                tracing::error!(%error, "failed to open search run repository");
                continue;
            }
        };

        let run = match search_runs.create(user.id, profile.id, TriggerType::Scheduled).await {
            Ok(run) => run,
            Err(error) => {
                tracing::error!(%error, user_id = %user.id, "failed to create scheduled search run");
                continue;
            }
        };

        if !state.try_start_run(user.id).await {
            continue;
        }

        let job = SearchJob { user_id: user.id, profile_id: profile.id, search_run_id: run.id, trigger: TriggerType::Scheduled };

        if state.job_sender.try_send(job).is_err() {
            tracing::warn!(user_id = %user.id, "job queue full, scheduled sweep dropped a user for this cycle");
            state.finish_run(user.id).await;
            let _ = search_runs.cancel_if_running(run.id).await;
        }
    }
}
