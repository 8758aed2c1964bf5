// [apps/gateway/src/services/cleanup.rs]
//! Weekly stale-grant cleanup: spec.md §4.12 names this as "a separate
//! scheduled job"; SPEC_FULL.md gives it the same daemon shape as the
//! search sweep, just a longer `tokio::time::interval`.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const STALE_AFTER_DAYS: i64 = 30;
const DELETE_AFTER_DAYS: i64 = 90;

use crate::state::AppState;

pub fn spawn_cleanup_sweep(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_cleanup(&state).await,
                _ = shutdown.changed() => {
                    tracing::info!("cleanup sweep daemon shutting down");
                    break;
                }
            }
        }
    });
}

#[tracing::instrument(skip(state))]
async fn run_cleanup(state: &AppState) {
    let grants = match state.grants() {
        Ok(repo) => repo,
        Err(error) => {
            tracing::error!(%error, "cleanup sweep failed to open grant repository");
            return;
        }
    };

    match grants.run_cleanup(STALE_AFTER_DAYS, DELETE_AFTER_DAYS).await {
        Ok((archived, deleted)) => tracing::info!(archived, deleted, "cleanup sweep completed"),
        Err(error) => tracing::error!(%error, "cleanup sweep failed"),
    }
}
