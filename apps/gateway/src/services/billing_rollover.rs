// [apps/gateway/src/services/billing_rollover.rs]
//! Billing-period rollover: ticks once per cycle, per
//! `billing_period_elapsed`'s own doc comment ("the scheduler calls
//! this once per cycle rather than on every request"), and resets the
//! quota counters of every active user whose period has elapsed.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use grantwell_domain_billing::billing_period_elapsed;

use crate::state::AppState;

pub const BILLING_PERIOD_DAYS: i64 = 30;

pub fn spawn_billing_rollover(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_rollover(&state).await,
                _ = shutdown.changed() => {
                    tracing::info!("billing rollover daemon shutting down");
                    break;
                }
            }
        }
    });
}

#[tracing::instrument(skip(state))]
async fn run_rollover(state: &AppState) {
    let users = match state.users() {
        Ok(repo) => repo,
        Err(error) => {
            tracing::error!(%error, "billing rollover failed to open user repository");
            return;
        }
    };

    let active_users = match users.list_active().await {
        Ok(users) => users,
        Err(error) => {
            tracing::error!(%error, "billing rollover failed to list active users");
            return;
        }
    };

    let now = Utc::now();
    let mut rolled_over = 0;

    for user in active_users {
        if !billing_period_elapsed(&user, now, BILLING_PERIOD_DAYS) {
            continue;
        }

        if let Err(error) = users.reset_billing_period(user.id, now).await {
            tracing::error!(%error, user_id = %user.id, "failed to reset billing period");
            continue;
        }
        rolled_over += 1;
    }

    if rolled_over > 0 {
        tracing::info!(rolled_over, "billing rollover reset quota counters");
    }
}
