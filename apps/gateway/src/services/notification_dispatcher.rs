// [apps/gateway/src/services/notification_dispatcher.rs]
//! C12: dispatches at most one summary email per user per completed
//! SearchRun. Dispatch goes through the email breaker (C1+C2); a
//! failed send — including the breaker being OPEN, which falls
//! through to `LoggingEmailFallback` — never fails the run itself.
//!
//! `User` carries no email address (auth is delegated externally, see
//! `middleware::auth_guard`); `external_subject` is used as the
//! recipient only when it is itself email-shaped, otherwise dispatch
//! degrades to the logging fallback. A future identity-provider
//! integration that surfaces a real address replaces this heuristic
//! wholesale.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use grantwell_domain_models::{Grant, SearchRun, User};
use grantwell_infra_adapters::EmailMessage;

use crate::state::AppState;

pub fn spawn_weekly_digest(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_weekly_digest(&state).await,
                _ = shutdown.changed() => {
                    tracing::info!("weekly digest daemon shutting down");
                    break;
                }
            }
        }
    });
}

#[tracing::instrument(skip(state))]
async fn run_weekly_digest(state: &AppState) {
    let users = match state.users() {
        Ok(repo) => repo.list_active().await,
        Err(error) => Err(error),
    };

    let users = match users {
        Ok(users) => users,
        Err(error) => {
            tracing::error!(%error, "weekly digest failed to list active users");
            return;
        }
    };

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for user in users {
        let Ok(grants) = state.grants() else { continue };
        let recent: Vec<Grant> = match grants.list_ranked_for_user(user.id, 20, 0).await {
            Ok(grants) => grants.into_iter().filter(|g| g.first_found_at >= cutoff).collect(),
            Err(error) => {
                tracing::warn!(%error, user_id = %user.id, "weekly digest failed to load grants");
                continue;
            }
        };

        if recent.is_empty() {
            continue;
        }

        dispatch_weekly_digest(state, &user, &recent).await;
    }
}

async fn dispatch_weekly_digest(state: &AppState, user: &User, grants: &[Grant]) {
    let to = recipient_address(user);
    let bands = score_bands(grants);
    let grant_lines: Vec<String> = grants.iter().take(5).map(|g| format!("- {}", g.title)).collect();

    let text_body = format!(
        "In the last 7 days we found {} new grants for you. High/medium/low match bands: {}/{}/{}.\n\nTop matches:\n{}",
        grants.len(),
        bands.high,
        bands.medium,
        bands.low,
        grant_lines.join("\n")
    );

    let message = EmailMessage {
        to,
        subject: "Your weekly grant digest".to_string(),
        html_body: text_body.replace('\n', "<br/>"),
        text_body,
    };

    let email_adapter = state.email_adapter.clone();
    let result = state.email_breaker.call(|| async move { email_adapter.send(&message).await }).await;

    match result {
        Ok(message_id) => tracing::info!(user_id = %user.id, %message_id, "dispatched weekly digest email"),
        Err(error) => tracing::warn!(user_id = %user.id, %error, "weekly digest dispatch failed"),
    }
}

pub async fn dispatch_run_summary(state: &AppState, user: &User, run: &SearchRun, top_grants: &[Grant]) {
    if run.grants_found == 0 {
        return;
    }

    let to = recipient_address(user);
    let message = build_summary_message(&to, run, top_grants);

    let llm_adapter = state.email_adapter.clone();
    let result = state.email_breaker.call(|| async move { llm_adapter.send(&message).await }).await;

    match result {
        Ok(message_id) => tracing::info!(user_id = %user.id, %message_id, "dispatched search run summary email"),
        Err(error) => tracing::warn!(user_id = %user.id, %error, "search run summary email dispatch failed"),
    }
}

fn recipient_address(user: &User) -> String {
    if user.external_subject.contains('@') {
        user.external_subject.clone()
    } else {
        format!("unresolved+{}@grantwell.app", user.id)
    }
}

fn build_summary_message(to: &str, run: &SearchRun, top_grants: &[Grant]) -> EmailMessage {
    let bands = score_bands(top_grants);
    let grant_lines: Vec<String> = top_grants
        .iter()
        .take(5)
        .map(|g| format!("- {} ({})", g.title, g.composite_score.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "unscored".into())))
        .collect();

    let text_body = format!(
        "Your search found {} grants ({} new). High/medium/low match bands: {}/{}/{}.\n\nTop matches:\n{}",
        run.grants_found, run.grants_new, bands.high, bands.medium, bands.low, grant_lines.join("\n")
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("{} new grant matches found", run.grants_new),
        html_body: text_body.replace('\n', "<br/>"),
        text_body,
    }
}

struct ScoreBands {
    high: usize,
    medium: usize,
    low: usize,
}

fn score_bands(grants: &[Grant]) -> ScoreBands {
    let mut bands = ScoreBands { high: 0, medium: 0, low: 0 };
    for grant in grants {
        match grant.composite_score {
            Some(score) if score >= 0.75 => bands.high += 1,
            Some(score) if score >= 0.5 => bands.medium += 1,
            _ => bands.low += 1,
        }
    }
    bands
}
