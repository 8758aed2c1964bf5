// [apps/gateway/src/services/health_monitor.rs]
//! C11: periodic probe of the database and every adapter's breaker,
//! backing `/health/readiness`, `/health/detailed`,
//! `/health/circuit-breakers`, and `/health/recovery-stats`. Holds the
//! rolling counters those routes report; the probe tick is the only
//! writer, so readers never take a lock for longer than a clone.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

use grantwell_infra_resilience::BreakerState;

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub breaker_state: BreakerState,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub checked_at: DateTime<Utc>,
}

pub struct HealthState {
    components: RwLock<Vec<ComponentHealth>>,
    database: RwLock<Option<DatabaseHealth>>,
    error_timestamps: RwLock<VecDeque<DateTime<Utc>>>,
    fallback_timestamps: RwLock<VecDeque<DateTime<Utc>>>,
}

impl HealthState {
    pub fn new() -> Self {
        HealthState {
            components: RwLock::new(Vec::new()),
            database: RwLock::new(None),
            error_timestamps: RwLock::new(VecDeque::new()),
            fallback_timestamps: RwLock::new(VecDeque::new()),
        }
    }

    pub async fn record_error(&self) {
        let mut timestamps = self.error_timestamps.write().await;
        timestamps.push_back(Utc::now());
        prune_older_than_one_minute(&mut timestamps);
    }

    pub async fn record_fallback(&self) {
        let mut timestamps = self.fallback_timestamps.write().await;
        timestamps.push_back(Utc::now());
        prune_older_than_one_minute(&mut timestamps);
    }

    pub async fn errors_per_minute(&self) -> usize {
        let mut timestamps = self.error_timestamps.write().await;
        prune_older_than_one_minute(&mut timestamps);
        timestamps.len()
    }

    pub async fn fallback_activations_per_minute(&self) -> usize {
        let mut timestamps = self.fallback_timestamps.write().await;
        prune_older_than_one_minute(&mut timestamps);
        timestamps.len()
    }

    pub async fn components(&self) -> Vec<ComponentHealth> {
        self.components.read().await.clone()
    }

    pub async fn database(&self) -> Option<DatabaseHealth> {
        self.database.read().await.clone()
    }

    pub async fn is_ready(&self, db_breaker_state: BreakerState) -> bool {
        let db_reachable = self.database.read().await.as_ref().map(|d| d.reachable).unwrap_or(false);
        db_reachable && db_breaker_state == BreakerState::Closed
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

fn prune_older_than_one_minute(timestamps: &mut VecDeque<DateTime<Utc>>) {
    let cutoff = Utc::now() - chrono::Duration::minutes(1);
    while timestamps.front().is_some_and(|t| *t < cutoff) {
        timestamps.pop_front();
    }
}

pub fn spawn_health_probe(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => probe(&state).await,
                _ = shutdown.changed() => {
                    tracing::info!("health probe daemon shutting down");
                    break;
                }
            }
        }
    });
}

async fn probe(state: &AppState) {
    let now = Utc::now();

    let db_reachable = state.db_breaker.call(|| state.ping_db()).await.is_ok();
    *state.health.database.write().await = Some(DatabaseHealth { reachable: db_reachable, checked_at: now });

    let _ = state.vector_breaker.call(|| state.vector_index.ensure_collection()).await;

    let components = vec![
        ComponentHealth { name: "llm", breaker_state: state.llm_breaker.state().await, checked_at: now },
        ComponentHealth { name: "embedding", breaker_state: state.embedding_breaker.state().await, checked_at: now },
        ComponentHealth { name: "email", breaker_state: state.email_breaker.state().await, checked_at: now },
        ComponentHealth { name: "database", breaker_state: state.db_breaker.state().await, checked_at: now },
        ComponentHealth { name: "vector_store", breaker_state: state.vector_breaker.state().await, checked_at: now },
    ];

    for component in &components {
        if component.breaker_state != BreakerState::Closed {
            tracing::warn!(component = component.name, state = ?component.breaker_state, "breaker not closed at health probe");
        }
    }

    *state.health.components.write().await = components;
}
