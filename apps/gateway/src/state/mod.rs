// [apps/gateway/src/state/mod.rs]
//! Composition root's state: every long-lived collaborator the HTTP
//! handlers and background daemons share, wired once in `kernel.rs`
//! and cloned cheaply per request (everything here is an `Arc` or a
//! struct that already wraps one).
//!
//! Repositories are deliberately NOT stored as fields. `libsql::Connection`
//! is cheap to create and is not meant to be held across an `.await` that
//! might suspend for a long time, so each repository is constructed fresh,
//! on demand, from a connection pulled off `db` — mirroring the shape of
//! `GrantStoreClient::connection`, which itself returns a new connection
//! per call rather than handing out a shared one.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use grantwell_domain_compliance::ComplianceAgent;
use grantwell_domain_rag::RagGenerator;
use grantwell_domain_research::ResearchAgent;
use grantwell_infra_adapters::{EmailAdapter, EmbeddingAdapter, LlmAdapter};
use grantwell_infra_db::repositories::application::ApplicationRepository;
use grantwell_infra_db::repositories::configuration::ConfigurationRepository;
use grantwell_infra_db::repositories::grant::GrantRepository;
use grantwell_infra_db::repositories::notification::NotificationRepository;
use grantwell_infra_db::repositories::profile::ProfileRepository;
use grantwell_infra_db::repositories::search_run::SearchRunRepository;
use grantwell_infra_db::repositories::user::UserRepository;
use grantwell_infra_db::{DbError, GrantStoreClient};
use grantwell_infra_resilience::Breaker;
use grantwell_infra_vector::VectorIndex;

use crate::config::Config;
use crate::services::health_monitor::HealthState;
use crate::services::rate_limit::RateLimiter;
use crate::services::worker_pool::SearchJob;

#[derive(Debug, Clone)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

#[derive(Debug, Clone)]
pub struct OperatorIdentity {
    pub user_id: Uuid,
    pub is_worker_node: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Arc<Config>>>,
    db: GrantStoreClient,
    pub vector_index: Arc<VectorIndex>,

    pub db_breaker: Arc<Breaker>,
    pub vector_breaker: Arc<Breaker>,
    pub llm_breaker: Arc<Breaker>,
    pub llm_adapter: Arc<dyn LlmAdapter>,
    pub embedding_breaker: Arc<Breaker>,
    pub embedding_adapter: Arc<dyn EmbeddingAdapter>,
    pub email_breaker: Arc<Breaker>,
    pub email_adapter: Arc<dyn EmailAdapter>,

    pub research_agent: Arc<ResearchAgent>,
    pub compliance_agent: Arc<ComplianceAgent>,
    pub rag_generator: Arc<RagGenerator>,

    pub job_sender: mpsc::Sender<SearchJob>,
    pub rate_limiter: Arc<RateLimiter>,
    pub health: Arc<HealthState>,

    system_mode: Arc<RwLock<SystemMode>>,
    in_flight_runs: Arc<Mutex<HashSet<Uuid>>>,
}

#[allow(clippy::too_many_arguments)]
impl AppState {
    pub fn new(
        config: Arc<RwLock<Arc<Config>>>,
        db: GrantStoreClient,
        vector_index: Arc<VectorIndex>,
        db_breaker: Arc<Breaker>,
        vector_breaker: Arc<Breaker>,
        llm_breaker: Arc<Breaker>,
        llm_adapter: Arc<dyn LlmAdapter>,
        embedding_breaker: Arc<Breaker>,
        embedding_adapter: Arc<dyn EmbeddingAdapter>,
        email_breaker: Arc<Breaker>,
        email_adapter: Arc<dyn EmailAdapter>,
        research_agent: Arc<ResearchAgent>,
        compliance_agent: Arc<ComplianceAgent>,
        rag_generator: Arc<RagGenerator>,
        job_sender: mpsc::Sender<SearchJob>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        AppState {
            config,
            db,
            vector_index,
            db_breaker,
            vector_breaker,
            llm_breaker,
            llm_adapter,
            embedding_breaker,
            embedding_adapter,
            email_breaker,
            email_adapter,
            research_agent,
            compliance_agent,
            rag_generator,
            job_sender,
            rate_limiter,
            health: Arc::new(HealthState::new()),
            system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
            in_flight_runs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn ping_db(&self) -> Result<(), DbError> {
        self.db.ping().await
    }

    pub fn users(&self) -> Result<UserRepository, DbError> {
        Ok(UserRepository::new(self.db.connection()?))
    }

    pub fn profiles(&self) -> Result<ProfileRepository, DbError> {
        Ok(ProfileRepository::new(self.db.connection()?))
    }

    pub fn grants(&self) -> Result<GrantRepository, DbError> {
        Ok(GrantRepository::new(self.db.connection()?))
    }

    pub fn search_runs(&self) -> Result<SearchRunRepository, DbError> {
        Ok(SearchRunRepository::new(self.db.connection()?))
    }

    pub fn applications(&self) -> Result<ApplicationRepository, DbError> {
        Ok(ApplicationRepository::new(self.db.connection()?))
    }

    pub fn configuration(&self) -> Result<ConfigurationRepository, DbError> {
        Ok(ConfigurationRepository::new(self.db.connection()?))
    }

    pub fn notifications(&self) -> Result<NotificationRepository, DbError> {
        Ok(NotificationRepository::new(self.db.connection()?))
    }

    pub async fn current_config(&self) -> Arc<Config> {
        self.config.read().await.clone()
    }

    pub async fn set_mode(&self, mode: SystemMode) {
        if let SystemMode::Maintenance(reason) = &mode {
            tracing::warn!(reason = %reason, "system entering maintenance mode");
        } else {
            tracing::info!("system mode restored to operational");
        }
        *self.system_mode.write().await = mode;
    }

    /// Used by the health-guard middleware: `Err` carries the
    /// maintenance reason surfaced in the 503 envelope.
    pub async fn is_operational(&self) -> Result<(), String> {
        match &*self.system_mode.read().await {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => Err(reason.clone()),
        }
    }

    /// Enforces "per user, at most one search job in-flight" (spec.md
    /// §4.9's ordering guarantee). Returns `false` without changing
    /// anything if a run is already tracked for this user.
    pub async fn try_start_run(&self, user_id: Uuid) -> bool {
        self.in_flight_runs.lock().await.insert(user_id)
    }

    pub async fn finish_run(&self, user_id: Uuid) {
        self.in_flight_runs.lock().await.remove(&user_id);
    }

    pub async fn is_run_in_flight(&self, user_id: Uuid) -> bool {
        self.in_flight_runs.lock().await.contains(&user_id)
    }
}
