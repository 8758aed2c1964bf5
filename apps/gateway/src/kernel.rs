// [apps/gateway/src/kernel.rs]
//! Composition root. `ignite` connects the grant store and builds
//! every long-lived collaborator `AppState` holds; `launch` spawns the
//! background daemons and then blocks serving HTTP until a shutdown
//! signal arrives.

use std::sync::Arc;

use qdrant_client::Qdrant;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{error, info, instrument};

use grantwell_domain_compliance::ComplianceAgent;
use grantwell_domain_rag::RagGenerator;
use grantwell_domain_research::ResearchAgent;
use grantwell_infra_adapters::{HttpEmailAdapter, OpenAiEmbeddingAdapter, OpenAiLlmAdapter};
use grantwell_infra_db::GrantStoreClient;
use grantwell_infra_resilience::{Breaker, BreakerConfig};
use grantwell_infra_vector::VectorIndex;

use crate::config::Config;
use crate::routes::build_router;
use crate::services::billing_rollover::spawn_billing_rollover;
use crate::services::cleanup::spawn_cleanup_sweep;
use crate::services::health_monitor::spawn_health_probe;
use crate::services::notification_dispatcher::spawn_weekly_digest;
use crate::services::rate_limit::RateLimiter;
use crate::services::scheduler::spawn_search_sweep;
use crate::services::worker_pool::spawn_worker_pool;
use crate::state::AppState;

pub struct GatewayKernel {
    http_port: u16,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
    shutdown_tx: watch::Sender<bool>,
}

impl GatewayKernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: Config) -> Self {
        let config = Arc::new(config);
        let http_port = config.http_port;

        let db = GrantStoreClient::connect(&config.database_url, config.database_auth_token.clone())
            .await
            .expect("FATAL: could not connect to the grant store");

        let mut qdrant_builder = Qdrant::from_url(&config.qdrant_url);
        if let Some(api_key) = &config.qdrant_api_key {
            qdrant_builder = qdrant_builder.api_key(api_key.clone());
        }
        let qdrant_client = Arc::new(qdrant_builder.build().expect("FATAL: could not build qdrant client"));
        let vector_index = Arc::new(VectorIndex::new(qdrant_client, config.embedding_dimensions));
        vector_index.ensure_collection().await.expect("FATAL: could not ensure vector collection exists");

        let breaker_config = BreakerConfig {
            failure_threshold: config.breaker_failure_threshold,
            open_duration: config.breaker_open_duration,
            recovery_threshold: config.breaker_recovery_threshold,
        };

        // Database and vector-store breakers use spec-mandated defaults
        // rather than the adapter-tunable `breaker_config`: these two
        // dependencies aren't swappable per deployment the way the LLM
        // endpoint is, so their thresholds aren't exposed via `Config`.
        let db_breaker_config = BreakerConfig { failure_threshold: 3, open_duration: std::time::Duration::from_secs(30), recovery_threshold: breaker_config.recovery_threshold };
        let vector_breaker_config = BreakerConfig { failure_threshold: 5, open_duration: std::time::Duration::from_secs(60), recovery_threshold: breaker_config.recovery_threshold };
        let db_breaker = Arc::new(Breaker::new("database", db_breaker_config));
        let vector_breaker = Arc::new(Breaker::new("vector_store", vector_breaker_config));

        let llm_adapter = Arc::new(OpenAiLlmAdapter::new(config.llm_base_url.clone(), &config.llm_api_key, config.llm_model.clone()));
        let llm_breaker = Arc::new(Breaker::new("llm", breaker_config));

        let embedding_adapter = Arc::new(OpenAiEmbeddingAdapter::new(
            config.embedding_base_url.clone(),
            &config.embedding_api_key,
            config.embedding_model.clone(),
            config.embedding_dimensions,
        ));
        let embedding_breaker = Arc::new(Breaker::new("embedding", breaker_config));

        let email_adapter = Arc::new(HttpEmailAdapter::new(config.email_base_url.clone(), &config.email_api_key, config.email_from_address.clone()));
        let email_breaker = Arc::new(Breaker::new("email", breaker_config));

        let research_agent = Arc::new(ResearchAgent::new(llm_adapter.clone(), llm_breaker.clone()));
        let compliance_agent = Arc::new(ComplianceAgent::new());
        let rag_generator = Arc::new(RagGenerator::new(llm_adapter.clone(), llm_breaker.clone(), config.llm_model.clone()));

        let (job_sender, job_receiver) = mpsc::channel(config.worker_pool_size * 4);
        let rate_limiter = Arc::new(RateLimiter::new());

        let state = AppState::new(
            Arc::new(RwLock::new(config.clone())),
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
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        GatewayKernel { http_port, state, shutdown_rx, shutdown_tx }.with_job_receiver(job_receiver, config.worker_pool_size)
    }

    fn with_job_receiver(self, job_receiver: mpsc::Receiver<crate::services::worker_pool::SearchJob>, pool_size: usize) -> Self {
        spawn_worker_pool(self.state.clone(), job_receiver, pool_size, self.shutdown_rx.clone());
        self
    }

    /// Spawns the remaining background daemons, binds the HTTP
    /// listener, and serves until SIGINT/SIGTERM flips the shutdown
    /// watch channel.
    pub async fn launch(self) {
        let config = self.state.current_config().await;

        spawn_search_sweep(self.state.clone(), config.search_sweep_interval, self.shutdown_rx.clone());
        spawn_cleanup_sweep(self.state.clone(), config.cleanup_sweep_interval, self.shutdown_rx.clone());
        spawn_health_probe(self.state.clone(), config.health_probe_interval, self.shutdown_rx.clone());
        spawn_weekly_digest(self.state.clone(), std::time::Duration::from_secs(7 * 24 * 3600), self.shutdown_rx.clone());
        spawn_billing_rollover(self.state.clone(), config.billing_rollover_interval, self.shutdown_rx.clone());

        let router = build_router(self.state);

        let bind_address = std::net::SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(bind_address).await.expect("FATAL: failed to bind HTTP listener");
        info!(address = %bind_address, "gateway listening");

        let shutdown_tx = self.shutdown_tx;
        let shutdown_signal = async move {
            wait_for_termination().await;
            info!("shutdown signal received, draining background daemons");
            let _ = shutdown_tx.send(true);
        };

        if let Err(error) = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal).await {
            error!(error = %error, "gateway server terminated with an error");
            std::process::exit(1);
        }
    }
}

async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
