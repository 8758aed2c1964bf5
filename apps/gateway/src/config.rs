// [apps/gateway/src/config.rs]
//! Typed environment configuration. Parsed once at process start into
//! an immutable snapshot; `Config::reload` produces a fresh snapshot
//! that callers swap into a `RwLock<Arc<Config>>` rather than mutating
//! fields in place, so an in-flight handler never observes a half
//! -applied reload.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_auth_token: Option<String>,

    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,

    pub embedding_api_key: String,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,

    pub email_api_key: String,
    pub email_base_url: String,
    pub email_from_address: String,

    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,

    pub worker_auth_token: String,

    pub http_port: u16,
    pub worker_pool_size: usize,
    pub search_sweep_interval: Duration,
    pub cleanup_sweep_interval: Duration,
    pub health_probe_interval: Duration,
    pub billing_rollover_interval: Duration,

    pub breaker_failure_threshold: u32,
    pub breaker_open_duration: Duration,
    pub breaker_recovery_threshold: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    /// Reads every variable fresh from the process environment; callers
    /// on the SIGHUP reload path call this again and swap the result in,
    /// rather than mutating an existing `Config`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            database_url: require("DATABASE_URL")?,
            database_auth_token: optional("TURSO_AUTH_TOKEN"),

            llm_api_key: require("LLM_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_model: env_or("LLM_MODEL", "gpt-4o-mini"),

            embedding_api_key: require("EMBEDDING_API_KEY")?,
            embedding_base_url: env_or("EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dimensions: parse_or("EMBEDDING_DIMENSIONS", 1536)?,

            email_api_key: require("EMAIL_API_KEY")?,
            email_base_url: env_or("EMAIL_BASE_URL", "https://api.resend.com"),
            email_from_address: env_or("EMAIL_FROM_ADDRESS", "notifications@grantwell.app"),

            qdrant_url: require("QDRANT_URL")?,
            qdrant_api_key: optional("QDRANT_API_KEY"),

            worker_auth_token: require("WORKER_AUTH_TOKEN")?,

            http_port: parse_or("PORT", 3000)?,
            worker_pool_size: parse_or("WORKER_POOL_SIZE", 4)?,
            search_sweep_interval: Duration::from_secs(parse_or("SEARCH_SWEEP_INTERVAL_SECS", 6 * 3600)?),
            cleanup_sweep_interval: Duration::from_secs(parse_or("CLEANUP_SWEEP_INTERVAL_SECS", 7 * 24 * 3600)?),
            health_probe_interval: Duration::from_secs(parse_or("HEALTH_PROBE_INTERVAL_SECS", 5 * 60)?),
            billing_rollover_interval: Duration::from_secs(parse_or("BILLING_ROLLOVER_INTERVAL_SECS", 24 * 3600)?),

            breaker_failure_threshold: parse_or("BREAKER_FAILURE_THRESHOLD", 5)?,
            breaker_open_duration: Duration::from_secs(parse_or("BREAKER_OPEN_DURATION_SECS", 30)?),
            breaker_recovery_threshold: parse_or("BREAKER_RECOVERY_THRESHOLD", 2)?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_or(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}
