// [libs/infra/adapters/src/errors.rs]
//! The error taxonomy every adapter maps its failures into, so the
//! retry fabric can decide TRANSIENT-vs-not without knowing which
//! provider produced the failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("ADAPTER_NETWORK: transport failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("ADAPTER_DECODING: response body did not match the expected shape: {0}")]
    Decoding(String),

    #[error("ADAPTER_SERVER_REJECTION: provider returned status {status}: {body}")]
    ServerRejection { status: u16, body: String },

    /// 429 with a retry-after the fabric considers honorable (≤ 5 minutes).
    /// A longer value is surfaced as `ServerRejection` instead, which the
    /// fabric treats as a daily quota and routes straight to fallback.
    #[error("ADAPTER_RATE_LIMITED: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("ADAPTER_UNAUTHORIZED: credentials rejected")]
    Unauthorized,
}

impl AdapterError {
    /// Whether the retry fabric should attempt another CLOSED-state
    /// retry for this failure, per the TRANSIENT classification in the
    /// resilience spec (network, 5xx, rate-limit with honorable
    /// retry-after).
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Network(_) => true,
            AdapterError::RateLimited { .. } => true,
            AdapterError::ServerRejection { status, .. } => *status >= 500,
            AdapterError::Decoding(_) | AdapterError::Unauthorized => false,
        }
    }
}
