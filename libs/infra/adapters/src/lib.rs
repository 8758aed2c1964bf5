// [libs/infra/adapters/src/lib.rs]
/*!
 * EXTERNAL SERVICE ADAPTERS
 * RESPONSIBILITY: typed reqwest clients for every third-party service
 * the pipeline calls out to. Each adapter is a stateless credential +
 * HTTP-client holder with explicit timeouts; callers wrap every call
 * through `grantwell_infra_resilience::Breaker` rather than retrying
 * inside the adapter itself, keeping the breaker's failure accounting
 * in one place regardless of which adapter tripped it.
 */

pub mod email;
pub mod embedding;
pub mod errors;
pub mod llm;

pub use email::{EmailAdapter, EmailMessage, HttpEmailAdapter, LoggingEmailFallback};
pub use embedding::{EmbeddingAdapter, OpenAiEmbeddingAdapter};
pub use errors::AdapterError;
pub use llm::{LlmAdapter, LlmRequest, LlmResponse, OpenAiLlmAdapter};
