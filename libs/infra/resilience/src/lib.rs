// [libs/infra/resilience/src/lib.rs]
/*!
 * CIRCUIT BREAKER FABRIC
 * RESPONSIBILITY: wraps a fallible async adapter call with a
 * CLOSED/OPEN/HALF_OPEN breaker and bounded exponential backoff, so an
 * unhealthy LLM, embedding, or vector-store endpoint degrades the
 * system rather than stalling every request behind its timeout.
 *
 * One `Breaker` instance per adapter. The breaker tracks state under a
 * tokio mutex because adapter calls are infrequent relative to lock
 * contention concerns; nothing here is in the hot path of a web request.
 */

mod backoff;
mod breaker;

pub use backoff::{retry_with_backoff, BackoffPolicy};
pub use breaker::{Breaker, BreakerConfig, BreakerError, BreakerState};
