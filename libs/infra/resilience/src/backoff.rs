// [libs/infra/resilience/src/backoff.rs]
//! Bounded exponential backoff for adapter calls that failed but are
//! worth retrying a few times before handing the failure to the breaker.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        scaled.min(self.max_delay)
    }
}

/// Retries `f` up to `policy.max_attempts` times, waiting an
/// exponentially increasing delay between attempts. Returns the last
/// error if every attempt fails.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: BackoffPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(policy.delay_for_attempt(attempt - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_within_budget() {
        let calls = AtomicU32::new(0);
        let policy = BackoffPolicy { max_attempts: 3, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(10) };

        let result = retry_with_backoff(policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_and_returns_last_error() {
        let policy = BackoffPolicy { max_attempts: 2, base_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5) };
        let result: Result<(), &str> = retry_with_backoff(policy, || async { Err("still failing") }).await;
        assert_eq!(result, Err("still failing"));
    }
}
