// [libs/infra/resilience/src/breaker.rs]
//! The CLOSED/OPEN/HALF_OPEN state machine itself.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// The Nth consecutive failure trips the breaker (not the N+1th).
    pub failure_threshold: u32,
    /// How long the breaker stays OPEN before allowing one HALF_OPEN probe.
    pub open_duration: Duration,
    /// Consecutive HALF_OPEN successes required to close the breaker again.
    pub recovery_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        BreakerConfig {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            recovery_threshold: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    #[error("circuit breaker is open, rejecting call")]
    Open,
    #[error(transparent)]
    Inner(E),
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

/// A named circuit breaker guarding one external adapter. `name` is
/// used only for log correlation; the breaker itself is stateless
/// across adapters, one instance per adapter is the intended topology.
pub struct Breaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl Breaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Breaker {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
            }),
        }
    }

    pub async fn state(&self) -> BreakerState {
        self.inner.lock().await.state
    }

    /// Runs `f` if the breaker currently admits calls, recording the
    /// outcome against the state machine. Returns `BreakerError::Open`
    /// without invoking `f` at all when the breaker is tripped and the
    /// cooldown has not yet elapsed.
    pub async fn call<T, E, F, Fut>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.admit().await {
            return Err(BreakerError::Open);
        }

        match f().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure().await;
                Err(BreakerError::Inner(err))
            }
        }
    }

    async fn admit(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.config.open_duration {
                    info!(breaker = %self.name, "cooldown elapsed, admitting half-open probe");
                    inner.state = BreakerState::HalfOpen;
                    inner.consecutive_successes = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = 0;
        match inner.state {
            BreakerState::Closed => {}
            BreakerState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.recovery_threshold {
                    info!(breaker = %self.name, "recovery threshold met, closing breaker");
                    inner.state = BreakerState::Closed;
                    inner.consecutive_successes = 0;
                    inner.opened_at = None;
                }
            }
            BreakerState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::HalfOpen => {
                warn!(breaker = %self.name, "probe failed, reopening breaker");
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.consecutive_successes = 0;
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = inner.consecutive_failures,
                        "failure threshold reached, opening breaker"
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nth_consecutive_failure_trips_not_nplus1th() {
        let breaker = Breaker::new("test", BreakerConfig { failure_threshold: 3, ..Default::default() });
        for _ in 0..2 {
            let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state().await, BreakerState::Closed);

        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(breaker.state().await, BreakerState::Open);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_invoking_callback() {
        let breaker = Breaker::new("test", BreakerConfig { failure_threshold: 1, ..Default::default() });
        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(breaker.state().await, BreakerState::Open);

        let mut invoked = false;
        let result = breaker
            .call(|| {
                invoked = true;
                async { Ok::<_, &str>(()) }
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Open)));
        assert!(!invoked);
    }

    #[tokio::test]
    async fn success_resets_consecutive_failure_count() {
        let breaker = Breaker::new("test", BreakerConfig { failure_threshold: 2, ..Default::default() });
        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        let _ = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_recovers_after_threshold_successes() {
        let breaker = Breaker::new(
            "test",
            BreakerConfig { failure_threshold: 1, open_duration: Duration::from_secs(10), recovery_threshold: 2 },
        );
        let _ = breaker.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(breaker.state().await, BreakerState::Open);

        tokio::time::advance(Duration::from_secs(11)).await;

        let _ = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert_eq!(breaker.state().await, BreakerState::HalfOpen);

        let _ = breaker.call(|| async { Ok::<_, &str>(()) }).await;
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }
}
