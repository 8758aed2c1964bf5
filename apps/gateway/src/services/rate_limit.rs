// [apps/gateway/src/services/rate_limit.rs]
//! Per-route token-bucket limiter. Unlike the rest of the ambient
//! stack this has no teacher counterpart to generalize from — the
//! teacher repo doesn't rate-limit and nothing in its dependency table
//! does either — so it's hand-written against general Rust practice
//! rather than grounded in a specific source file.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub const fn per_minute(max_requests: u32) -> Self {
        RateLimit { max_requests, window: Duration::from_secs(60) }
    }

    pub const fn per_hour(max_requests: u32) -> Self {
        RateLimit { max_requests, window: Duration::from_secs(3600) }
    }
}

struct Bucket {
    remaining: u32,
    window_started_at: Instant,
}

/// Keyed by `"{route_key}:{identity}"` where identity is a remote
/// address for unauthenticated routes or a user id for authenticated
/// ones, per spec.md §4.10's keying rule.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter { buckets: Mutex::new(HashMap::new()) }
    }

    /// Returns `Some(retry_after_secs)` when the caller should be
    /// rejected with 429; `None` when the request is admitted and the
    /// bucket has been decremented.
    pub async fn check(&self, key: &str, limit: RateLimit) -> Option<u64> {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket { remaining: limit.max_requests, window_started_at: now });

        if now.duration_since(bucket.window_started_at) >= limit.window {
            bucket.remaining = limit.max_requests;
            bucket.window_started_at = now;
        }

        if bucket.remaining == 0 {
            let elapsed = now.duration_since(bucket.window_started_at);
            return Some(limit.window.saturating_sub(elapsed).as_secs().max(1));
        }

        bucket.remaining -= 1;
        None
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_minute(2);
        assert!(limiter.check("k", limit).await.is_none());
        assert!(limiter.check("k", limit).await.is_none());
        assert!(limiter.check("k", limit).await.is_some());
    }

    #[tokio::test]
    async fn separate_keys_have_independent_buckets() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_minute(1);
        assert!(limiter.check("a", limit).await.is_none());
        assert!(limiter.check("b", limit).await.is_none());
    }
}
