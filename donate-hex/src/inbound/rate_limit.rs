//! Per-session request throttling.
//!
//! Each access token gets its own governor bucket, so one donor's burst of
//! purchases cannot starve another. Callers without a session share the
//! `anonymous` bucket. `/health` is never throttled.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{num::NonZeroU32, sync::Arc, time::Duration};

use super::auth::extract_access_token;

const ANONYMOUS: &str = "anonymous";

type Bucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Buckets keyed by access token.
pub struct RateLimiterState {
    buckets: DashMap<String, Arc<Bucket>>,
    quota: Quota,
    retry_after: Duration,
}

impl RateLimiterState {
    /// `requests` may be spent at once and refill evenly over `period`.
    /// A zero `requests` still admits one request per `period`.
    pub fn new(requests: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period / burst.get())
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            buckets: DashMap::new(),
            quota,
            retry_after: period,
        }
    }

    /// Spends one request from `key`'s bucket; `false` once it is empty.
    pub fn check(&self, key: &str) -> bool {
        let bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        bucket.check().is_ok()
    }

    /// Seconds a throttled caller is told to wait.
    pub fn retry_after_seconds(&self) -> u64 {
        self.retry_after.as_secs().max(1)
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let token = extract_access_token(request.headers());
    let signed_in = token.is_some();
    let key = token.unwrap_or_else(|| ANONYMOUS.to_string());

    if !limiter.check(&key) {
        tracing::warn!(signed_in, path = %request.uri().path(), "request throttled");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Too many requests. Please try again later.",
                "code": 429,
                "retry_after_seconds": limiter.retry_after_seconds()
            })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_is_per_key() {
        let state = RateLimiterState::new(2, Duration::from_secs(60));

        assert!(state.check("a"));
        assert!(state.check("a"));
        assert!(!state.check("a"));
        assert!(state.check("b"));
    }

    #[test]
    fn test_zero_requests_still_allows_one() {
        let state = RateLimiterState::new(0, Duration::from_secs(60));
        assert!(state.check("a"));
        assert!(!state.check("a"));
    }

    #[test]
    fn test_retry_after_follows_period() {
        assert_eq!(
            RateLimiterState::new(10, Duration::from_secs(60)).retry_after_seconds(),
            60
        );
        assert_eq!(
            RateLimiterState::new(10, Duration::from_millis(10)).retry_after_seconds(),
            1
        );
    }
}
