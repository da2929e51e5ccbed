//! Rate limiting for room mutations
//!
//! Every PATCH on a room counts against a fixed window keyed by the room, so a
//! single misbehaving client cannot hammer the store. Reads are not limited;
//! clients poll every two seconds.

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, Response, StatusCode},
    middleware::Next,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::config::{env_flag, env_parse};

/// Rate limiter state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of key to (request count, window start)
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    /// Maximum requests per window
    max_requests: u32,
    /// Time window duration
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60, Duration::from_secs(10))
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        match requests.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_requests {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                requests.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Forget windows that ended a while ago
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }

    async fn tracked_keys(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Anti-abuse configuration
#[derive(Debug, Clone, Default)]
pub struct AbuseConfig {
    /// Rate limiter (None = disabled)
    pub rate_limiter: Option<RateLimiter>,
}

impl AbuseConfig {
    /// ABUSE_RATE_LIMIT toggles the limiter; ABUSE_RATE_LIMIT_MAX and
    /// ABUSE_RATE_LIMIT_WINDOW (seconds) size it
    pub fn from_env() -> Self {
        let rate_limit_enabled = env_flag("ABUSE_RATE_LIMIT", true);

        let rate_limiter = rate_limit_enabled.then(|| {
            let defaults = RateLimiter::default();
            let max_requests = env_parse("ABUSE_RATE_LIMIT_MAX").unwrap_or(defaults.max_requests);
            let window = env_parse("ABUSE_RATE_LIMIT_WINDOW")
                .map(Duration::from_secs)
                .unwrap_or(defaults.window);
            RateLimiter::new(max_requests, window)
        });

        tracing::info!(rate_limit_enabled, "Anti-abuse config loaded");

        Self { rate_limiter }
    }

    pub fn disabled() -> Self {
        Self { rate_limiter: None }
    }
}

/// Room mutations are keyed by the room they target
fn get_rate_limit_key(request: &Request<Body>) -> Option<String> {
    if request.method() != Method::PATCH {
        return None;
    }
    let room_id = request.uri().path().rsplit('/').next()?;
    (!room_id.is_empty()).then(|| format!("room:{}", room_id))
}

/// Build a 429 Too Many Requests response
fn rate_limited(retry_after: Duration) -> Response<Body> {
    let body = serde_json::json!({ "error": "Rate limit exceeded. Please slow down." });
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::RETRY_AFTER,
        header::HeaderValue::from(retry_after.as_secs().max(1)),
    );
    response
}

/// Middleware limiting how fast a room can be mutated
pub async fn room_rate_limit_middleware(
    State(config): State<Arc<AbuseConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if let Some(ref rate_limiter) = config.rate_limiter {
        if let Some(key) = get_rate_limit_key(&request) {
            if !rate_limiter.check(&key).await {
                tracing::warn!(key, "Rate limited");
                return rate_limited(rate_limiter.window());
            }
        }
    }

    next.run(request).await
}
