//! Bearer authentication and settings for the room cleanup endpoint

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, StatusCode},
    middleware::Next,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{env_parse, env_string};

/// Room cleanup configuration
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Shared secret for the cleanup endpoint (None = auth disabled)
    pub secret_key: Option<String>,
    /// How often the janitor sweeps inactive rooms
    pub interval: Duration,
    /// Rooms idle longer than this are deleted by the janitor
    pub max_age_hours: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            interval: Duration::from_secs(600),
            max_age_hours: 1,
        }
    }
}

impl CleanupConfig {
    /// Load from CLEANUP_SECRET_KEY, CLEANUP_INTERVAL_SECS and ROOM_MAX_AGE_HOURS
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret_key = env_string("CLEANUP_SECRET_KEY");

        if secret_key.is_some() {
            tracing::info!("Cleanup endpoint authentication enabled");
        } else {
            tracing::warn!("CLEANUP_SECRET_KEY not set - anyone can trigger room cleanup");
        }

        Self {
            secret_key,
            interval: env_parse("CLEANUP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            max_age_hours: env_parse("ROOM_MAX_AGE_HOURS").unwrap_or(defaults.max_age_hours),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Validate an Authorization header value
    pub fn validate(&self, authorization: Option<&str>) -> bool {
        let Some(secret) = &self.secret_key else {
            return true;
        };
        authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| constant_time_eq(secret.as_bytes(), token.trim().as_bytes()))
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized() -> Response<Body> {
    let body = serde_json::json!({ "error": "Unauthorized" });
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

/// Middleware requiring `Authorization: Bearer <CLEANUP_SECRET_KEY>`
pub async fn cleanup_auth_middleware(
    State(config): State<Arc<CleanupConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !config.is_enabled() {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if config.validate(authorization) {
        next.run(request).await
    } else {
        tracing::warn!(uri = %request.uri(), "Rejected unauthorized cleanup request");
        unauthorized()
    }
}
