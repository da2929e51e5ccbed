use super::ClientError;
use std::future::Future;
use std::time::Duration;

/// Retry policy for client requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Double the delay after every failed attempt
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            exponential: true,
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        if self.exponential {
            self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.base_delay
        }
    }
}

/// Client errors other than 408/429 won't succeed on a retry
pub fn is_retryable(err: &ClientError) -> bool {
    match err {
        ClientError::Api { status, .. } => {
            !(400..500).contains(status) || matches!(status, 408 | 429)
        }
        ClientError::Network(_) | ClientError::Timeout => true,
        ClientError::Decode(_) => false,
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or runs out of retries
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_retries || !is_retryable(&e) => return Err(e),
            Err(e) => {
                let delay = policy.delay(attempt);
                tracing::debug!(attempt, ?delay, "Request failed, retrying: {}", e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Short message suitable for showing to a player
pub fn user_friendly_error(err: &ClientError) -> String {
    match err {
        ClientError::Network(_) => {
            "Network error. Please check your connection and try again.".to_string()
        }
        ClientError::Timeout => "Request timed out. Please try again.".to_string(),
        ClientError::Api { status: 403, .. } => {
            "Access denied. Please check your permissions.".to_string()
        }
        ClientError::Api { status: 404, .. } => {
            "Resource not found. The room may have been deleted.".to_string()
        }
        ClientError::Api { status, .. } if *status >= 500 => {
            "Server error. Please try again in a moment.".to_string()
        }
        ClientError::Api { message, .. } if message.chars().count() < 100 => message.clone(),
        _ => "An unexpected error occurred. Please try again.".to_string(),
    }
}
