use crate::abuse::AbuseConfig;
use crate::auth::CleanupConfig;
use crate::state::AppState;
use std::sync::Arc;

/// Spawn a background task that deletes idle rooms and prunes rate-limit windows
pub fn spawn_room_janitor(
    state: Arc<AppState>,
    cleanup: Arc<CleanupConfig>,
    abuse: Arc<AbuseConfig>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup.interval);
        // first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if let Err(e) = state.cleanup_inactive(cleanup.max_age_hours).await {
                tracing::warn!("Room cleanup failed: {}", e);
            }

            if let Some(ref limiter) = abuse.rate_limiter {
                limiter.cleanup().await;
            }
        }
    })
}
