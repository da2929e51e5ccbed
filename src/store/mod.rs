//! Room persistence.
//!
//! One record per room, keyed by room id. Writes are last-write-wins; callers
//! that need read-modify-write atomicity serialise through the room locks in
//! [`crate::state::AppState`].

mod memory;
mod supabase;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{env_flag, env_string};
use crate::types::{now_millis, GameRoom, Millis, Player, PlayerId, RoomId};

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Room {0} already exists")]
    AlreadyExists(RoomId),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored room could not be decoded: {0}")]
    Corrupt(String),

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

/// The player fields known at join time
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub id: PlayerId,
    pub name: String,
}

impl From<NewPlayer> for Player {
    fn from(p: NewPlayer) -> Self {
        Player::new(p.id, p.name)
    }
}

/// Next `last_updated` for a room, strictly after `prev`.
/// Pollers compare stamps with `since`, so two writes must never share one.
pub(crate) fn next_stamp(prev: Option<Millis>) -> Millis {
    let now = now_millis();
    match prev {
        Some(prev) if prev >= now => prev + 1,
        _ => now,
    }
}

/// Backend holding room records
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert a fresh lobby with `host` as its only player
    async fn create_room(&self, room_id: &str, host: NewPlayer) -> StoreResult<GameRoom>;

    async fn get_room(&self, room_id: &str) -> StoreResult<Option<GameRoom>>;

    /// Replace a room record, stamping `last_updated`. None if the room is gone.
    async fn update_room(&self, room: GameRoom) -> StoreResult<Option<GameRoom>>;

    /// Append a player to the room. None if the room is gone.
    async fn add_player(&self, room_id: &str, player: NewPlayer) -> StoreResult<Option<GameRoom>>;

    /// Returns whether a room was removed
    async fn delete_room(&self, room_id: &str) -> StoreResult<bool>;

    /// Delete rooms not updated since `cutoff`, returning how many were removed
    async fn cleanup_inactive(&self, cutoff: Millis) -> StoreResult<usize>;

    /// Name of this backend, for logging and health output
    fn name(&self) -> &str;
}

/// Which backend to use
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Supabase { url: String, service_role_key: String },
}

impl StoreConfig {
    /// USE_SUPABASE=true selects Supabase and requires its URL and key
    pub fn from_env() -> StoreResult<Self> {
        if !env_flag("USE_SUPABASE", false) {
            return Ok(StoreConfig::Memory);
        }

        let url = env_string("SUPABASE_URL").or_else(|| env_string("NEXT_PUBLIC_SUPABASE_URL"));
        let key = env_string("SUPABASE_SERVICE_ROLE_KEY");

        match (url, key) {
            (Some(url), Some(service_role_key)) => Ok(StoreConfig::Supabase {
                url,
                service_role_key,
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push("SUPABASE_URL");
                }
                if key.is_none() {
                    missing.push("SUPABASE_SERVICE_ROLE_KEY");
                }
                Err(StoreError::Config(format!(
                    "Supabase credentials not configured (missing {})",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn build(&self) -> StoreResult<Arc<dyn RoomStore>> {
        match self {
            StoreConfig::Memory => {
                tracing::info!("Using in-memory room store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreConfig::Supabase {
                url,
                service_role_key,
            } => {
                tracing::info!("Using Supabase room store at {}", url);
                Ok(Arc::new(SupabaseStore::new(url, service_role_key)?))
            }
        }
    }
}
