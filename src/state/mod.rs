mod actions;
mod rooms;

pub use rooms::RoomRef;

use crate::catalog::{CatalogError, Catalogs};
use crate::game::{ActionError, GameRules};
use crate::store::{MemoryStore, RoomStore, StoreError};
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub type RoomResult<T> = Result<T, RoomError>;

/// Failures of room operations, mapped to HTTP statuses by the API layer
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    pub catalogs: Catalogs,
    pub rules: GameRules,
    /// Serialises read-modify-write per room
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn RoomStore>, catalogs: Catalogs, rules: GameRules) -> Self {
        Self {
            store,
            catalogs,
            rules,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    /// State backed by the in-memory store with default rules
    pub fn in_memory(catalogs: Catalogs) -> Self {
        Self::new(Arc::new(MemoryStore::new()), catalogs, GameRules::default())
    }

    async fn lock_room(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.room_locks.lock().await;
            locks
                .entry(room_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody is holding or waiting on
    async fn prune_room_locks(&self) {
        self.room_locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::static_catalogs;

    #[tokio::test]
    async fn test_room_lock_is_exclusive() {
        let state = Arc::new(AppState::in_memory(static_catalogs(5, 5)));
        let guard = state.lock_room("room_ABC234").await;

        let contender = {
            let state = state.clone();
            tokio::spawn(async move {
                let _guard = state.lock_room("room_ABC234").await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // other rooms are unaffected
        drop(state.lock_room("room_XYZ789").await);

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_prune_room_locks() {
        let state = AppState::in_memory(static_catalogs(5, 5));
        let held = state.lock_room("room_HELD22").await;
        drop(state.lock_room("room_FREE22").await);

        state.prune_room_locks().await;

        let locks = state.room_locks.lock().await;
        assert!(locks.contains_key("room_HELD22"));
        assert!(!locks.contains_key("room_FREE22"));
        drop(locks);
        drop(held);
    }
}
