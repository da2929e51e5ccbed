use super::*;
use crate::types::now_millis;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store for local play and tests
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomId, GameRoom>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create_room(&self, room_id: &str, host: NewPlayer) -> StoreResult<GameRoom> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(room_id) {
            return Err(StoreError::AlreadyExists(room_id.to_string()));
        }

        let mut room = GameRoom::new(room_id.to_string(), host.into());
        room.last_updated = Some(now_millis());
        rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    async fn get_room(&self, room_id: &str) -> StoreResult<Option<GameRoom>> {
        Ok(self.rooms.read().await.get(room_id).cloned())
    }

    async fn update_room(&self, mut room: GameRoom) -> StoreResult<Option<GameRoom>> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(&room.id) {
            Some(slot) => {
                room.last_updated = Some(next_stamp(slot.last_updated));
                *slot = room.clone();
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn add_player(&self, room_id: &str, player: NewPlayer) -> StoreResult<Option<GameRoom>> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.players.push(player.into());
                room.last_updated = Some(next_stamp(room.last_updated));
                Ok(Some(room.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_room(&self, room_id: &str) -> StoreResult<bool> {
        Ok(self.rooms.write().await.remove(room_id).is_some())
    }

    async fn cleanup_inactive(&self, cutoff: Millis) -> StoreResult<usize> {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, room| room.last_updated.is_some_and(|ts| ts >= cutoff));
        Ok(before - rooms.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
