use super::*;
use crate::store::NewPlayer;
use crate::validation::{
    generate_room_code, room_id_for_code, sanitize_player_name, validate_player_id,
    validate_room_code, validate_room_id,
};

const MAX_CODE_ATTEMPTS: usize = 10;

/// How a joining player names the room
#[derive(Debug, Clone)]
pub enum RoomRef {
    Id(RoomId),
    Code(String),
}

fn check_player_id(player_id: &str) -> RoomResult<()> {
    if validate_player_id(player_id) {
        Ok(())
    } else {
        Err(RoomError::Invalid("Invalid player ID format".to_string()))
    }
}

fn check_room_id(room_id: &str) -> RoomResult<()> {
    if validate_room_id(room_id) {
        Ok(())
    } else {
        Err(RoomError::Invalid("Invalid room ID format".to_string()))
    }
}

fn player_name(raw: &str) -> RoomResult<String> {
    let name = sanitize_player_name(raw);
    if name.is_empty() {
        return Err(RoomError::Invalid("Player name cannot be empty".to_string()));
    }
    Ok(name)
}

impl AppState {
    /// Open a new lobby under a fresh room code. Returns the room and its code.
    pub async fn create_room(&self, player_id: &str, raw_name: &str) -> RoomResult<(GameRoom, String)> {
        check_player_id(player_id)?;
        let name = player_name(raw_name)?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code();
            let host = NewPlayer {
                id: player_id.to_string(),
                name: name.clone(),
            };
            match self.store.create_room(&room_id_for_code(&code), host).await {
                Ok(room) => {
                    tracing::info!(room = %room.id, host = %player_id, "Room created");
                    return Ok((room, code));
                }
                Err(StoreError::AlreadyExists(id)) => {
                    tracing::debug!("Room code collision on {}, retrying", id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Backend("Could not allocate a unique room code".to_string()).into())
    }

    /// Join a room, or rename a player who is already in it
    pub async fn join_room(&self, room: RoomRef, player_id: &str, raw_name: &str) -> RoomResult<GameRoom> {
        check_player_id(player_id)?;
        let room_id = match room {
            RoomRef::Code(code) => {
                if !validate_room_code(&code) {
                    return Err(RoomError::Invalid("Invalid room code format".to_string()));
                }
                room_id_for_code(&code)
            }
            RoomRef::Id(id) => {
                check_room_id(&id)?;
                id
            }
        };
        let name = player_name(raw_name)?;

        let _guard = self.lock_room(&room_id).await;
        let mut room = self.store.get_room(&room_id).await?.ok_or(RoomError::NotFound)?;
        let settled = room.settle_countdown(now_millis());

        if room.player(player_id).is_some() {
            if room.rename_player(player_id, &name) || settled {
                tracing::info!(room = %room_id, player = %player_id, "Player rejoined");
                return self.store.update_room(room).await?.ok_or(RoomError::NotFound);
            }
            return Ok(room);
        }

        room.check_admission(&self.rules)?;
        if settled {
            self.store.update_room(room).await?;
        }

        let player = NewPlayer {
            id: player_id.to_string(),
            name,
        };
        let room = self
            .store
            .add_player(&room_id, player)
            .await?
            .ok_or(RoomError::NotFound)?;

        tracing::info!(room = %room_id, player = %player_id, players = room.players.len(), "Player joined");
        Ok(room)
    }

    /// Current room record, with an elapsed heads-up countdown settled
    pub async fn get_room(&self, room_id: &str) -> RoomResult<GameRoom> {
        check_room_id(room_id)?;
        let room = self.store.get_room(room_id).await?.ok_or(RoomError::NotFound)?;
        if room.game_state != GamePhase::HeadsupCountdown {
            return Ok(room);
        }

        let _guard = self.lock_room(room_id).await;
        let mut room = self.store.get_room(room_id).await?.ok_or(RoomError::NotFound)?;
        if room.settle_countdown(now_millis()) {
            tracing::debug!(room = %room_id, "Heads-up countdown finished");
            return self.store.update_room(room).await?.ok_or(RoomError::NotFound);
        }
        Ok(room)
    }

    /// Room record if it changed after `since`, None otherwise
    pub async fn get_room_since(&self, room_id: &str, since: Option<Millis>) -> RoomResult<Option<GameRoom>> {
        let room = self.get_room(room_id).await?;
        let unchanged = matches!(
            (since, room.last_updated),
            (Some(since), Some(updated)) if updated <= since
        );
        Ok((!unchanged).then_some(room))
    }

    /// Delete rooms idle for longer than `max_age_hours`
    pub async fn cleanup_inactive(&self, max_age_hours: u64) -> RoomResult<usize> {
        let max_age_ms = i64::try_from(max_age_hours.saturating_mul(3_600_000)).unwrap_or(i64::MAX);
        let cutoff = now_millis().saturating_sub(max_age_ms);

        let deleted = self.store.cleanup_inactive(cutoff).await?;
        self.prune_room_locks().await;

        if deleted > 0 {
            tracing::info!("Removed {} inactive rooms (older than {}h)", deleted, max_age_hours);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::static_catalogs;
    use crate::validation::code_for_room_id;

    fn state() -> AppState {
        AppState::in_memory(static_catalogs(10, 10))
    }

    #[tokio::test]
    async fn test_create_room() {
        let state = state();
        let (room, code) = state.create_room("player_host", "Host").await.unwrap();

        assert_eq!(code.len(), 6);
        assert_eq!(code_for_room_id(&room.id), code);
        assert!(room.is_host("player_host"));
        assert_eq!(room.players[0].name, "Host");
    }

    #[tokio::test]
    async fn test_create_room_validates_input() {
        let state = state();
        let err = state.create_room("not-a-player", "Host").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid player ID format");

        let err = state.create_room("player_host", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Player name cannot be empty");
    }

    #[tokio::test]
    async fn test_join_by_code_case_insensitive() {
        let state = state();
        let (room, code) = state.create_room("player_host", "Host").await.unwrap();

        let joined = state
            .join_room(RoomRef::Code(code.to_lowercase()), "player_guest", "<b>Guest</b>")
            .await
            .unwrap();
        assert_eq!(joined.id, room.id);
        assert_eq!(joined.players.len(), 2);
        assert_eq!(joined.players[1].name, "Guest");
    }

    #[tokio::test]
    async fn test_rejoin_renames_without_duplicating() {
        let state = state();
        let (room, _) = state.create_room("player_host", "Host").await.unwrap();
        state
            .join_room(RoomRef::Id(room.id.clone()), "player_guest", "Guest")
            .await
            .unwrap();

        let again = state
            .join_room(RoomRef::Id(room.id.clone()), "player_guest", "Renamed")
            .await
            .unwrap();
        assert_eq!(again.players.len(), 2);
        assert_eq!(again.players[1].name, "Renamed");
    }

    #[tokio::test]
    async fn test_join_errors() {
        let state = state();
        let err = state
            .join_room(RoomRef::Code("ABC".to_string()), "player_guest", "Guest")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid room code format");

        let err = state
            .join_room(RoomRef::Id("room_NOPE22".to_string()), "player_guest", "Guest")
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::NotFound));
    }

    #[tokio::test]
    async fn test_join_rejected_mid_game() {
        let state = state();
        let (mut room, _) = state.create_room("player_host", "Host").await.unwrap();
        room.game_state = GamePhase::Playing;
        state.store.update_room(room.clone()).await.unwrap();

        let err = state
            .join_room(RoomRef::Id(room.id.clone()), "player_late", "Late")
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::Action(ActionError::GameInProgress)));
    }

    #[tokio::test]
    async fn test_get_room_settles_countdown() {
        let state = state();
        let (mut room, _) = state.create_room("player_host", "Host").await.unwrap();
        room.game_state = GamePhase::HeadsupCountdown;
        room.headsup_countdown_end = Some(now_millis() - 1);
        state.store.update_room(room.clone()).await.unwrap();

        let fetched = state.get_room(&room.id).await.unwrap();
        assert_eq!(fetched.game_state, GamePhase::HeadsupPlaying);

        let stored = state.store.get_room(&room.id).await.unwrap().unwrap();
        assert_eq!(stored.game_state, GamePhase::HeadsupPlaying);
    }

    #[tokio::test]
    async fn test_get_room_since() {
        let state = state();
        let (room, _) = state.create_room("player_host", "Host").await.unwrap();
        let stamp = room.last_updated.unwrap();

        assert!(state.get_room_since(&room.id, None).await.unwrap().is_some());
        assert!(state.get_room_since(&room.id, Some(stamp)).await.unwrap().is_none());
        assert!(state
            .get_room_since(&room.id, Some(stamp - 1))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_back_to_back_writes_are_visible_to_since() {
        let state = state();
        let (room, _) = state.create_room("player_host", "Host").await.unwrap();
        let toggle = || crate::protocol::RoomAction::ToggleHints {
            player_id: "player_host".to_string(),
            enabled: None,
        };

        for _ in 0..50 {
            let seen = state.apply_action(&room.id, toggle()).await.unwrap();
            let changed = state.apply_action(&room.id, toggle()).await.unwrap();
            assert!(changed.last_updated > seen.last_updated);

            let polled = state.get_room_since(&room.id, seen.last_updated).await.unwrap();
            assert_eq!(polled.map(|r| r.hints_enabled), Some(changed.hints_enabled));
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_rooms() {
        let state = state();
        state.create_room("player_host", "Host").await.unwrap();
        assert_eq!(state.cleanup_inactive(1).await.unwrap(), 0);
    }
}
