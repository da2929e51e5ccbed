use super::*;
use crate::game::ActionContext;
use crate::protocol::RoomAction;
use crate::validation::{validate_player_id, validate_room_id};

impl AppState {
    /// Apply a named action to a room under its lock and persist the result
    pub async fn apply_action(&self, room_id: &str, action: RoomAction) -> RoomResult<GameRoom> {
        if !validate_room_id(room_id) {
            return Err(RoomError::Invalid("Invalid room ID format".to_string()));
        }
        if !validate_player_id(action.player_id()) {
            return Err(RoomError::Invalid("Invalid player ID format".to_string()));
        }

        let _guard = self.lock_room(room_id).await;
        let mut room = self.store.get_room(room_id).await?.ok_or(RoomError::NotFound)?;
        room.authorize(&action)?;

        let items = match action.catalog_needed(&room) {
            Some(game_type) => self.catalogs.items(game_type).await?,
            None => Vec::new(),
        };

        {
            let ctx = ActionContext {
                now: now_millis(),
                items: &items,
                rules: &self.rules,
            };
            let mut rng = rand::rng();
            if let Err(e) = room.apply(&action, &ctx, &mut rng) {
                tracing::debug!(room = %room_id, action = action.name(), "Action rejected: {}", e);
                return Err(e.into());
            }
        }

        let room = self.store.update_room(room).await?.ok_or(RoomError::NotFound)?;
        tracing::info!(
            room = %room_id,
            action = action.name(),
            player = %action.player_id(),
            state = room.game_state.as_str(),
            "Action applied"
        );
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::static_catalogs;
    use crate::state::RoomRef;

    async fn room_of(state: &AppState, n: usize) -> RoomId {
        let (room, _) = state.create_room("player_0", "Host").await.unwrap();
        for i in 1..n {
            state
                .join_room(RoomRef::Id(room.id.clone()), &format!("player_{}", i), &format!("P{}", i))
                .await
                .unwrap();
        }
        room.id
    }

    #[tokio::test]
    async fn test_start_persists_round() {
        let state = AppState::in_memory(static_catalogs(10, 10));
        let room_id = room_of(&state, 3).await;

        let room = state
            .apply_action(
                &room_id,
                RoomAction::Start {
                    player_id: "player_0".to_string(),
                    game_type: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(room.game_state, GamePhase::Playing);
        let stored = state.store.get_room(&room_id).await.unwrap().unwrap();
        assert_eq!(stored, room);
    }

    #[tokio::test]
    async fn test_rejected_action_leaves_room_unchanged() {
        let state = AppState::in_memory(static_catalogs(10, 10));
        let room_id = room_of(&state, 3).await;
        let before = state.store.get_room(&room_id).await.unwrap().unwrap();

        let err = state
            .apply_action(
                &room_id,
                RoomAction::Start {
                    player_id: "player_2".to_string(),
                    game_type: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RoomError::Action(ActionError::NotHost(_))));
        assert_eq!(state.store.get_room(&room_id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_catalog_fails_start() {
        let catalogs = Catalogs::new(static_catalogs(10, 0).dota2, None);
        let state = AppState::in_memory(catalogs);
        let room_id = room_of(&state, 3).await;

        let err = state
            .apply_action(
                &room_id,
                RoomAction::Start {
                    player_id: "player_0".to_string(),
                    game_type: Some(GameType::ClashRoyale),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Clash Royale API key not configured");
    }

    #[tokio::test]
    async fn test_actor_checked_before_catalog_fetch() {
        let state = AppState::in_memory(Catalogs::new(None, None));
        let room_id = room_of(&state, 3).await;

        let start = |player_id: &str| RoomAction::Start {
            player_id: player_id.to_string(),
            game_type: None,
        };

        let err = state.apply_action(&room_id, start("player_1")).await.unwrap_err();
        assert!(matches!(err, RoomError::Action(ActionError::NotHost(_))));

        let err = state.apply_action(&room_id, start("player_ghost")).await.unwrap_err();
        assert!(matches!(err, RoomError::Action(ActionError::PlayerNotFound)));

        let err = state.apply_action(&room_id, start("player_0")).await.unwrap_err();
        assert!(matches!(err, RoomError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_concurrent_clues_are_all_kept() {
        let state = Arc::new(AppState::in_memory(static_catalogs(10, 10)));
        let room_id = room_of(&state, 5).await;
        state
            .apply_action(
                &room_id,
                RoomAction::Start {
                    player_id: "player_0".to_string(),
                    game_type: None,
                },
            )
            .await
            .unwrap();

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let state = state.clone();
                let room_id = room_id.clone();
                tokio::spawn(async move {
                    state
                        .apply_action(
                            &room_id,
                            RoomAction::SubmitClue {
                                player_id: format!("player_{}", i),
                                clue: format!("clue {}", i),
                            },
                        )
                        .await
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        let room = state.get_room(&room_id).await.unwrap();
        assert_eq!(room.clues.len(), 4);
        assert_eq!(room.game_state, GamePhase::Playing);
    }

    #[tokio::test]
    async fn test_invalid_ids() {
        let state = AppState::in_memory(static_catalogs(1, 1));
        let action = RoomAction::Reset {
            player_id: "player_0".to_string(),
        };
        let err = state.apply_action("lobby", action).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid room ID format");

        let action = RoomAction::Reset {
            player_id: "bad id".to_string(),
        };
        let err = state.apply_action("room_ABC234", action).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid player ID format");
    }
}
