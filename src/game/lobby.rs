use super::*;

impl GameRoom {
    /// Check whether a player who is not yet in the room may join
    pub fn check_admission(&self, rules: &GameRules) -> ActionResult {
        if self.players.len() >= rules.max_players {
            return Err(ActionError::RoomFull(rules.max_players));
        }
        if !matches!(self.game_state, GamePhase::Lobby | GamePhase::Finished) {
            return Err(ActionError::GameInProgress);
        }
        Ok(())
    }

    /// Update a returning player's name. Returns true if it changed.
    pub fn rename_player(&mut self, player_id: &str, name: &str) -> bool {
        match self.player_mut(player_id) {
            Some(player) if player.name != name => {
                player.name = name.to_string();
                true
            }
            _ => false,
        }
    }

    pub(super) fn toggle_hints(&mut self, enabled: Option<bool>) {
        self.hints_enabled = enabled.unwrap_or(!self.hints_enabled);
    }

    pub(super) fn kick(&mut self, host_id: &str, target_id: &str, now: Millis) -> ActionResult {
        if host_id == target_id {
            return Err(ActionError::KickSelf);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == target_id)
            .ok_or(ActionError::TargetNotFound)?;

        let kicked = self.players.remove(index);
        self.clues.retain(|c| c.player_id != target_id);
        self.votes
            .retain(|v| v.voter_id != target_id && v.target_id != target_id);

        tracing::info!(room = %self.id, player = %kicked.id, "Player kicked");

        let mid_round = matches!(self.game_state, GamePhase::Playing | GamePhase::Voting);
        if kicked.is_imposter && mid_round {
            tracing::info!(room = %self.id, "Imposter left, round aborted");
            self.clear_round_data();
            for player in &mut self.players {
                player.clear_round();
            }
            self.game_state = GamePhase::Lobby;
            return Ok(());
        }

        self.advance_if_all_clues(now);
        self.finish_if_all_voted();
        Ok(())
    }

    pub(super) fn reset(&mut self) {
        self.clear_round_data();
        self.game_type = None;
        self.game_format = None;
        self.round = 1;
        self.game_state = GamePhase::Lobby;
        for player in &mut self.players {
            player.clear_round();
        }
    }

    /// Drop the secret item and everything collected during a round
    pub(super) fn clear_round_data(&mut self) {
        self.current_hero = None;
        self.current_card = None;
        self.hints = None;
        self.clues.clear();
        self.votes.clear();
        self.voting_start_time = None;
        self.headsup_countdown_end = None;
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::catalog::fixtures;

    fn act(room: &mut GameRoom, action: RoomAction) -> ActionResult {
        let items = fixtures::heroes(5);
        let rules = GameRules::default();
        room.apply(&action, &ctx(&items, &rules), &mut rng())
    }

    fn kick(target: usize) -> RoomAction {
        RoomAction::KickPlayer {
            player_id: id(0),
            target_player_id: id(target),
        }
    }

    #[test]
    fn test_admission() {
        let rules = GameRules::default();
        let mut room = room_with(9);
        assert!(room.check_admission(&rules).is_ok());

        room.players
            .push(Player::new("player_x".to_string(), "X".to_string()));
        let err = room.check_admission(&rules).unwrap_err();
        assert_eq!(err.to_string(), "Room is full (maximum 10 players)");

        let mut room = room_with(3);
        room.game_state = GamePhase::Voting;
        assert_eq!(room.check_admission(&rules), Err(ActionError::GameInProgress));
        room.game_state = GamePhase::Finished;
        assert!(room.check_admission(&rules).is_ok());
    }

    #[test]
    fn test_rename_player() {
        let mut room = room_with(2);
        assert!(!room.rename_player(&id(1), "P1"));
        assert!(room.rename_player(&id(1), "Zed"));
        assert_eq!(room.player(&id(1)).unwrap().name, "Zed");
        assert!(!room.rename_player("player_ghost", "Nobody"));
    }

    #[test]
    fn test_toggle_hints() {
        let mut room = room_with(3);
        assert!(room.hints_enabled);

        act(&mut room, RoomAction::ToggleHints { player_id: id(0), enabled: None }).unwrap();
        assert!(!room.hints_enabled);

        act(&mut room, RoomAction::ToggleHints { player_id: id(0), enabled: Some(false) }).unwrap();
        assert!(!room.hints_enabled);

        let err = act(&mut room, RoomAction::ToggleHints { player_id: id(1), enabled: Some(true) });
        assert_eq!(err, Err(ActionError::NotHost("toggle hints")));
    }

    #[test]
    fn test_kick_in_lobby() {
        let mut room = room_with(3);
        act(&mut room, kick(2)).unwrap();
        assert_eq!(room.players.len(), 2);
        assert!(room.player(&id(2)).is_none());

        assert_eq!(act(&mut room, kick(0)), Err(ActionError::KickSelf));
        assert_eq!(act(&mut room, kick(7)), Err(ActionError::TargetNotFound));
    }

    #[test]
    fn test_kick_imposter_aborts_round() {
        let mut room = room_with(4);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();

        let imposter = room.players.iter().position(|p| p.is_imposter).unwrap();
        if imposter == 0 {
            // the host can't be kicked; move the role for this scenario
            room.players[0].is_imposter = false;
            room.players[1].is_imposter = true;
        }
        let imposter = room.players.iter().position(|p| p.is_imposter).unwrap();

        act(&mut room, kick(imposter)).unwrap();

        assert_eq!(room.game_state, GamePhase::Lobby);
        assert!(room.current_hero.is_none());
        assert!(room.players.iter().all(|p| p.hero.is_none() && !p.is_imposter));
    }

    #[test]
    fn test_kick_completes_clue_phase() {
        let mut room = room_with(4);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();
        for player in room.players.iter_mut() {
            player.is_imposter = false;
        }
        room.players[0].is_imposter = true;

        for i in 0..3 {
            act(
                &mut room,
                RoomAction::SubmitClue {
                    player_id: id(i),
                    clue: format!("clue {}", i),
                },
            )
            .unwrap();
        }
        assert_eq!(room.game_state, GamePhase::Playing);

        // the only player without a clue leaves
        act(&mut room, kick(3)).unwrap();
        assert_eq!(room.game_state, GamePhase::Voting);
        assert_eq!(room.voting_start_time, Some(NOW));
    }

    #[test]
    fn test_kick_removes_votes() {
        let mut room = room_with(4);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();
        for player in room.players.iter_mut() {
            player.is_imposter = false;
        }
        room.players[0].is_imposter = true;
        act(&mut room, RoomAction::Skip { player_id: id(0) }).unwrap();

        room.votes = vec![
            Vote { voter_id: id(0), target_id: id(3) },
            Vote { voter_id: id(3), target_id: id(1) },
            Vote { voter_id: id(1), target_id: id(0) },
        ];

        act(&mut room, kick(3)).unwrap();
        assert_eq!(room.votes, vec![Vote { voter_id: id(1), target_id: id(0) }]);
        assert_eq!(room.game_state, GamePhase::Voting);
    }

    #[test]
    fn test_kick_last_voter_finishes_round() {
        let mut room = room_with(4);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();
        for player in room.players.iter_mut() {
            player.is_imposter = false;
        }
        room.players[1].is_imposter = true;
        act(&mut room, RoomAction::Skip { player_id: id(0) }).unwrap();

        for voter in [0, 2] {
            act(
                &mut room,
                RoomAction::Vote {
                    player_id: id(voter),
                    target_player_id: id(1),
                },
            )
            .unwrap();
        }
        act(&mut room, RoomAction::Vote { player_id: id(1), target_player_id: id(2) }).unwrap();
        assert_eq!(room.game_state, GamePhase::Voting);

        // player 3 never voted
        act(&mut room, kick(3)).unwrap();

        assert_eq!(room.game_state, GamePhase::Finished);
        let result = room.result.as_ref().unwrap();
        assert_eq!(result.voted_out_id.as_deref(), Some(id(1).as_str()));
        assert!(result.was_imposter);
    }

    #[test]
    fn test_kick_imposter_during_voting_aborts_round() {
        let mut room = room_with(4);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();
        for player in room.players.iter_mut() {
            player.is_imposter = false;
        }
        room.players[2].is_imposter = true;
        act(&mut room, RoomAction::Skip { player_id: id(0) }).unwrap();
        act(&mut room, RoomAction::Vote { player_id: id(1), target_player_id: id(2) }).unwrap();
        assert_eq!(room.game_state, GamePhase::Voting);

        act(&mut room, kick(2)).unwrap();

        assert_eq!(room.game_state, GamePhase::Lobby);
        assert!(room.votes.is_empty());
        assert!(room.voting_start_time.is_none());
        assert!(room.result.is_none());
        assert!(room.players.iter().all(|p| p.hero.is_none() && !p.is_imposter));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut room = room_with(3);
        act(&mut room, RoomAction::Start { player_id: id(0), game_type: None }).unwrap();
        act(&mut room, RoomAction::Skip { player_id: id(0) }).unwrap();
        act(&mut room, RoomAction::Skip { player_id: id(0) }).unwrap();
        room.round = 4;

        act(&mut room, RoomAction::Reset { player_id: id(0) }).unwrap();

        assert_eq!(room.game_state, GamePhase::Lobby);
        assert_eq!(room.round, 1);
        assert!(room.game_type.is_none());
        assert!(room.game_format.is_none());
        assert!(room.hints.is_none());
        assert!(room.result.is_none());
        assert_eq!(room.players.len(), 3);
        assert!(room.players.iter().all(|p| !p.is_imposter && p.hero.is_none()));
    }
}
