use super::*;
use rand::seq::IndexedRandom;
use std::collections::HashSet;

impl GameRoom {
    /// Move a finished countdown on to play. Returns true if the phase changed.
    pub fn settle_countdown(&mut self, now: Millis) -> bool {
        let elapsed = self.headsup_countdown_end.is_some_and(|end| end <= now);
        if self.game_state == GamePhase::HeadsupCountdown && elapsed {
            self.game_state = GamePhase::HeadsupPlaying;
            true
        } else {
            false
        }
    }

    /// Shared preconditions of both heads-up starts; returns one distinct item per player
    fn deal_distinct<'a, R: Rng + ?Sized>(
        &self,
        action: &'static str,
        game_type: GameType,
        ctx: &ActionContext<'a>,
        rng: &mut R,
    ) -> ActionResult<Vec<&'a CatalogItem>> {
        if !matches!(self.game_state, GamePhase::Lobby | GamePhase::Finished) {
            return Err(ActionError::wrong_phase(action, self.game_state));
        }
        if self.players.len() < ctx.rules.headsup_min_players {
            return Err(ActionError::NotEnoughPlayers {
                required: ctx.rules.headsup_min_players,
            });
        }
        if ctx.items.len() < self.players.len() {
            return Err(ActionError::NotEnoughItems(item_label(game_type)));
        }
        Ok(ctx
            .items
            .choose_multiple(rng, self.players.len())
            .collect())
    }

    fn begin_headsup(&mut self, game_type: GameType, format: GameFormat) {
        self.clear_round_data();
        self.game_type = Some(game_type);
        self.game_format = Some(format);
        self.round = 1;
    }

    pub(super) fn start_headsup<R: Rng + ?Sized>(
        &mut self,
        game_type: GameType,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        let picks = self.deal_distinct("start heads-up", game_type, ctx, rng)?;

        for (player, item) in self.players.iter_mut().zip(picks) {
            player.clear_round();
            give_item(player, item);
        }

        self.begin_headsup(game_type, GameFormat::Headsup);
        let countdown = i64::try_from(ctx.rules.headsup_countdown.as_millis()).unwrap_or(i64::MAX);
        self.headsup_countdown_end = Some(ctx.now.saturating_add(countdown));
        self.game_state = GamePhase::HeadsupCountdown;

        tracing::info!(room = %self.id, players = self.players.len(), "Heads-up countdown started");
        Ok(())
    }

    pub(super) fn start_headsup_online<R: Rng + ?Sized>(
        &mut self,
        game_type: GameType,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        let picks = self.deal_distinct("start online heads-up", game_type, ctx, rng)?;

        for (player, item) in self.players.iter_mut().zip(picks) {
            player.clear_round();
            assign_card(player, item);
            player.score = Some(0);
        }

        self.begin_headsup(game_type, GameFormat::HeadsupOnline);
        self.game_state = GamePhase::HeadsupPlaying;

        tracing::info!(room = %self.id, players = self.players.len(), "Online heads-up started");
        Ok(())
    }

    pub(super) fn rotate_card<R: Rng + ?Sized>(
        &mut self,
        actor_id: &str,
        target_id: &str,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        if self.game_format != Some(GameFormat::HeadsupOnline)
            || self.game_state != GamePhase::HeadsupPlaying
        {
            return Err(ActionError::wrong_phase("rotate cards", self.game_state));
        }
        if actor_id == target_id {
            return Err(ActionError::RotateOwnCard);
        }
        if self.player(target_id).is_none() {
            return Err(ActionError::TargetNotFound);
        }

        let held: HashSet<&str> = self
            .players
            .iter()
            .filter_map(|p| p.assigned_card_id.as_deref())
            .collect();
        let available: Vec<&CatalogItem> = ctx
            .items
            .iter()
            .filter(|item| !held.contains(item.key().as_str()))
            .collect();
        let next = *available.choose(rng).ok_or(ActionError::NoCardsLeft)?;

        let target = self
            .player_mut(target_id)
            .ok_or(ActionError::TargetNotFound)?;
        target.score = Some(target.score.unwrap_or(0) + 1);
        assign_card(target, next);

        tracing::debug!(
            room = %self.id,
            player = %target_id,
            card = next.display_name(),
            "Card rotated"
        );
        Ok(())
    }
}

fn assign_card(player: &mut Player, item: &CatalogItem) {
    player.assigned_card_id = Some(item.key());
    player.assigned_card_name = Some(item.display_name().to_string());
    player.assigned_card_image = item.image_url();
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::catalog::fixtures;

    fn start_online(room: &mut GameRoom, items: &[CatalogItem]) -> ActionResult {
        let rules = GameRules::default();
        let action = RoomAction::StartHeadsUpOnline {
            player_id: id(0),
            game_type: Some(GameType::ClashRoyale),
        };
        room.apply(&action, &ctx(items, &rules), &mut rng())
    }

    fn rotate(room: &mut GameRoom, items: &[CatalogItem], actor: usize, target: usize) -> ActionResult {
        let rules = GameRules::default();
        let action = RoomAction::RotateCard {
            player_id: id(actor),
            target_player_id: id(target),
        };
        room.apply(&action, &ctx(items, &rules), &mut rng())
    }

    #[test]
    fn test_headsup_deals_distinct_items() {
        let mut room = room_with(4);
        let items = fixtures::heroes(4);
        let rules = GameRules::default();
        let action = RoomAction::StartHeadsUp {
            player_id: id(0),
            game_type: None,
        };
        room.apply(&action, &ctx(&items, &rules), &mut rng()).unwrap();

        assert_eq!(room.game_state, GamePhase::HeadsupCountdown);
        assert_eq!(room.game_format, Some(GameFormat::Headsup));
        assert_eq!(room.headsup_countdown_end, Some(NOW + 3_000));

        let ids: HashSet<u32> = room
            .players
            .iter()
            .map(|p| p.hero.as_ref().unwrap().id)
            .collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_headsup_needs_enough_items() {
        let mut room = room_with(3);
        let items = fixtures::heroes(2);
        let rules = GameRules::default();
        let action = RoomAction::StartHeadsUp {
            player_id: id(0),
            game_type: None,
        };
        let err = room.apply(&action, &ctx(&items, &rules), &mut rng()).unwrap_err();
        assert_eq!(err.to_string(), "Not enough heroes for every player");
        assert_eq!(room.game_state, GamePhase::Lobby);
    }

    #[test]
    fn test_headsup_needs_two_players() {
        let mut room = room_with(1);
        let items = fixtures::heroes(5);
        let rules = GameRules::default();
        let action = RoomAction::StartHeadsUp {
            player_id: id(0),
            game_type: None,
        };
        let err = room.apply(&action, &ctx(&items, &rules), &mut rng()).unwrap_err();
        assert_eq!(err, ActionError::NotEnoughPlayers { required: 2 });
    }

    #[test]
    fn test_countdown_settles() {
        let mut room = room_with(2);
        room.game_state = GamePhase::HeadsupCountdown;
        room.headsup_countdown_end = Some(NOW);

        assert!(!room.settle_countdown(NOW - 1));
        assert_eq!(room.game_state, GamePhase::HeadsupCountdown);
        assert!(room.settle_countdown(NOW));
        assert_eq!(room.game_state, GamePhase::HeadsupPlaying);
        assert!(!room.settle_countdown(NOW + 10));
    }

    #[test]
    fn test_online_headsup_assigns_cards() {
        let mut room = room_with(3);
        let items = fixtures::cards(6);
        start_online(&mut room, &items).unwrap();

        assert_eq!(room.game_state, GamePhase::HeadsupPlaying);
        assert_eq!(room.game_format, Some(GameFormat::HeadsupOnline));

        let held: HashSet<_> = room
            .players
            .iter()
            .map(|p| p.assigned_card_id.clone().unwrap())
            .collect();
        assert_eq!(held.len(), 3);
        for player in &room.players {
            assert_eq!(player.score, Some(0));
            assert!(player.assigned_card_name.is_some());
            assert!(player.assigned_card_image.as_deref().unwrap().starts_with("https://"));
        }
    }

    #[test]
    fn test_rotate_card_scores_and_replaces() {
        let mut room = room_with(2);
        let items = fixtures::cards(4);
        start_online(&mut room, &items).unwrap();
        let old = room.player(&id(1)).unwrap().assigned_card_id.clone();

        rotate(&mut room, &items, 0, 1).unwrap();

        let target = room.player(&id(1)).unwrap();
        assert_eq!(target.score, Some(1));
        assert_ne!(target.assigned_card_id, old);
        assert_ne!(
            target.assigned_card_id,
            room.player(&id(0)).unwrap().assigned_card_id
        );
    }

    #[test]
    fn test_rotate_card_rules() {
        let mut room = room_with(2);
        let items = fixtures::cards(2);

        assert!(matches!(
            rotate(&mut room, &items, 0, 1),
            Err(ActionError::WrongPhase { .. })
        ));

        start_online(&mut room, &items).unwrap();
        assert_eq!(rotate(&mut room, &items, 1, 1), Err(ActionError::RotateOwnCard));

        // both cards are held, nothing left to deal
        let before = room.clone();
        assert_eq!(rotate(&mut room, &items, 1, 0), Err(ActionError::NoCardsLeft));
        assert_eq!(room, before);
    }

    #[test]
    fn test_offline_headsup_cannot_rotate() {
        let mut room = room_with(2);
        let items = fixtures::cards(4);
        room.game_format = Some(GameFormat::Headsup);
        room.game_state = GamePhase::HeadsupPlaying;
        assert!(matches!(
            rotate(&mut room, &items, 0, 1),
            Err(ActionError::WrongPhase { .. })
        ));
    }
}
