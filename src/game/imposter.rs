use super::*;
use crate::validation::sanitize_clue;
use rand::seq::IndexedRandom;

impl GameRoom {
    /// Deal a fresh imposter round: one secret item, one imposter
    fn deal_round<R: Rng + ?Sized>(
        &mut self,
        game_type: GameType,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        if self.players.len() < ctx.rules.min_players {
            return Err(ActionError::NotEnoughPlayers {
                required: ctx.rules.min_players,
            });
        }

        let item = ctx
            .items
            .choose(rng)
            .ok_or(ActionError::MissingItems(item_label(game_type)))?;
        let imposter_index = rng.random_range(0..self.players.len());

        for (index, player) in self.players.iter_mut().enumerate() {
            player.clear_round();
            if index == imposter_index {
                player.is_imposter = true;
            } else {
                give_item(player, item);
            }
        }

        self.clear_round_data();
        match item {
            CatalogItem::Hero(hero) => self.current_hero = Some(hero.clone()),
            CatalogItem::Card(card) => self.current_card = Some(card.clone()),
        }
        self.hints = Some(item.hints());
        self.game_type = Some(game_type);
        self.game_format = Some(GameFormat::Imposter);
        self.game_state = GamePhase::Playing;

        tracing::info!(
            room = %self.id,
            item = item.display_name(),
            players = self.players.len(),
            "Imposter round dealt"
        );
        Ok(())
    }

    pub(super) fn start_round<R: Rng + ?Sized>(
        &mut self,
        game_type: GameType,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        if !matches!(self.game_state, GamePhase::Lobby | GamePhase::Finished) {
            return Err(ActionError::wrong_phase("start the game", self.game_state));
        }
        self.deal_round(game_type, ctx, rng)?;
        self.round = 1;
        Ok(())
    }

    pub(super) fn next_round<R: Rng + ?Sized>(
        &mut self,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        if self.game_state != GamePhase::Finished
            || self.game_format != Some(GameFormat::Imposter)
        {
            return Err(ActionError::wrong_phase(
                "start the next round",
                self.game_state,
            ));
        }
        let round = self.round;
        self.deal_round(self.game_type.unwrap_or_default(), ctx, rng)?;
        self.round = round + 1;
        Ok(())
    }

    pub(super) fn submit_clue(&mut self, player_id: &str, clue: &str, now: Millis) -> ActionResult {
        if self.game_state != GamePhase::Playing {
            return Err(ActionError::wrong_phase("submit a clue", self.game_state));
        }

        let clue = sanitize_clue(clue);
        if clue.is_empty() {
            return Err(ActionError::EmptyClue);
        }

        let player = self
            .player_mut(player_id)
            .ok_or(ActionError::PlayerNotFound)?;
        player.clue = Some(clue.clone());
        player.has_submitted_clue = true;

        self.clues.retain(|c| c.player_id != player_id);
        self.clues.push(Clue {
            player_id: player_id.to_string(),
            clue,
        });

        self.advance_if_all_clues(now);
        Ok(())
    }

    pub(super) fn cast_vote(&mut self, voter_id: &str, target_id: &str) -> ActionResult {
        if self.game_state != GamePhase::Voting {
            return Err(ActionError::wrong_phase("vote", self.game_state));
        }
        if self.player(target_id).is_none() {
            return Err(ActionError::TargetNotFound);
        }
        if voter_id == target_id {
            return Err(ActionError::SelfVote);
        }

        self.votes.retain(|v| v.voter_id != voter_id);
        self.votes.push(Vote {
            voter_id: voter_id.to_string(),
            target_id: target_id.to_string(),
        });

        self.finish_if_all_voted();
        Ok(())
    }

    pub(super) fn skip(&mut self, now: Millis) -> ActionResult {
        match self.game_state {
            GamePhase::Playing => {
                self.open_voting(now);
                Ok(())
            }
            GamePhase::Voting => {
                self.finish_round();
                Ok(())
            }
            phase => Err(ActionError::wrong_phase("skip", phase)),
        }
    }

    /// Move to voting once every player has a clue in
    pub(super) fn advance_if_all_clues(&mut self, now: Millis) {
        if self.game_state == GamePhase::Playing
            && !self.players.is_empty()
            && self.players.iter().all(|p| p.has_submitted_clue)
        {
            self.open_voting(now);
        }
    }

    /// Finish once every player has voted
    pub(super) fn finish_if_all_voted(&mut self) {
        if self.game_state == GamePhase::Voting
            && !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.votes.iter().any(|v| v.voter_id == p.id))
        {
            self.finish_round();
        }
    }

    fn open_voting(&mut self, now: Millis) {
        self.game_state = GamePhase::Voting;
        self.voting_start_time = Some(now);
    }

    fn finish_round(&mut self) {
        let result = self.tally();
        tracing::info!(
            room = %self.id,
            voted_out = ?result.voted_out_id,
            caught = result.was_imposter,
            "Round finished"
        );
        self.result = Some(result);
        self.game_state = GamePhase::Finished;
    }

    /// Count votes per target. Ties go to the target voted for first.
    pub fn tally(&self) -> RoundResult {
        let mut counts: Vec<VoteCount> = Vec::new();
        for vote in &self.votes {
            match counts.iter_mut().find(|c| c.player_id == vote.target_id) {
                Some(count) => count.votes += 1,
                None => counts.push(VoteCount {
                    player_id: vote.target_id.clone(),
                    votes: 1,
                }),
            }
        }
        // stable sort keeps first-vote order among equal counts
        counts.sort_by(|a, b| b.votes.cmp(&a.votes));

        let voted_out_id = counts.first().map(|c| c.player_id.clone());
        let imposter_id = self.imposter().map(|p| p.id.clone());
        let was_imposter = voted_out_id.is_some() && voted_out_id == imposter_id;

        RoundResult {
            voted_out_id,
            imposter_id,
            was_imposter,
            vote_counts: counts,
        }
    }
}
