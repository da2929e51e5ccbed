//! Room mutations behind the named actions.
//!
//! Everything here is synchronous and works on an owned [`GameRoom`]: the
//! caller loads the room, fetches any catalog items the action needs, applies
//! the action and writes the room back. A failed action returns before the
//! caller persists anything, so a rejected request never changes the room.

mod headsup;
mod imposter;
mod lobby;

use rand::Rng;
use std::time::Duration;

use crate::catalog::CatalogItem;
use crate::config::env_parse;
use crate::protocol::RoomAction;
use crate::types::*;

pub type ActionResult<T = ()> = Result<T, ActionError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Only the host can {0}")]
    NotHost(&'static str),

    #[error("Player not found in room")]
    PlayerNotFound,

    #[error("Target player not found in room")]
    TargetNotFound,

    #[error("Cannot {action} while the game is in {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Need at least {required} players to start")]
    NotEnoughPlayers { required: usize },

    #[error("Not enough {0} for every player")]
    NotEnoughItems(&'static str),

    #[error("No more cards available")]
    NoCardsLeft,

    #[error("Clue cannot be empty")]
    EmptyClue,

    #[error("You cannot vote for yourself")]
    SelfVote,

    #[error("Host cannot kick themselves")]
    KickSelf,

    #[error("You cannot mark your own card as guessed")]
    RotateOwnCard,

    #[error("Room is full (maximum {0} players)")]
    RoomFull(usize),

    #[error("Game already in progress")]
    GameInProgress,

    #[error("{0} items not loaded")]
    MissingItems(&'static str),
}

impl ActionError {
    fn wrong_phase(action: &'static str, phase: GamePhase) -> Self {
        ActionError::WrongPhase {
            action,
            phase: phase.as_str(),
        }
    }
}

/// Tunable game limits
#[derive(Debug, Clone)]
pub struct GameRules {
    pub min_players: usize,
    pub max_players: usize,
    pub headsup_min_players: usize,
    pub headsup_countdown: Duration,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 10,
            headsup_min_players: 2,
            headsup_countdown: Duration::from_secs(3),
        }
    }
}

impl GameRules {
    /// Load from MIN_PLAYERS, MAX_PLAYERS and HEADSUP_COUNTDOWN_SECS
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_players: env_parse("MIN_PLAYERS").unwrap_or(defaults.min_players),
            max_players: env_parse("MAX_PLAYERS").unwrap_or(defaults.max_players),
            headsup_min_players: defaults.headsup_min_players,
            headsup_countdown: env_parse("HEADSUP_COUNTDOWN_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.headsup_countdown),
        }
    }
}

/// Inputs an action may draw on besides the room itself
pub struct ActionContext<'a> {
    pub now: Millis,
    /// Items of the catalog named by [`RoomAction::catalog_needed`]
    pub items: &'a [CatalogItem],
    pub rules: &'a GameRules,
}

/// What a non-host is refused, for host-only actions
fn host_only(action: &RoomAction) -> Option<&'static str> {
    match action {
        RoomAction::Start { .. } => Some("start the game"),
        RoomAction::Skip { .. } => Some("skip"),
        RoomAction::NextRound { .. } => Some("start the next round"),
        RoomAction::ToggleHints { .. } => Some("toggle hints"),
        RoomAction::KickPlayer { .. } => Some("kick players"),
        RoomAction::Reset { .. } => Some("reset the game"),
        RoomAction::StartHeadsUp { .. } => Some("start heads-up"),
        RoomAction::StartHeadsUpOnline { .. } => Some("start online heads-up"),
        RoomAction::SubmitClue { .. } | RoomAction::Vote { .. } | RoomAction::RotateCard { .. } => {
            None
        }
    }
}

impl GameRoom {
    /// Check that the actor is in the room and may send this action at all
    pub fn authorize(&self, action: &RoomAction) -> ActionResult {
        let player_id = action.player_id();
        if self.player(player_id).is_none() {
            return Err(ActionError::PlayerNotFound);
        }
        match host_only(action) {
            Some(verb) if !self.is_host(player_id) => Err(ActionError::NotHost(verb)),
            _ => Ok(()),
        }
    }

    /// Apply one named action
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        action: &RoomAction,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) -> ActionResult {
        self.settle_countdown(ctx.now);
        self.authorize(action)?;

        let player_id = action.player_id();
        match action {
            RoomAction::Start { game_type, .. } => {
                self.start_round(game_type.unwrap_or_default(), ctx, rng)
            }
            RoomAction::SubmitClue { clue, .. } => self.submit_clue(player_id, clue, ctx.now),
            RoomAction::Vote {
                target_player_id, ..
            } => self.cast_vote(player_id, target_player_id),
            RoomAction::Skip { .. } => self.skip(ctx.now),
            RoomAction::NextRound { .. } => self.next_round(ctx, rng),
            RoomAction::ToggleHints { enabled, .. } => {
                self.toggle_hints(*enabled);
                Ok(())
            }
            RoomAction::KickPlayer {
                target_player_id, ..
            } => self.kick(player_id, target_player_id, ctx.now),
            RoomAction::Reset { .. } => {
                self.reset();
                Ok(())
            }
            RoomAction::StartHeadsUp { game_type, .. } => {
                self.start_headsup(game_type.unwrap_or_default(), ctx, rng)
            }
            RoomAction::StartHeadsUpOnline { game_type, .. } => {
                self.start_headsup_online(game_type.unwrap_or_default(), ctx, rng)
            }
            RoomAction::RotateCard {
                target_player_id, ..
            } => self.rotate_card(player_id, target_player_id, ctx, rng),
        }
    }
}

/// Label for the items of a game type, used in error messages
fn item_label(game_type: GameType) -> &'static str {
    match game_type {
        GameType::Dota2 => "heroes",
        GameType::ClashRoyale => "cards",
    }
}

/// Hand `item` to a player as their secret hero or card
fn give_item(player: &mut Player, item: &CatalogItem) {
    match item {
        CatalogItem::Hero(hero) => player.hero = Some(hero.clone()),
        CatalogItem::Card(card) => player.card = Some(card.clone()),
    }
}
