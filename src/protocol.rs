//! JSON request and response bodies shared by the server and the Rust client.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Named mutations applied through `PATCH /api/rooms/{roomId}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RoomAction {
    Start {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_type: Option<GameType>,
    },
    SubmitClue {
        player_id: PlayerId,
        clue: String,
    },
    Vote {
        player_id: PlayerId,
        target_player_id: PlayerId,
    },
    /// Host: move on without waiting for the remaining clues or votes
    Skip {
        player_id: PlayerId,
    },
    NextRound {
        player_id: PlayerId,
    },
    /// Host: set hints on/off, or flip them when `enabled` is absent
    ToggleHints {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
    KickPlayer {
        player_id: PlayerId,
        target_player_id: PlayerId,
    },
    Reset {
        player_id: PlayerId,
    },
    StartHeadsUp {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_type: Option<GameType>,
    },
    StartHeadsUpOnline {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_type: Option<GameType>,
    },
    /// Mark the target's guess correct and deal them a new card
    RotateCard {
        player_id: PlayerId,
        target_player_id: PlayerId,
    },
}

impl RoomAction {
    /// The acting player
    pub fn player_id(&self) -> &str {
        match self {
            RoomAction::Start { player_id, .. }
            | RoomAction::SubmitClue { player_id, .. }
            | RoomAction::Vote { player_id, .. }
            | RoomAction::Skip { player_id }
            | RoomAction::NextRound { player_id }
            | RoomAction::ToggleHints { player_id, .. }
            | RoomAction::KickPlayer { player_id, .. }
            | RoomAction::Reset { player_id }
            | RoomAction::StartHeadsUp { player_id, .. }
            | RoomAction::StartHeadsUpOnline { player_id, .. }
            | RoomAction::RotateCard { player_id, .. } => player_id,
        }
    }

    /// Wire name of the action
    pub fn name(&self) -> &'static str {
        match self {
            RoomAction::Start { .. } => "start",
            RoomAction::SubmitClue { .. } => "submitClue",
            RoomAction::Vote { .. } => "vote",
            RoomAction::Skip { .. } => "skip",
            RoomAction::NextRound { .. } => "nextRound",
            RoomAction::ToggleHints { .. } => "toggleHints",
            RoomAction::KickPlayer { .. } => "kickPlayer",
            RoomAction::Reset { .. } => "reset",
            RoomAction::StartHeadsUp { .. } => "startHeadsUp",
            RoomAction::StartHeadsUpOnline { .. } => "startHeadsUpOnline",
            RoomAction::RotateCard { .. } => "rotateCard",
        }
    }

    /// Which catalog (if any) the action draws items from
    pub fn catalog_needed(&self, room: &GameRoom) -> Option<GameType> {
        match self {
            RoomAction::Start { game_type, .. }
            | RoomAction::StartHeadsUp { game_type, .. }
            | RoomAction::StartHeadsUpOnline { game_type, .. } => {
                Some(game_type.unwrap_or_default())
            }
            RoomAction::NextRound { .. } | RoomAction::RotateCard { .. } => {
                Some(room.game_type.unwrap_or_default())
            }
            _ => None,
        }
    }
}

/// Body of `POST /api/rooms`
///
/// Fields are optional so missing values produce the API's own error messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room: GameRoom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room: GameRoom,
    pub room_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub max_age_hours: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

/// `GET /api/heroes`, shaped like the upstream datafeed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroesResponse {
    pub result: HeroesResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroesResult {
    pub data: HeroesData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroesData {
    pub heroes: Vec<Hero>,
}

impl HeroesResponse {
    pub fn new(heroes: Vec<Hero>) -> Self {
        Self {
            result: HeroesResult {
                data: HeroesData { heroes },
            },
        }
    }
}

/// `GET /api/clash-royale/cards`, shaped like the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsResponse {
    pub items: Vec<ClashRoyaleCard>,
}
