use serde::{Deserialize, Serialize};

/// Opaque ID types for readability
pub type RoomId = String;
pub type PlayerId = String;

/// Unix timestamp in milliseconds
pub type Millis = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    #[default]
    Dota2,
    ClashRoyale,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameFormat {
    Imposter,
    Headsup,
    HeadsupOnline,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Lobby,
    Playing,
    Voting,
    Finished,
    HeadsupCountdown,
    HeadsupPlaying,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Lobby => "lobby",
            GamePhase::Playing => "playing",
            GamePhase::Voting => "voting",
            GamePhase::Finished => "finished",
            GamePhase::HeadsupCountdown => "headsup_countdown",
            GamePhase::HeadsupPlaying => "headsup_playing",
        }
    }
}

/// Dota 2 hero as served by the public datafeed (snake_case upstream)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hero {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub name_loc: String,
    pub name_english_loc: String,
    pub primary_attr: u8,
    pub complexity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CardIcons {
    #[serde(default)]
    pub medium: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evolution_medium: Option<String>,
}

/// Clash Royale card as served by the official API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClashRoyaleCard {
    pub name: String,
    pub id: u64,
    pub max_level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_evolution_level: Option<u32>,
    #[serde(default)]
    pub elixir_cost: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default)]
    pub icon_urls: CardIcons,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameHint {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl GameHint {
    pub fn new(kind: &str, value: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_imposter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<ClashRoyaleCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    pub has_submitted_clue: bool,
    /// Heads-up online: unique card key held by this player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_card_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_card_image: Option<String>,
    /// Heads-up online: correct guesses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            is_imposter: false,
            hero: None,
            card: None,
            clue: None,
            has_submitted_clue: false,
            assigned_card_id: None,
            assigned_card_name: None,
            assigned_card_image: None,
            score: None,
        }
    }

    /// Drop everything a round handed out, keeping identity
    pub fn clear_round(&mut self) {
        *self = Self::new(std::mem::take(&mut self.id), std::mem::take(&mut self.name));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub player_id: PlayerId,
    pub clue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteCount {
    pub player_id: PlayerId,
    pub votes: u32,
}

/// Outcome of an imposter round, filled in when the room reaches `finished`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_out_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imposter_id: Option<PlayerId>,
    pub was_imposter: bool,
    pub vote_counts: Vec<VoteCount>,
}

fn default_true() -> bool {
    true
}

fn default_round() -> u32 {
    1
}

/// Server-held record for one game session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameRoom {
    pub id: RoomId,
    pub players: Vec<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_card: Option<ClashRoyaleCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<GameType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_format: Option<GameFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<GameHint>>,
    #[serde(default = "default_true")]
    pub hints_enabled: bool,
    pub game_state: GamePhase,
    #[serde(default = "default_round")]
    pub round: u32,
    #[serde(default)]
    pub clues: Vec<Clue>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_start_time: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headsup_countdown_end: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RoundResult>,
}

impl GameRoom {
    /// Fresh lobby with the creator as host
    pub fn new(id: RoomId, host: Player) -> Self {
        Self {
            id,
            players: vec![host],
            current_hero: None,
            current_card: None,
            game_type: None,
            game_format: None,
            hints: None,
            hints_enabled: true,
            game_state: GamePhase::Lobby,
            round: 1,
            clues: Vec::new(),
            votes: Vec::new(),
            voting_start_time: None,
            headsup_countdown_end: None,
            last_updated: None,
            result: None,
        }
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host().is_some_and(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn imposter(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_imposter)
    }
}

/// Current time as Unix milliseconds
pub fn now_millis() -> Millis {
    chrono::Utc::now().timestamp_millis()
}
