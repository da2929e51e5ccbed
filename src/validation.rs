//! Input sanitization and identifier checks for the rooms API.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Safe character set for room codes (excludes 0/O, 1/I to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;

const MAX_NAME_CHARS: usize = 30;
const MAX_CLUE_CHARS: usize = 500;

/// Fallback when sanitizing strips a non-empty name down to nothing
pub const DEFAULT_PLAYER_NAME: &str = "Player";

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ROOM_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6}$").unwrap());
static ROOM_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^room_[A-Z0-9]+$").unwrap());
static PLAYER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^player_[a-zA-Z0-9_]+$").unwrap());

fn strip_tags_and_truncate(input: &str, max_chars: usize) -> String {
    HTML_TAG
        .replace_all(input, "")
        .trim()
        .chars()
        .take(max_chars)
        .collect()
}

/// Remove markup and problematic characters from a display name.
///
/// Empty input stays empty so callers can reject it; input that only
/// consisted of markup becomes [`DEFAULT_PLAYER_NAME`].
pub fn sanitize_player_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let sanitized: String = strip_tags_and_truncate(name, MAX_NAME_CHARS)
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect();

    if sanitized.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        sanitized
    }
}

/// Remove markup and quotes from a clue. May return an empty string.
pub fn sanitize_clue(clue: &str) -> String {
    strip_tags_and_truncate(clue, MAX_CLUE_CHARS)
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect()
}

pub fn validate_room_code(code: &str) -> bool {
    ROOM_CODE.is_match(&code.to_uppercase())
}

pub fn validate_room_id(room_id: &str) -> bool {
    ROOM_ID.is_match(room_id)
}

pub fn validate_player_id(player_id: &str) -> bool {
    PLAYER_ID.is_match(player_id)
}

/// Room id for a (case-insensitive) room code
pub fn room_id_for_code(code: &str) -> String {
    format!("room_{}", code.to_uppercase())
}

/// Room code embedded in a room id
pub fn code_for_room_id(room_id: &str) -> &str {
    room_id.strip_prefix("room_").unwrap_or(room_id)
}

/// Generate a random room code
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}
