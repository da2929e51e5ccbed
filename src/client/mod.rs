//! HTTP client for the rooms API, plus the polling loop that keeps a local
//! copy of a room up to date.

mod poller;
mod retry;

use rand::Rng;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::protocol::*;
use crate::state::RoomRef;
use crate::types::{now_millis, GameRoom, Millis};

pub use poller::{PollEnd, PollState, RoomPoller, RoomView, POLL_INTERVAL};
pub use retry::{is_retryable, retry_with_backoff, user_friendly_error, RetryPolicy};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error status
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// New player id: `player_<millis>_<9 base36 chars>`
pub fn generate_player_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("player_{}_{}", now_millis(), suffix)
}

/// Typed access to `/api/rooms`
#[derive(Debug, Clone)]
pub struct RoomClient {
    http: reqwest::Client,
    base_url: String,
}

impl RoomClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn rooms_url(&self) -> String {
        format!("{}/api/rooms", self.base_url)
    }

    fn room_url(&self, room_id: &str) -> String {
        format!("{}/api/rooms/{}", self.base_url, room_id)
    }

    /// Returns the new room and its shareable code
    pub async fn create_room(&self, player_id: &str, player_name: &str) -> ClientResult<(GameRoom, String)> {
        let request = RoomsRequest {
            action: "create".to_string(),
            player_id: Some(player_id.to_string()),
            player_name: Some(player_name.to_string()),
            ..Default::default()
        };
        let response = self.http.post(self.rooms_url()).json(&request).send().await?;
        let body: CreateRoomResponse = decode(response).await?;
        Ok((body.room, body.room_code))
    }

    pub async fn join_room(&self, room: RoomRef, player_id: &str, player_name: &str) -> ClientResult<GameRoom> {
        let (room_id, room_code) = match room {
            RoomRef::Id(id) => (Some(id), None),
            RoomRef::Code(code) => (None, Some(code)),
        };
        let request = RoomsRequest {
            action: "join".to_string(),
            room_id,
            room_code,
            player_id: Some(player_id.to_string()),
            player_name: Some(player_name.to_string()),
        };
        let response = self.http.post(self.rooms_url()).json(&request).send().await?;
        let body: RoomResponse = decode(response).await?;
        Ok(body.room)
    }

    pub async fn get_room(&self, room_id: &str) -> ClientResult<GameRoom> {
        self.get_room_since(room_id, None)
            .await?
            .ok_or_else(|| ClientError::Decode("Unexpected 304 without since".to_string()))
    }

    /// None if the room has not changed since `since`
    pub async fn get_room_since(&self, room_id: &str, since: Option<Millis>) -> ClientResult<Option<GameRoom>> {
        let mut request = self.http.get(self.room_url(room_id));
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }
        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        let body: RoomResponse = decode(response).await?;
        Ok(Some(body.room))
    }

    /// Send a named action and return the updated room
    pub async fn act(&self, room_id: &str, action: &RoomAction) -> ClientResult<GameRoom> {
        let response = self
            .http
            .patch(self.room_url(room_id))
            .json(action)
            .send()
            .await?;
        let body: RoomResponse = decode(response).await?;
        Ok(body.room)
    }
}

/// Parse a success body, or turn an error body into [`ClientError::Api`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                trimmed.to_string()
            }
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
