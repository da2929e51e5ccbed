use super::*;
use crate::types::now_millis;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TABLE: &str = "game_rooms";

/// Rooms stored as JSON in a Supabase `game_rooms` table via PostgREST.
///
/// Columns: `id` (text, primary key), `data` (jsonb), `updated_at` (timestamptz).
pub struct SupabaseStore {
    client: reqwest::Client,
    table_url: String,
    service_role_key: String,
}

#[derive(Debug, Serialize)]
struct RoomRow<'a> {
    id: &'a str,
    data: &'a GameRoom,
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct RoomPatch<'a> {
    data: &'a GameRoom,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct DataColumn {
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct IdColumn {
    #[allow(dead_code)] // Only the row count matters
    id: String,
}

fn iso_timestamp(millis: Millis) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn backend_error(context: &str, e: impl std::fmt::Display) -> StoreError {
    tracing::error!("Supabase {} error: {}", context, e);
    StoreError::Backend(format!("{}: {}", context, e))
}

impl SupabaseStore {
    pub fn new(url: &str, service_role_key: &str) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), TABLE),
            service_role_key: service_role_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header(header::ACCEPT, "application/json")
    }

    async fn check(context: &str, response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(backend_error(context, format!("{} {}", status.as_u16(), body.trim())))
    }

    /// Write a room row, returning whether a row matched
    async fn write_room(&self, room: &GameRoom) -> StoreResult<bool> {
        let patch = RoomPatch {
            data: room,
            updated_at: iso_timestamp(room.last_updated.unwrap_or_else(now_millis)),
        };

        let response = self
            .request(reqwest::Method::PATCH)
            .query(&[("id", format!("eq.{}", room.id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| backend_error("updateRoom", e))?;

        let rows: Vec<IdColumn> = Self::check("updateRoom", response)
            .await?
            .json()
            .await
            .map_err(|e| backend_error("updateRoom", e))?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl RoomStore for SupabaseStore {
    async fn create_room(&self, room_id: &str, host: NewPlayer) -> StoreResult<GameRoom> {
        let mut room = GameRoom::new(room_id.to_string(), host.into());
        let now = now_millis();
        room.last_updated = Some(now);

        let row = RoomRow {
            id: room_id,
            data: &room,
            updated_at: iso_timestamp(now),
        };

        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| backend_error("createRoom", e))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::AlreadyExists(room_id.to_string()));
        }
        Self::check("createRoom", response).await?;
        Ok(room)
    }

    async fn get_room(&self, room_id: &str) -> StoreResult<Option<GameRoom>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("id", format!("eq.{}", room_id)), ("select", "data".to_string())])
            .send()
            .await
            .map_err(|e| backend_error("getRoom", e))?;

        let rows: Vec<DataColumn> = Self::check("getRoom", response)
            .await?
            .json()
            .await
            .map_err(|e| backend_error("getRoom", e))?;

        match rows.into_iter().next() {
            Some(row) if !row.data.is_null() => serde_json::from_value(row.data)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            _ => Ok(None),
        }
    }

    async fn update_room(&self, mut room: GameRoom) -> StoreResult<Option<GameRoom>> {
        room.last_updated = Some(next_stamp(room.last_updated));
        if self.write_room(&room).await? {
            Ok(Some(room))
        } else {
            Ok(None)
        }
    }

    async fn add_player(&self, room_id: &str, player: NewPlayer) -> StoreResult<Option<GameRoom>> {
        let Some(mut room) = self.get_room(room_id).await? else {
            return Ok(None);
        };
        room.players.push(player.into());
        self.update_room(room).await
    }

    async fn delete_room(&self, room_id: &str) -> StoreResult<bool> {
        let response = self
            .request(reqwest::Method::DELETE)
            .query(&[("id", format!("eq.{}", room_id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| backend_error("deleteRoom", e))?;

        let rows: Vec<IdColumn> = Self::check("deleteRoom", response)
            .await?
            .json()
            .await
            .map_err(|e| backend_error("deleteRoom", e))?;
        Ok(!rows.is_empty())
    }

    async fn cleanup_inactive(&self, cutoff: Millis) -> StoreResult<usize> {
        let response = self
            .request(reqwest::Method::DELETE)
            .query(&[
                ("updated_at", format!("lt.{}", iso_timestamp(cutoff))),
                ("select", "id".to_string()),
            ])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| backend_error("cleanupInactiveRooms", e))?;

        let rows: Vec<IdColumn> = Self::check("cleanupInactiveRooms", response)
            .await?
            .json()
            .await
            .map_err(|e| backend_error("cleanupInactiveRooms", e))?;
        Ok(rows.len())
    }

    fn name(&self) -> &str {
        "supabase"
    }
}
