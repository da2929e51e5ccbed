//! HTTP API endpoints.
//!
//! Rooms are created and joined through `POST /api/rooms`, read through the
//! GET routes (clients poll these) and mutated through `PATCH /api/rooms/{id}`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::abuse::{room_rate_limit_middleware, AbuseConfig};
use crate::auth::{cleanup_auth_middleware, CleanupConfig};
use crate::game::ActionError;
use crate::protocol::*;
use crate::state::{AppState, RoomError, RoomRef};
use crate::types::Millis;

const DEFAULT_CLEANUP_AGE_HOURS: u64 = 1;

/// Errors returned to HTTP clients as `{ "error": msg }`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound => ApiError::NotFound("Room not found".to_string()),
            RoomError::Invalid(msg) => ApiError::BadRequest(msg),
            RoomError::Action(action) => {
                let msg = action.to_string();
                match action {
                    ActionError::NotHost(_) => ApiError::Forbidden(msg),
                    ActionError::PlayerNotFound => ApiError::NotFound(msg),
                    ActionError::WrongPhase { .. } | ActionError::GameInProgress => {
                        ApiError::Conflict(msg)
                    }
                    ActionError::MissingItems(_) => ApiError::Internal(msg),
                    _ => ApiError::BadRequest(msg),
                }
            }
            RoomError::Catalog(e) => {
                tracing::error!("Catalog unavailable: {}", e);
                ApiError::Internal(e.to_string())
            }
            RoomError::Store(e) => {
                tracing::error!("Room store error: {}", e);
                ApiError::Internal(e.to_string())
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

const CREATE_FIELDS: &str = "Player ID and name are required";
const JOIN_FIELDS: &str = "Room code/ID, player ID, and name are required";

/// Create or join a room.
///
/// POST /api/rooms
pub async fn post_rooms(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RoomsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    match request.action.as_str() {
        "create" => {
            let (Some(player_id), Some(player_name)) = (request.player_id, request.player_name)
            else {
                return Err(ApiError::BadRequest(CREATE_FIELDS.to_string()));
            };
            let (room, room_code) = state.create_room(&player_id, &player_name).await?;
            Ok(Json(CreateRoomResponse { room, room_code }).into_response())
        }
        "join" => {
            let room_ref = match (request.room_id, request.room_code) {
                (_, Some(code)) => RoomRef::Code(code),
                (Some(id), None) => RoomRef::Id(id),
                (None, None) => return Err(ApiError::BadRequest(JOIN_FIELDS.to_string())),
            };
            let (Some(player_id), Some(player_name)) = (request.player_id, request.player_name)
            else {
                return Err(ApiError::BadRequest(JOIN_FIELDS.to_string()));
            };
            let room = state.join_room(room_ref, &player_id, &player_name).await?;
            Ok(Json(RoomResponse { room }).into_response())
        }
        _ => Err(ApiError::BadRequest("Invalid action".to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    room_id: Option<String>,
}

/// Fetch a room by query parameter.
///
/// GET /api/rooms?roomId=...
pub async fn get_room_by_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> ApiResult<Json<RoomResponse>> {
    let room_id = query
        .room_id
        .ok_or_else(|| ApiError::BadRequest("Room ID is required".to_string()))?;
    let room = state.get_room(&room_id).await?;
    Ok(Json(RoomResponse { room }))
}

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    since: Option<Millis>,
}

/// Fetch a room, answering 304 if it has not changed since `since`.
///
/// GET /api/rooms/{room_id}?since=<ms>
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<SinceQuery>,
) -> ApiResult<Response> {
    match state.get_room_since(&room_id, query.since).await? {
        Some(room) => Ok(Json(RoomResponse { room }).into_response()),
        None => Ok(StatusCode::NOT_MODIFIED.into_response()),
    }
}

/// Apply a named action to a room.
///
/// PATCH /api/rooms/{room_id}
pub async fn patch_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<RoomResponse>> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if body.get("action").is_none() || body.get("playerId").is_none() {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }
    let action: RoomAction = serde_json::from_value(body).map_err(|e| {
        tracing::debug!("Rejected action body: {}", e);
        ApiError::BadRequest(format!("Invalid action: {}", e))
    })?;

    let room = state.apply_action(&room_id, action).await?;
    Ok(Json(RoomResponse { room }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    max_age_hours: Option<u64>,
}

/// Delete inactive rooms.
///
/// POST|GET /api/rooms/cleanup?maxAgeHours=N
pub async fn cleanup_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CleanupQuery>,
) -> ApiResult<Json<CleanupResponse>> {
    let max_age_hours = query.max_age_hours.unwrap_or(DEFAULT_CLEANUP_AGE_HOURS);
    let deleted_count = state.cleanup_inactive(max_age_hours).await?;

    Ok(Json(CleanupResponse {
        success: true,
        deleted_count,
        max_age_hours,
        message: format!(
            "Cleaned up {} inactive room(s) older than {} hour(s)",
            deleted_count, max_age_hours
        ),
    }))
}

/// Dota 2 hero list, shaped like the upstream datafeed.
///
/// GET /api/heroes
pub async fn list_heroes(State(state): State<Arc<AppState>>) -> ApiResult<Json<HeroesResponse>> {
    let heroes = state.catalogs.heroes().await.map_err(|e| {
        tracing::error!("Error fetching heroes: {}", e);
        ApiError::Internal(format!("Failed to fetch heroes: {}", e))
    })?;
    Ok(Json(HeroesResponse::new(heroes)))
}

/// Clash Royale card list.
///
/// GET /api/clash-royale/cards
pub async fn list_cards(State(state): State<Arc<AppState>>) -> ApiResult<Json<CardsResponse>> {
    let items = state.catalogs.cards().await.map_err(|e| {
        tracing::error!("Error fetching Clash Royale cards: {}", e);
        ApiError::Internal(e.to_string())
    })?;
    Ok(Json(CardsResponse { items }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        store: state.store.name().to_string(),
    })
}

/// Build the API router
pub fn router(
    state: Arc<AppState>,
    abuse: Arc<AbuseConfig>,
    cleanup: Arc<CleanupConfig>,
) -> Router {
    let cleanup_routes = Router::new()
        .route("/api/rooms/cleanup", get(cleanup_rooms).post(cleanup_rooms))
        .layer(middleware::from_fn_with_state(cleanup, cleanup_auth_middleware));

    let room_routes = Router::new()
        .route("/api/rooms/{room_id}", get(get_room).patch(patch_room))
        .layer(middleware::from_fn_with_state(abuse, room_rate_limit_middleware));

    Router::new()
        .route("/api/rooms", post(post_rooms).get(get_room_by_query))
        .route("/api/heroes", get(list_heroes))
        .route("/api/clash-royale/cards", get(list_cards))
        .route("/api/health", get(health))
        .merge(cleanup_routes)
        .merge(room_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::store::StoreError;

    #[test]
    fn test_action_error_statuses() {
        let cases = [
            (ActionError::NotHost("reset the game"), StatusCode::FORBIDDEN),
            (ActionError::PlayerNotFound, StatusCode::NOT_FOUND),
            (ActionError::GameInProgress, StatusCode::CONFLICT),
            (
                ActionError::WrongPhase {
                    action: "vote",
                    phase: "lobby",
                },
                StatusCode::CONFLICT,
            ),
            (ActionError::SelfVote, StatusCode::BAD_REQUEST),
            (ActionError::RoomFull(10), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(RoomError::Action(err)).status(), status);
        }
    }

    #[test]
    fn test_room_error_statuses() {
        assert_eq!(ApiError::from(RoomError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(RoomError::Invalid("Invalid room ID format".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RoomError::Store(StoreError::Backend("down".to_string()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(RoomError::Catalog(CatalogError::Empty("No heroes available".to_string())))
                .to_string(),
            "No heroes available"
        );
    }
}
