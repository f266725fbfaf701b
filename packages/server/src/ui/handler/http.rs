//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{ErrorCode, ErrorNotice, MessageId, RoomName, UserId},
    infrastructure::dto::{
        http::{
            ErrorResponseDto, HistoryPageDto, HistoryQuery, PresenceDto, RoomDetailDto,
            RoomSummaryDto,
        },
        websocket::MessageDto,
    },
    ui::state::AppState,
    usecase::{GetRoomDetailError, HistoryQueryError},
};

type ApiError = (StatusCode, Json<ErrorResponseDto>);

fn api_error(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> ApiError {
    let notice = ErrorNotice::new(code, message, None);
    (status, Json(ErrorResponseDto::from(&notice)))
}

fn parse_room(room: String) -> Result<RoomName, ApiError> {
    RoomName::new(room)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let room_name = parse_room(room)?;
    match state.get_room_detail_usecase.execute(&room_name).await {
        Ok(snapshot) => Ok(Json(RoomDetailDto::from(&snapshot))),
        Err(e @ GetRoomDetailError::RoomNotFound(_)) => Err(api_error(
            StatusCode::NOT_FOUND,
            ErrorCode::BadRequest,
            e.to_string(),
        )),
    }
}

/// Get a page of a room's history, newest first
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPageDto>, ApiError> {
    let room_name = parse_room(room)?;
    let before = query.before_id.map(MessageId::new);

    match state
        .get_history_usecase
        .execute(&room_name, before, query.limit)
        .await
    {
        Ok(messages) => {
            let next_before_id = messages.last().map(|message| message.id.value());
            Ok(Json(HistoryPageDto {
                room: room_name.into_string(),
                messages: messages.iter().map(MessageDto::from).collect(),
                next_before_id,
            }))
        }
        Err(e @ HistoryQueryError::InvalidLimit { .. }) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.code(), e.to_string()))
        }
        Err(e @ HistoryQueryError::StorageUnavailable(_)) => {
            tracing::warn!("History query for '{}' failed: {}", room_name, e);
            Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                e.code(),
                e.to_string(),
            ))
        }
    }
}

/// Get presence of a user
pub async fn get_user_presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceDto>, ApiError> {
    let user_id = UserId::new(user_id)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, e.to_string()))?;
    let presence = state.get_presence_usecase.execute(&user_id).await;
    Ok(Json(PresenceDto::from(&presence)))
}
