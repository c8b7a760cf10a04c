//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    domain::{RoomId, ValueObjectError},
    infrastructure::dto::{
        http::{
            ErrorResponse, HealthResponse, HistoryResponse, LogsResponse, PostItemRequest,
            PostItemResponse,
        },
        websocket::ItemDto,
    },
    ui::state::AppState,
    usecase::{GetHistoryError, PostItemError},
};

/// Error returned to HTTP callers as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(e: ValueObjectError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<PostItemError> for ApiError {
    fn from(e: PostItemError) -> Self {
        match e {
            PostItemError::Validation(e) => e.into(),
            PostItemError::Storage(e) => {
                tracing::warn!("Failed to persist item: {}", e);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        }
    }
}

impl From<GetHistoryError> for ApiError {
    fn from(e: GetHistoryError) -> Self {
        match e {
            GetHistoryError::Storage(e) => {
                tracing::warn!("Failed to read history: {}", e);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        }
    }
}

/// Query parameters for `GET /rooms/{room_id}/history`
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Recent items of a room, newest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let room_id = RoomId::try_from(room_id)?;
    let items = state
        .get_history_usecase
        .execute(&room_id, query.limit)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(HistoryResponse {
        items: items.into_iter().map(ItemDto::from).collect(),
    }))
}

/// Create an item from an HTTP producer
///
/// Responds `201 {ok, item}` once the item is durable and broadcast.
pub async fn post_clipboard(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    payload: Result<Json<PostItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostItemResponse>), ApiError> {
    let room_id = RoomId::try_from(room_id)?;
    let text = match payload {
        Ok(Json(PostItemRequest { text: Some(text) })) => text,
        Ok(Json(PostItemRequest { text: None })) => {
            return Err(ValueObjectError::ItemTextEmpty.into());
        }
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                rejection.body_text(),
            ));
        }
        Err(rejection) => {
            tracing::debug!("Rejected clipboard body: {}", rejection.body_text());
            return Err(ValueObjectError::ItemTextEmpty.into());
        }
    };

    let item = state.post_item_usecase.execute(room_id, text).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostItemResponse {
            ok: true,
            item: item.into(),
        }),
    ))
}

/// Recent server log lines, oldest first
pub async fn get_logs(State(state): State<Arc<AppState>>) -> Json<LogsResponse> {
    Json(LogsResponse {
        logs: state.log_buffer.entries(),
    })
}
