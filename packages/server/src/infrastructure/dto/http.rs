//! HTTP API request / response DTOs for the clipboard relay.

use copimon_shared::log_buffer::LogEntry;
use serde::{Deserialize, Serialize};

use super::websocket::ItemDto;

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// `GET /rooms/{room_id}/history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Newest first
    pub items: Vec<ItemDto>,
}

/// `POST /rooms/{room_id}/clipboard` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostItemRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /rooms/{room_id}/clipboard` success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostItemResponse {
    pub ok: bool,
    pub item: ItemDto,
}

/// Error body for 4xx / 5xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /logs`
#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    /// Oldest first
    pub logs: Vec<LogEntry>,
}
