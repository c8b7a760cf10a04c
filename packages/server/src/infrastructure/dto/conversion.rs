//! Conversion logic between DTOs and domain entities.

use crate::domain::{Item, RoomId};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Item> for dto::ItemDto {
    fn from(model: &Item) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            text: model.text.as_str().to_string(),
            ts: model.created_at.value(),
        }
    }
}

impl From<Item> for dto::ItemDto {
    fn from(model: Item) -> Self {
        Self {
            id: model.id.into_string(),
            text: model.text.into_string(),
            ts: model.created_at.value(),
        }
    }
}

impl dto::ServerEvent {
    /// `snapshot` event for `room_id`, items newest first
    pub fn snapshot(room_id: &RoomId, items: Vec<Item>) -> Self {
        Self::Snapshot {
            room_id: room_id.as_str().to_string(),
            items: items.into_iter().map(dto::ItemDto::from).collect(),
        }
    }

    /// `new_item` event for `room_id`
    pub fn new_item(room_id: &RoomId, item: &Item) -> Self {
        Self::NewItem {
            room_id: room_id.as_str().to_string(),
            item: item.into(),
        }
    }
}
