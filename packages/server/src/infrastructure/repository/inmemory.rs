//! InMemory Item Repository 実装
//!
//! プロセスが終了すると履歴は失われます（テスト用）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    History, Item, ItemIdFactory, ItemRepository, ItemText, RepositoryError, RoomId, Timestamp,
};

/// ルームごとの `History` を HashMap で保持する Repository
#[derive(Default)]
pub struct InMemoryItemRepository {
    rooms: Mutex<HashMap<RoomId, History>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn append(
        &self,
        room_id: &RoomId,
        text: ItemText,
        created_at: Timestamp,
    ) -> Result<Item, RepositoryError> {
        let item = Item::new(ItemIdFactory::generate(created_at), text, created_at);
        let mut rooms = self.rooms.lock().await;
        let history = rooms.entry(room_id.clone()).or_default();
        if let Some(evicted) = history.push_newest(item.clone()) {
            tracing::trace!(room = %room_id, item = %evicted.id, "item evicted");
        }
        Ok(item)
    }

    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .get(room_id)
            .map(|history| history.recent(limit))
            .unwrap_or_default())
    }
}
