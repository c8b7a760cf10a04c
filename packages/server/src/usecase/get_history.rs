//! UseCase: 履歴取得処理

use std::sync::Arc;

use crate::domain::{HISTORY_CAPACITY, Item, ItemRepository, RoomId};

use super::error::GetHistoryError;

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    repository: Arc<dyn ItemRepository>,
}

impl GetHistoryUseCase {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }

    /// 新しい順に最大 `limit` 件（`HISTORY_CAPACITY` が上限）を返す
    pub async fn execute(
        &self,
        room_id: &RoomId,
        limit: Option<usize>,
    ) -> Result<Vec<Item>, GetHistoryError> {
        let limit = limit.unwrap_or(HISTORY_CAPACITY).min(HISTORY_CAPACITY);
        Ok(self.repository.recent(room_id, limit).await?)
    }
}
