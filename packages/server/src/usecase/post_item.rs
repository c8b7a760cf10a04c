//! UseCase: アイテム投稿処理
//!
//! HTTP `POST /rooms/{room_id}/clipboard` と WebSocket の `new_item` の
//! どちらもこのユースケースに集約される。
//!
//! 1. テキストを検証する（空文字・サイズ超過は `Validation`）
//! 2. ルームのターンを取得する
//! 3. Repository に永続化する（失敗したら `Storage` を返し、何も配信しない）
//! 4. ルームの全購読者に `new_item` を配信する

use std::sync::Arc;

use copimon_shared::time::SharedClock;

use crate::{
    domain::{Item, ItemRepository, ItemText, MessagePusher, RoomId, Timestamp},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{error::PostItemError, room_turn::RoomTurns};

/// アイテム投稿のユースケース
pub struct PostItemUseCase {
    /// Repository（永続化ストアの抽象化）
    repository: Arc<dyn ItemRepository>,
    /// MessagePusher（ルームレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    room_turns: Arc<RoomTurns>,
    clock: SharedClock,
}

impl PostItemUseCase {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        room_turns: Arc<RoomTurns>,
        clock: SharedClock,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            room_turns,
            clock,
        }
    }

    /// アイテム投稿を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Item)` - 永続化されたアイテム（配信は完了している）
    /// * `Err(PostItemError)` - 検証エラーまたは永続化エラー
    pub async fn execute(&self, room_id: RoomId, text: String) -> Result<Item, PostItemError> {
        let text = ItemText::new(text)?;

        let _turn = self.room_turns.acquire(&room_id).await;
        let created_at = Timestamp::new(self.clock.now_millis());
        let item = self.repository.append(&room_id, text, created_at).await?;

        match ServerEvent::new_item(&room_id, &item).encode() {
            Ok(json) => {
                let delivered = self.message_pusher.publish(&room_id, &json).await;
                tracing::info!(
                    room = %room_id,
                    item = %item.id,
                    delivered,
                    "item accepted"
                );
            }
            Err(e) => {
                tracing::warn!(room = %room_id, item = %item.id, "failed to encode new_item: {}", e);
            }
        }

        Ok(item)
    }
}
