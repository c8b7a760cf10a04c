//! UseCase: ルーム購読処理
//!
//! 新しい接続をルームに登録し、その接続だけに最新履歴の snapshot を送る。
//! 登録と snapshot はルームのターン内で行うため、並行して投稿された
//! アイテムは snapshot か new_item のどちらか一方でだけ届く。

use std::sync::Arc;

use crate::{
    domain::{
        ConnectionId, HISTORY_CAPACITY, ItemRepository, MessagePusher, PusherChannel, RoomId,
    },
    infrastructure::dto::websocket::ServerEvent,
};

use super::{error::SubscribeError, room_turn::RoomTurns};

/// ルーム購読のユースケース
pub struct SubscribeRoomUseCase {
    repository: Arc<dyn ItemRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    room_turns: Arc<RoomTurns>,
}

impl SubscribeRoomUseCase {
    pub fn new(
        repository: Arc<dyn ItemRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        room_turns: Arc<RoomTurns>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            room_turns,
        }
    }

    /// 接続を購読者として登録し、snapshot を送る
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新規に登録し snapshot を送った
    /// * `Ok(false)` - 登録済みの接続だった（snapshot は送らない）
    /// * `Err(SubscribeError)` - snapshot を送れなかった（登録は取り消される）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<bool, SubscribeError> {
        let _turn = self.room_turns.acquire(room_id).await;

        if !self
            .message_pusher
            .subscribe(room_id, connection_id.clone(), sender)
            .await
        {
            return Ok(false);
        }

        if let Err(e) = self.send_snapshot(room_id, &connection_id).await {
            self.message_pusher
                .unsubscribe(room_id, &connection_id)
                .await;
            return Err(e);
        }
        Ok(true)
    }

    async fn send_snapshot(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<(), SubscribeError> {
        let items = self.repository.recent(room_id, HISTORY_CAPACITY).await?;
        let count = items.len();
        let json = ServerEvent::snapshot(room_id, items).encode()?;
        self.message_pusher
            .push_to(room_id, connection_id, &json)
            .await?;
        tracing::debug!(room = %room_id, connection = %connection_id, count, "snapshot sent");
        Ok(())
    }
}
