//! UseCase: ルーム購読解除処理

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId};

/// ルーム購読解除のユースケース
pub struct UnsubscribeRoomUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl UnsubscribeRoomUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 購読を解除する。未登録・解除済みの接続でもエラーにしない
    pub async fn execute(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let removed = self
            .message_pusher
            .unsubscribe(room_id, connection_id)
            .await;
        if removed {
            let remaining = self.message_pusher.subscriber_count(room_id).await;
            tracing::info!(room = %room_id, connection = %connection_id, remaining, "connection left room");
        }
        removed
    }
}
