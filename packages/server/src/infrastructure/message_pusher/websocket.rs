//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ルームごとの購読者（接続 ID → 送信チャンネル）の管理
//! - 特定の接続への送信（snapshot）とルーム全体へのファンアウト（new_item）
//!
//! WebSocket の受付と writer タスクは UI 層（`src/ui/handler/websocket.rs`）が担い、
//! ここでは受け取った `PusherChannel` にメッセージを流すだけです。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomId};

type Subscribers = HashMap<ConnectionId, PusherChannel>;

/// WebSocket を使った MessagePusher 実装
///
/// 購読者がいなくなったルームのエントリは削除する
#[derive(Default)]
pub struct WebSocketMessagePusher {
    rooms: Mutex<HashMap<RoomId, Subscribers>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 購読者を持つルームの数
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn subscribe(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> bool {
        let mut rooms = self.rooms.lock().await;
        let subscribers = rooms.entry(room_id.clone()).or_default();
        if subscribers.contains_key(&connection_id) {
            return false;
        }
        tracing::debug!(room = %room_id, connection = %connection_id, "subscribed");
        subscribers.insert(connection_id, sender);
        true
    }

    async fn unsubscribe(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(subscribers) = rooms.get_mut(room_id) else {
            return false;
        };
        let removed = subscribers.remove(connection_id).is_some();
        if subscribers.is_empty() {
            rooms.remove(room_id);
        }
        if removed {
            tracing::debug!(room = %room_id, connection = %connection_id, "unsubscribed");
        }
        removed
    }

    async fn push_to(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let rooms = self.rooms.lock().await;
        let sender = rooms
            .get(room_id)
            .and_then(|subscribers| subscribers.get(connection_id))
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn publish(&self, room_id: &RoomId, content: &str) -> usize {
        let rooms = self.rooms.lock().await;
        let Some(subscribers) = rooms.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, sender) in subscribers {
            // 一部の送信失敗は許容する（切断処理は接続側のタスクが行う）
            match sender.send(content.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    room = %room_id,
                    connection = %connection_id,
                    "failed to push message: {}",
                    e
                ),
            }
        }
        delivered
    }

    async fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .map_or(0, |subscribers| subscribers.len())
    }
}
