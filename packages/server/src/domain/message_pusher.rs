//! MessagePusher trait 定義（ルームレジストリとブロードキャスト）
//!
//! 接続ハンドルの登録・解除を行えるのはこの trait の実装だけです。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomId};

/// 接続ごとの送信チャンネル（WebSocket writer タスクへ JSON 文字列を渡す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ルームごとの購読者管理とファンアウト
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続をルームの購読者として登録する
    ///
    /// 新規登録なら `true`、同じ接続が登録済みなら何もせず `false`
    async fn subscribe(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> bool;

    /// 購読を解除する（未登録・解除済みでもエラーにしない）
    ///
    /// 実際に解除した場合は `true`
    async fn unsubscribe(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// 特定の接続にだけ送信する（snapshot 用）
    async fn push_to(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// ルームの全購読者に送信し、送信できた接続数を返す
    ///
    /// 一部の送信失敗はログに残してスキップする。失敗した接続はここでは削除しない
    async fn publish(&self, room_id: &RoomId, content: &str) -> usize;

    /// ルームの購読者数
    async fn subscriber_count(&self, room_id: &RoomId) -> usize;
}
