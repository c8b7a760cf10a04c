//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化ストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Item, ItemText, RepositoryError, RoomId, Timestamp};

/// Item Repository trait（ルームごとの追記専用ログ）
///
/// ## 契約
///
/// - `append` は永続化が完了してから `Ok` を返す。失敗は `RepositoryError::Storage` として必ず呼び出し元に返す
/// - 同じルームへの書き込みは直列化され、`append` の直後の `recent` には追加したアイテムが含まれる
/// - 各ルームの履歴は `HISTORY_CAPACITY` 件を上限とし、古いものから破棄される
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// 新しいアイテムを生成して永続化し、保存されたアイテムを返す
    async fn append(
        &self,
        room_id: &RoomId,
        text: ItemText,
        created_at: Timestamp,
    ) -> Result<Item, RepositoryError>;

    /// 新しい順に最大 `limit` 件を返す（履歴がないルームは空）
    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<Item>, RepositoryError>;
}
