//! SQLite を使った ItemRepository 実装
//!
//! 1 つのテーブルに全ルームのアイテムを保持します。`seq` は挿入順の連番で、
//! 同じミリ秒に作られたアイテムでも順序が保たれます。
//!
//! ```text
//! items(seq INTEGER PK AUTOINCREMENT, id TEXT UNIQUE, room_id TEXT, text TEXT, created_at INTEGER)
//! ```
//!
//! `append` はトランザクション内で挿入と上限を超えた古い行の削除を行い、
//! コミット（`synchronous = FULL`）してから返ります。

use std::{
    fmt,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rusqlite::{Connection, params};

use crate::domain::{
    HISTORY_CAPACITY, Item, ItemId, ItemIdFactory, ItemRepository, ItemText, RepositoryError,
    RoomId, Timestamp,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT    NOT NULL UNIQUE,
    room_id    TEXT    NOT NULL,
    text       TEXT    NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_items_room_seq ON items (room_id, seq DESC);
";

fn storage_error(err: impl fmt::Display) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

/// SQLite ファイルに履歴を永続化する Repository
#[derive(Clone)]
pub struct SqliteItemRepository {
    connection: Arc<Mutex<Connection>>,
    capacity: usize,
}

impl SqliteItemRepository {
    /// データベースファイルを開き（なければ作成し）、スキーマを用意する
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let connection = Connection::open(path.as_ref()).map_err(storage_error)?;
        connection
            .execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(storage_error)?;
        Self::initialize(connection)
    }

    /// プロセス内だけで完結するデータベース（テスト用）
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let connection = Connection::open_in_memory().map_err(storage_error)?;
        Self::initialize(connection)
    }

    /// ルームあたりの保持件数を変更する（最小 1）
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn initialize(connection: Connection) -> Result<Self, RepositoryError> {
        connection
            .execute_batch("PRAGMA synchronous = FULL;")
            .map_err(storage_error)?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(storage_error)?;
        connection.execute_batch(SCHEMA).map_err(storage_error)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            capacity: HISTORY_CAPACITY,
        })
    }

    /// ブロッキングな SQLite 操作を blocking スレッドで実行する
    async fn with_connection<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut guard = connection
                .lock()
                .map_err(|_| RepositoryError::Storage("connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(storage_error)?
    }
}

fn row_to_item(id: String, text: String, created_at: i64) -> Result<Item, RepositoryError> {
    let id = ItemId::new(id).map_err(storage_error)?;
    let text = ItemText::new(text).map_err(storage_error)?;
    Ok(Item::new(id, text, Timestamp::new(created_at)))
}

#[async_trait]
impl ItemRepository for SqliteItemRepository {
    async fn append(
        &self,
        room_id: &RoomId,
        text: ItemText,
        created_at: Timestamp,
    ) -> Result<Item, RepositoryError> {
        let item = Item::new(ItemIdFactory::generate(created_at), text, created_at);
        let room = room_id.as_str().to_string();
        let capacity = self.capacity as i64;
        let stored = item.clone();

        self.with_connection(move |connection| {
            let tx = connection.transaction().map_err(storage_error)?;
            tx.execute(
                "INSERT INTO items (id, room_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    stored.id.as_str(),
                    room,
                    stored.text.as_str(),
                    stored.created_at.value()
                ],
            )
            .map_err(storage_error)?;
            tx.execute(
                "DELETE FROM items WHERE room_id = ?1 AND seq NOT IN (
                    SELECT seq FROM items WHERE room_id = ?1 ORDER BY seq DESC LIMIT ?2
                )",
                params![room, capacity],
            )
            .map_err(storage_error)?;
            tx.commit().map_err(storage_error)
        })
        .await?;

        tracing::debug!(room = %room_id, item = %item.id, "item persisted");
        Ok(item)
    }

    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<Item>, RepositoryError> {
        let room = room_id.as_str().to_string();
        let limit = limit.min(self.capacity) as i64;

        self.with_connection(move |connection| {
            let mut stmt = connection
                .prepare_cached(
                    "SELECT id, text, created_at FROM items
                     WHERE room_id = ?1 ORDER BY seq DESC LIMIT ?2",
                )
                .map_err(storage_error)?;
            let rows = stmt
                .query_map(params![room, limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(storage_error)?;

            let mut items = Vec::new();
            for row in rows {
                let (id, text, created_at) = row.map_err(storage_error)?;
                items.push(row_to_item(id, text, created_at)?);
            }
            Ok(items)
        })
        .await
    }
}
