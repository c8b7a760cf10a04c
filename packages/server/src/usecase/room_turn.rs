//! ルームごとの排他（ターン）
//!
//! 「永続化 → ブロードキャスト」と「購読登録 → snapshot 送信」を同じルームの中で
//! 直列に実行するためのロック。これにより、購読直後の接続が snapshot と
//! new_item の両方で同じアイテムを受け取ったり、取りこぼしたりしない。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, MutexGuard},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

type TurnMap = HashMap<RoomId, Arc<Mutex<()>>>;

/// ルーム ID ごとの非同期 Mutex を遅延生成して保持する
///
/// 誰も待っていないルームのエントリはターンの解放時に削除される。
#[derive(Default)]
pub struct RoomTurns {
    turns: Arc<StdMutex<TurnMap>>,
}

impl RoomTurns {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームのターンを取得する。ガードを drop するまで同じルームの他の操作は待つ
    pub async fn acquire(&self, room_id: &RoomId) -> RoomTurn {
        let turn = {
            let mut turns = lock(&self.turns);
            Arc::clone(turns.entry(room_id.clone()).or_default())
        };
        let guard = Arc::clone(&turn).lock_owned().await;
        RoomTurn {
            guard: Some(guard),
            turn,
            room_id: room_id.clone(),
            turns: Arc::clone(&self.turns),
        }
    }

    /// 保持しているルームの数
    pub fn len(&self) -> usize {
        lock(&self.turns).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.turns).is_empty()
    }
}

/// 取得済みのターン。drop で解放される
pub struct RoomTurn {
    guard: Option<OwnedMutexGuard<()>>,
    turn: Arc<Mutex<()>>,
    room_id: RoomId,
    turns: Arc<StdMutex<TurnMap>>,
}

impl Drop for RoomTurn {
    fn drop(&mut self) {
        self.guard.take();
        let mut turns = lock(&self.turns);
        // マップと自分以外に参照がなければ、待っている操作はない
        let idle = turns
            .get(&self.room_id)
            .is_some_and(|turn| Arc::ptr_eq(turn, &self.turn) && Arc::strong_count(turn) == 2);
        if idle {
            turns.remove(&self.room_id);
        }
    }
}

// マップの操作中にパニックしても整合性は崩れないので poison は無視する
fn lock(turns: &StdMutex<TurnMap>) -> MutexGuard<'_, TurnMap> {
    turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_same_room_is_serialized() {
        // テスト項目: 同じルームのターンは前のガードが drop されるまで取得できない
        // given (前提条件):
        let turns = RoomTurns::new();
        let guard = turns.acquire(&room("a")).await;

        // when (操作):
        let second = tokio::time::timeout(Duration::from_millis(50), turns.acquire(&room("a"))).await;

        // then (期待する結果):
        assert!(second.is_err());
        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), turns.acquire(&room("a"))).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_rooms_are_independent() {
        // テスト項目: 異なるルームのターンは互いにブロックしない
        // given (前提条件):
        let turns = RoomTurns::new();
        let _guard = turns.acquire(&room("a")).await;

        // when (操作):
        let other = tokio::time::timeout(Duration::from_millis(50), turns.acquire(&room("b"))).await;

        // then (期待する結果):
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_idle_room_is_pruned_on_release() {
        // テスト項目: 解放後に誰も待っていないルームのエントリは削除される
        // given (前提条件):
        let turns = RoomTurns::new();
        let guard = turns.acquire(&room("a")).await;
        assert_eq!(turns.len(), 1);

        // when (操作):
        drop(guard);

        // then (期待する結果):
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn test_room_with_waiter_is_kept_until_last_release() {
        // テスト項目: 待っている操作があるルームは、最後のターンが解放されるまで残る
        // given (前提条件):
        let turns = Arc::new(RoomTurns::new());
        let first = turns.acquire(&room("a")).await;
        let waiter = {
            let turns = Arc::clone(&turns);
            tokio::spawn(async move {
                let _turn = turns.acquire(&room("a")).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // when (操作):
        drop(first);

        // then (期待する結果):
        assert_eq!(turns.len(), 1);
        waiter.await.unwrap();
        assert!(turns.is_empty());
    }
}
