//! UseCase 層
//!
//! HTTP / WebSocket の入口から呼ばれるアプリケーションロジック。
//! 同じルームへの操作は `RoomTurns` で直列化される。

pub mod error;
pub mod get_history;
pub mod post_item;
pub mod room_turn;
pub mod subscribe_room;
pub mod unsubscribe_room;

pub use error::{GetHistoryError, PostItemError, SubscribeError};
pub use get_history::GetHistoryUseCase;
pub use post_item::PostItemUseCase;
pub use room_turn::RoomTurns;
pub use subscribe_room::SubscribeRoomUseCase;
pub use unsubscribe_room::UnsubscribeRoomUseCase;
