//! Shared application state.

use std::sync::Arc;

use copimon_shared::log_buffer::LogBuffer;

use crate::usecase::{
    GetHistoryUseCase, PostItemUseCase, SubscribeRoomUseCase, UnsubscribeRoomUseCase,
};

/// Shared application state
pub struct AppState {
    /// PostItemUseCase（アイテム投稿のユースケース）
    pub post_item_usecase: Arc<PostItemUseCase>,
    /// SubscribeRoomUseCase（ルーム購読のユースケース）
    pub subscribe_room_usecase: Arc<SubscribeRoomUseCase>,
    /// UnsubscribeRoomUseCase（ルーム購読解除のユースケース）
    pub unsubscribe_room_usecase: Arc<UnsubscribeRoomUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    /// `GET /logs` で返すサーバーログ
    pub log_buffer: LogBuffer,
}
