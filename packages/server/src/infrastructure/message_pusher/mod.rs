//! ルームレジストリ（`MessagePusher` trait）の実装
//!
//! - `websocket`: WebSocket 接続の送信チャンネルを保持する実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
