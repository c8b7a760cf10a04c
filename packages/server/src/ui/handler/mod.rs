//! Request handlers.

mod http;
mod websocket;

pub use http::{get_history, get_logs, health_check, post_clipboard};
pub use websocket::websocket_handler;
