//! Infrastructure layer: wire DTOs, persistence and WebSocket fan-out.

pub mod dto;
pub mod message_pusher;
pub mod repository;
