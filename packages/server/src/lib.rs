//! Copimon relay server.
//!
//! Keeps a durable, bounded per-room clipboard history and relays every new
//! item to all WebSocket subscribers of the room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
