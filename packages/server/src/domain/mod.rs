//! Domain layer for the clipboard relay.
//!
//! This module contains business rules that are independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{HISTORY_CAPACITY, History, Item};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use factory::{ConnectionIdFactory, ItemIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::ItemRepository;
pub use value_object::{ConnectionId, DEFAULT_ROOM_ID, ItemId, ItemText, RoomId, Timestamp};
