//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("RoomId cannot exceed {max} bytes (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// ItemId validation error
    #[error("ItemId cannot be empty")]
    ItemIdEmpty,

    /// Item text validation error
    #[error("text is required")]
    ItemTextEmpty,

    /// Item text too long error
    #[error("text cannot exceed {max} bytes (got {actual})")]
    ItemTextTooLong { max: usize, actual: usize },
}

/// Errors raised by the persistence store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Durable read/write failed. The caller may retry.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised while pushing events to subscribed connections
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagePushError {
    /// The connection is not subscribed to the room
    #[error("connection '{0}' is not subscribed")]
    ConnectionNotFound(String),

    /// The connection's channel is closed
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
