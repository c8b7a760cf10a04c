//! UseCase layer error definitions.

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError, ValueObjectError};
use crate::infrastructure::dto::websocket::ProtocolError;

/// Errors returned by [`super::PostItemUseCase`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostItemError {
    /// Rejected before reaching the store
    #[error(transparent)]
    Validation(#[from] ValueObjectError),

    /// The durable write failed. Nothing was broadcast.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Errors returned by [`super::SubscribeRoomUseCase`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// History could not be read for the snapshot
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    /// The snapshot could not be encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The snapshot could not be handed to the connection
    #[error(transparent)]
    Push(#[from] MessagePushError),
}

/// Errors returned by [`super::GetHistoryUseCase`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetHistoryError {
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
