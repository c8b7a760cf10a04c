//! Error types for the sync client.

use copimon_server::infrastructure::dto::websocket::ProtocolError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// WebSocket or HTTP transport failure (drives reconnect / retry)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered the REST fallback with a non-2xx status
    #[error("Server responded with HTTP {0}")]
    Http(u16),

    /// A frame from the server could not be decoded or encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Rejected locally before anything was sent
    #[error("{0}")]
    Validation(String),

    /// The configured server URL cannot be used
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),

    /// The sync client has been shut down
    #[error("Sync client is shut down")]
    Closed,
}

impl ClientError {
    /// Failures worth retrying later: transport errors, 5xx, 408 and 429.
    ///
    /// Anything else will fail the same way on every retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Http(status) => *status >= 500 || matches!(status, 408 | 429),
            _ => false,
        }
    }
}
