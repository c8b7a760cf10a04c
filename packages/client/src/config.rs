//! Sync client configuration.

use std::time::Duration;

use copimon_server::domain::{DEFAULT_ROOM_ID, HISTORY_CAPACITY};
use copimon_shared::log_buffer::DEFAULT_LOG_CAPACITY;
use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how a [`crate::SyncClient`] connects.
///
/// Changing the server or room means starting a new client with a new config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base URL of the relay (`http://host:port`)
    pub server_url: String,
    pub room_id: String,
    /// Fixed delay before reconnecting after a close or error
    pub reconnect_delay: Duration,
    /// Number of items kept in the local cache
    pub cache_capacity: usize,
    /// Timeout of one REST fallback request
    pub request_timeout: Duration,
    /// Deadline for one stream handshake; expiry counts as a failed attempt
    pub connect_timeout: Duration,
    /// Number of lifecycle log entries kept by the client
    pub log_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            room_id: DEFAULT_ROOM_ID.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            cache_capacity: HISTORY_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            room_id: room_id.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// `ws(s)://host:port/ws?roomId=<room>`
    pub fn ws_url(&self) -> Result<String, ClientError> {
        let mut url = self.base_url()?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            _ => return Err(self.invalid_url()),
        };
        url.set_scheme(scheme).map_err(|_| self.invalid_url())?;
        url.path_segments_mut()
            .map_err(|_| self.invalid_url())?
            .pop_if_empty()
            .push("ws");
        url.query_pairs_mut().append_pair("roomId", &self.room_id);
        Ok(url.to_string())
    }

    /// `http(s)://host:port/rooms/<room>/clipboard`
    pub fn clipboard_url(&self) -> Result<String, ClientError> {
        let mut url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(self.invalid_url());
        }
        url.path_segments_mut()
            .map_err(|_| self.invalid_url())?
            .pop_if_empty()
            .extend(["rooms", self.room_id.as_str(), "clipboard"]);
        Ok(url.to_string())
    }

    fn base_url(&self) -> Result<Url, ClientError> {
        Url::parse(&self.server_url).map_err(|_| self.invalid_url())
    }

    fn invalid_url(&self) -> ClientError {
        ClientError::InvalidUrl(self.server_url.clone())
    }
}
