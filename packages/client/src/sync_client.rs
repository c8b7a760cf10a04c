//! Sync client handle.
//!
//! [`SyncClient`] is a cheap handle to the sync actor running on the tokio
//! runtime. It keeps the local view of one room up to date (connection state,
//! recent items) and delivers outbound items exactly once, over the stream when
//! connected and over the REST fallback otherwise.

use std::sync::Arc;

use copimon_server::{domain::ItemText, infrastructure::dto::websocket::ItemDto};
use copimon_shared::log_buffer::{LogBuffer, LogEntry};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    config::ClientConfig,
    domain::ConnectionStatus,
    error::ClientError,
    machine::{Command, Event, MachineParts, SyncMachine},
    transport::{Connector, HttpItemPoster, ItemPoster, WebSocketConnector},
};

const NOTICE_CAPACITY: usize = 256;

/// How a submitted item left the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Handed to the open stream connection
    Sent,
    /// Queued; delivered later over the stream or the REST fallback
    Queued,
}

/// Changes of the local view, for UIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// The cache was replaced by a server snapshot (newest first)
    Snapshot(Vec<ItemDto>),
    /// A new item was added to the cache
    NewItem(ItemDto),
    Status(ConnectionStatus),
    /// The send queue became empty
    QueueDrained,
}

/// Handle to a running sync client
pub struct SyncClient {
    events: mpsc::UnboundedSender<Event>,
    notices: broadcast::Sender<SyncNotice>,
    logs: LogBuffer,
    config: ClientConfig,
}

impl SyncClient {
    /// Start a client over WebSocket + HTTP and begin connecting
    pub fn start(config: ClientConfig) -> Result<Self, ClientError> {
        let poster = HttpItemPoster::new(&config)?;
        let client = Self::with_transports(config, Arc::new(WebSocketConnector), Arc::new(poster))?;
        client.connect()?;
        Ok(client)
    }

    /// Start a client over the given transports without connecting
    ///
    /// Must be called within a tokio runtime.
    pub fn with_transports(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        poster: Arc<dyn ItemPoster>,
    ) -> Result<Self, ClientError> {
        let ws_url = config.ws_url()?;
        let (events, events_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let logs = LogBuffer::new(config.log_capacity);

        let machine = SyncMachine::new(MachineParts {
            ws_url,
            reconnect_delay: config.reconnect_delay,
            connect_timeout: config.connect_timeout,
            cache_capacity: config.cache_capacity,
            connector,
            poster,
            events: events.downgrade(),
            notices: notices.clone(),
            logs: logs.clone(),
        });
        tokio::spawn(machine.run(events_rx));

        Ok(Self {
            events,
            notices,
            logs,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a new connection, replacing the current one if any
    pub fn connect(&self) -> Result<(), ClientError> {
        self.send(Command::Connect)
    }

    /// Reconnect now instead of waiting for the reconnect timer
    pub fn request_reconnect(&self) -> Result<(), ClientError> {
        self.send(Command::Connect)
    }

    /// Submit one item
    ///
    /// # Errors
    ///
    /// `Validation` for empty or oversized text, `Closed` after shutdown.
    /// Delivery failures are not errors: the item stays queued.
    pub async fn submit(&self, text: impl Into<String>) -> Result<SubmitOutcome, ClientError> {
        let text = ItemText::new(text.into())
            .map_err(|e| ClientError::Validation(e.to_string()))?
            .into_string();
        self.ask(|reply| Command::Submit { text, reply }).await
    }

    /// Try to deliver queued items now
    pub fn flush(&self) -> Result<(), ClientError> {
        self.send(Command::Flush)
    }

    /// Cached items, newest first
    pub async fn cached_items(&self) -> Result<Vec<ItemDto>, ClientError> {
        self.ask(Command::Items).await
    }

    pub async fn connection_status(&self) -> Result<ConnectionStatus, ClientError> {
        self.ask(Command::Status).await
    }

    /// Number of items waiting for delivery
    pub async fn pending_count(&self) -> Result<usize, ClientError> {
        self.ask(Command::Pending).await
    }

    /// Client lifecycle log, oldest first
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.entries()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.notices.subscribe()
    }

    /// Stop the actor: close the connection and cancel timers and deliveries
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.ask(Command::Shutdown).await
    }

    fn send(&self, command: Command) -> Result<(), ClientError> {
        self.events
            .send(Event::Command(command))
            .map_err(|_| ClientError::Closed)
    }

    async fn ask<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ClientError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| ClientError::Closed)
    }
}
