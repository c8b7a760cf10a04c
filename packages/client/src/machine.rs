//! The sync actor.
//!
//! A single task owns the connection state, the item cache and the send queue.
//! Everything that can change them arrives as an [`Event`] on one channel:
//! commands from [`crate::SyncClient`], connection lifecycle and frames,
//! reconnect timer expiry and REST drain progress.
//!
//! Every connection attempt gets a generation number and every reconnect timer
//! a token; events carrying an outdated generation or token are ignored.

use std::{sync::Arc, time::Duration};

use copimon_server::infrastructure::dto::websocket::{
    ClientMessage, ItemDto, ServerEvent, decode_server_event,
};
use copimon_shared::log_buffer::LogBuffer;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    domain::{ConnectionState, ConnectionStatus, ItemCache, SendQueue},
    error::ClientError,
    sync_client::{SubmitOutcome, SyncNotice},
    transport::{Connection, Connector, FrameSink, Inbound, ItemPoster},
};

/// Requests from the [`crate::SyncClient`] handle
pub(crate) enum Command {
    Connect,
    Submit {
        text: String,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    Flush,
    Items(oneshot::Sender<Vec<ItemDto>>),
    Status(oneshot::Sender<ConnectionStatus>),
    Pending(oneshot::Sender<usize>),
    Shutdown(oneshot::Sender<()>),
}

pub(crate) enum Event {
    Command(Command),
    Opened {
        generation: u64,
        sink: Arc<dyn FrameSink>,
    },
    Frame {
        generation: u64,
        text: String,
    },
    Closed {
        generation: u64,
        error: Option<String>,
    },
    ReconnectDue {
        token: u64,
    },
    Delivered {
        entry_id: u64,
    },
    /// The server refused the entry for good; retrying cannot help
    Rejected {
        entry_id: u64,
        error: ClientError,
    },
    DrainHalted {
        error: ClientError,
    },
    DrainFinished,
}

type EventSender = mpsc::WeakUnboundedSender<Event>;

/// Deliver an event to the actor if it is still running
fn emit(events: &EventSender, event: Event) -> bool {
    match events.upgrade() {
        Some(tx) => tx.send(event).is_ok(),
        None => false,
    }
}

fn encode_new_item(text: &str) -> Result<String, ClientError> {
    Ok(ClientMessage::NewItem {
        text: text.to_string(),
    }
    .encode()?)
}

pub(crate) struct MachineParts {
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub cache_capacity: usize,
    pub connector: Arc<dyn Connector>,
    pub poster: Arc<dyn ItemPoster>,
    pub events: EventSender,
    pub notices: broadcast::Sender<SyncNotice>,
    pub logs: LogBuffer,
}

pub(crate) struct SyncMachine {
    ws_url: String,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    connector: Arc<dyn Connector>,
    poster: Arc<dyn ItemPoster>,
    events: EventSender,
    notices: broadcast::Sender<SyncNotice>,
    logs: LogBuffer,

    state: ConnectionState,
    last_error: Option<String>,
    generation: u64,
    sink: Option<Arc<dyn FrameSink>>,
    connection_task: Option<JoinHandle<()>>,
    reconnect_timer: Option<(u64, JoinHandle<()>)>,
    next_timer_token: u64,

    cache: ItemCache,
    queue: SendQueue,
    drain_task: Option<JoinHandle<()>>,
    drain_pending: bool,
}

impl SyncMachine {
    pub(crate) fn new(parts: MachineParts) -> Self {
        Self {
            ws_url: parts.ws_url,
            reconnect_delay: parts.reconnect_delay,
            connect_timeout: parts.connect_timeout,
            connector: parts.connector,
            poster: parts.poster,
            events: parts.events,
            notices: parts.notices,
            logs: parts.logs,
            state: ConnectionState::Disconnected,
            last_error: None,
            generation: 0,
            sink: None,
            connection_task: None,
            reconnect_timer: None,
            next_timer_token: 0,
            cache: ItemCache::new(parts.cache_capacity),
            queue: SendQueue::new(),
            drain_task: None,
            drain_pending: false,
        }
    }

    /// Process events until shutdown or until every handle is dropped
    pub(crate) async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                return;
            }
        }
        self.teardown();
    }

    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Command(command) => return self.handle_command(command),
            Event::Opened { generation, sink } => self.on_opened(generation, sink),
            Event::Frame { generation, text } => self.on_frame(generation, &text),
            Event::Closed { generation, error } => self.on_closed(generation, error),
            Event::ReconnectDue { token } => self.on_reconnect_due(token),
            Event::Delivered { entry_id } => {
                if self.queue.remove(entry_id) {
                    tracing::debug!(entry = entry_id, "queued item delivered over REST");
                }
            }
            Event::Rejected { entry_id, error } => {
                if self.queue.remove(entry_id) {
                    tracing::warn!(entry = entry_id, "Queued item rejected by server: {}", error);
                    self.log("WARN", format!("dropped queued item: {}", error));
                }
            }
            Event::DrainHalted { error } => {
                self.drain_task = None;
                tracing::warn!(pending = self.queue.len(), "REST delivery failed: {}", error);
                self.log("WARN", format!("fallback delivery failed: {}", error));
                self.after_drain();
            }
            Event::DrainFinished => {
                self.drain_task = None;
                if self.queue.is_empty() {
                    self.log("INFO", "send queue drained over REST");
                    self.notify(SyncNotice::QueueDrained);
                }
                self.after_drain();
            }
        }
        true
    }

    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect => self.start_connection(),
            Command::Submit { text, reply } => {
                let outcome = self.submit(text);
                let _ = reply.send(outcome);
            }
            Command::Flush => self.request_drain(),
            Command::Items(reply) => {
                let _ = reply.send(self.cache.items());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Pending(reply) => {
                let _ = reply.send(self.queue.len());
            }
            Command::Shutdown(reply) => {
                self.teardown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    // ========================================
    // Connection lifecycle
    // ========================================

    /// Replace any current connection with a new attempt
    fn start_connection(&mut self) {
        self.cancel_reconnect();
        self.drop_connection();

        self.generation += 1;
        let generation = self.generation;
        self.set_state(ConnectionState::Connecting);
        tracing::info!(generation, "Connecting to {}", self.ws_url);

        let connector = Arc::clone(&self.connector);
        let url = self.ws_url.clone();
        let connect_timeout = self.connect_timeout;
        let events = self.events.clone();
        self.connection_task = Some(tokio::spawn(async move {
            let handshake = tokio::time::timeout(connect_timeout, connector.connect(&url)).await;
            let Connection { sink, mut inbound } = match handshake {
                Ok(Ok(connection)) => connection,
                Ok(Err(e)) => {
                    emit(
                        &events,
                        Event::Closed {
                            generation,
                            error: Some(e.to_string()),
                        },
                    );
                    return;
                }
                Err(_) => {
                    emit(
                        &events,
                        Event::Closed {
                            generation,
                            error: Some("handshake timed out".to_string()),
                        },
                    );
                    return;
                }
            };
            if !emit(&events, Event::Opened { generation, sink }) {
                return;
            }

            let error = loop {
                match inbound.recv().await {
                    Some(Inbound::Text(text)) => {
                        if !emit(&events, Event::Frame { generation, text }) {
                            return;
                        }
                    }
                    Some(Inbound::Closed(reason)) => break reason,
                    None => break None,
                }
            };
            emit(&events, Event::Closed { generation, error });
        }));
    }

    fn on_opened(&mut self, generation: u64, sink: Arc<dyn FrameSink>) {
        if generation != self.generation {
            tracing::debug!(generation, "ignoring stale connection");
            return;
        }
        self.sink = Some(sink);
        self.last_error = None;
        self.set_state(ConnectionState::Connected);
        tracing::info!(generation, "Connected to {}", self.ws_url);
        self.log("INFO", format!("connected to {}", self.ws_url));
        self.request_drain();
    }

    fn on_frame(&mut self, generation: u64, text: &str) {
        if generation != self.generation || self.state != ConnectionState::Connected {
            return;
        }
        match decode_server_event(text) {
            Ok(ServerEvent::Snapshot { items, .. }) => {
                self.cache.replace(items);
                tracing::debug!(items = self.cache.len(), "snapshot applied");
                self.notify(SyncNotice::Snapshot(self.cache.items()));
                self.request_drain();
            }
            Ok(ServerEvent::NewItem { item, .. }) => {
                if self.cache.prepend(item.clone()) {
                    self.notify(SyncNotice::NewItem(item));
                }
                self.request_drain();
            }
            Err(e) => {
                tracing::warn!("Discarding frame from server: {}", e);
                self.log("WARN", format!("discarded frame: {}", e));
            }
        }
    }

    fn on_closed(&mut self, generation: u64, error: Option<String>) {
        if generation != self.generation {
            return;
        }
        self.connection_task = None;
        self.sink = None;

        let reason = error.unwrap_or_else(|| "connection closed".to_string());
        tracing::warn!(generation, "Connection lost: {}", reason);
        self.log("WARN", format!("disconnected: {}", reason));
        self.last_error = Some(reason);
        self.state = ConnectionState::Disconnected;
        self.notify(SyncNotice::Status(self.status()));

        self.schedule_reconnect();
    }

    /// At most one pending timer; a new one replaces the old one
    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();
        self.next_timer_token += 1;
        let token = self.next_timer_token;
        let delay = self.reconnect_delay;
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            emit(&events, Event::ReconnectDue { token });
        });
        self.reconnect_timer = Some((token, handle));
        self.log(
            "INFO",
            format!("reconnecting in {} ms", delay.as_millis()),
        );
    }

    fn on_reconnect_due(&mut self, token: u64) {
        match &self.reconnect_timer {
            Some((current, _)) if *current == token => {
                self.reconnect_timer = None;
                if self.state == ConnectionState::Disconnected {
                    self.start_connection();
                }
            }
            _ => tracing::debug!(token, "ignoring stale reconnect timer"),
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some((_, handle)) = self.reconnect_timer.take() {
            handle.abort();
        }
    }

    fn drop_connection(&mut self) {
        self.sink = None;
        if let Some(task) = self.connection_task.take() {
            task.abort();
        }
    }

    fn teardown(&mut self) {
        self.cancel_reconnect();
        self.drop_connection();
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
        self.generation += 1;
        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Sync client stopped");
    }

    // ========================================
    // Outbound items
    // ========================================

    fn submit(&mut self, text: String) -> SubmitOutcome {
        // キューが空のときだけ直接送る（古いエントリを追い越さない）
        if self.state == ConnectionState::Connected
            && self.queue.is_empty()
            && self.drain_task.is_none()
            && let Some(sink) = &self.sink
        {
            match encode_new_item(&text).and_then(|json| sink.send_frame(json)) {
                Ok(()) => return SubmitOutcome::Sent,
                Err(e) => tracing::debug!("Live send failed, queueing: {}", e),
            }
        }

        let entry_id = self.queue.push(text);
        tracing::debug!(entry = entry_id, pending = self.queue.len(), "item queued");

        if self.state == ConnectionState::Disconnected {
            self.start_connection();
        }
        self.request_drain();
        SubmitOutcome::Queued
    }

    /// Single-flight: a request during a drain runs after it
    fn request_drain(&mut self) {
        if self.drain_task.is_some() {
            self.drain_pending = true;
            return;
        }
        if self.queue.is_empty() {
            return;
        }
        match (self.state, self.sink.clone()) {
            (ConnectionState::Connected, Some(sink)) => self.drain_over_connection(sink.as_ref()),
            _ => self.spawn_rest_drain(),
        }
    }

    fn after_drain(&mut self) {
        if self.drain_pending {
            self.drain_pending = false;
            self.request_drain();
        }
    }

    /// Hand every queued entry to the socket writer, oldest first
    fn drain_over_connection(&mut self, sink: &dyn FrameSink) {
        let mut sent = 0;
        while let Some(entry) = self.queue.front().cloned() {
            match encode_new_item(&entry.text).and_then(|json| sink.send_frame(json)) {
                Ok(()) => {
                    self.queue.remove(entry.id);
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!(pending = self.queue.len(), "Drain stopped: {}", e);
                    self.log("WARN", format!("drain stopped: {}", e));
                    break;
                }
            }
        }

        if sent > 0 {
            tracing::info!(sent, "Queued items sent over websocket");
            if self.queue.is_empty() {
                self.log("INFO", format!("send queue drained ({} item(s))", sent));
                self.notify(SyncNotice::QueueDrained);
            }
        }
    }

    /// Deliver a snapshot of the queue over REST.
    ///
    /// Stops at the first transient failure. A permanently rejected entry is
    /// dropped so it cannot hold back the entries behind it.
    fn spawn_rest_drain(&mut self) {
        let entries = self.queue.snapshot();
        let poster = Arc::clone(&self.poster);
        let events = self.events.clone();
        self.drain_task = Some(tokio::spawn(async move {
            for entry in entries {
                let event = match poster.post_item(&entry.text).await {
                    Ok(()) => Event::Delivered { entry_id: entry.id },
                    Err(error) if error.is_transient() => {
                        emit(&events, Event::DrainHalted { error });
                        return;
                    }
                    Err(error) => Event::Rejected {
                        entry_id: entry.id,
                        error,
                    },
                };
                if !emit(&events, event) {
                    return;
                }
            }
            emit(&events, Event::DrainFinished);
        }));
    }

    // ========================================
    // Reporting
    // ========================================

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            last_error: self.last_error.clone(),
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            self.state = state;
            self.notify(SyncNotice::Status(self.status()));
        }
    }

    fn notify(&self, notice: SyncNotice) {
        // 購読者がいなければ捨てる
        let _ = self.notices.send(notice);
    }

    fn log(&self, level: &str, message: impl Into<String>) {
        self.logs.push(level, message);
    }
}
