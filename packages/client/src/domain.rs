//! Client-side state: connection status, item cache and outbound send queue.
//!
//! Everything here is plain data owned by the sync actor, so it is tested
//! without any I/O.

use std::{collections::VecDeque, fmt};

use copimon_server::infrastructure::dto::websocket::ItemDto;
use serde::Serialize;

/// Lifecycle of the single logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// `{state, lastError}` as reported to collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    #[serde(rename = "lastError")]
    pub last_error: Option<String>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_error: None,
        }
    }
}

/// Most recent items of the room, newest first
#[derive(Debug, Clone)]
pub struct ItemCache {
    items: VecDeque<ItemDto>,
    capacity: usize,
}

impl ItemCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the whole cache with a snapshot (already newest first)
    pub fn replace(&mut self, items: Vec<ItemDto>) {
        self.items = items.into_iter().take(self.capacity).collect();
    }

    /// Record a new item as the newest entry.
    ///
    /// Returns `false` when an item with the same id is already cached.
    pub fn prepend(&mut self, item: ItemDto) -> bool {
        if self.items.iter().any(|cached| cached.id == item.id) {
            return false;
        }
        self.items.push_front(item);
        self.items.truncate(self.capacity);
        true
    }

    pub fn items(&self) -> Vec<ItemDto> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One text waiting to be delivered, tagged so it can be removed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: u64,
    pub text: String,
}

/// FIFO of texts not yet handed to the server
#[derive(Debug, Default)]
pub struct SendQueue {
    entries: VecDeque<QueueEntry>,
    next_id: u64,
}

impl SendQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text`, returning the entry tag
    pub fn push(&mut self, text: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(QueueEntry { id, text });
        id
    }

    pub fn front(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// Remove the entry tagged `id`. Unknown tags are ignored.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => self.entries.remove(index).is_some(),
            None => false,
        }
    }

    /// Copy of the queue in FIFO order
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
