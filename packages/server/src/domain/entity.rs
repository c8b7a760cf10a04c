//! Core domain models for the clipboard relay.

use std::collections::VecDeque;

use serde::Serialize;

use super::value_object::{ItemId, ItemText, Timestamp};

/// Maximum number of items kept per room
pub const HISTORY_CAPACITY: usize = 100;

/// One clipboard snippet. Created once at ingress, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub text: ItemText,
    /// Server receipt time
    pub created_at: Timestamp,
}

impl Item {
    pub fn new(id: ItemId, text: ItemText, created_at: Timestamp) -> Self {
        Self {
            id,
            text,
            created_at,
        }
    }
}

/// Bounded per-room history, newest first.
///
/// Once `capacity` is exceeded the oldest item is evicted.
#[derive(Debug, Clone)]
pub struct History {
    items: VecDeque<Item>,
    capacity: usize,
}

impl History {
    /// Create an empty history holding at most [`HISTORY_CAPACITY`] items
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create an empty history with a custom capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `item` as the newest entry, returning the evicted item if any
    pub fn push_newest(&mut self, item: Item) -> Option<Item> {
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Newest `limit` items, newest first
    pub fn recent(&self, limit: usize) -> Vec<Item> {
        self.items.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
