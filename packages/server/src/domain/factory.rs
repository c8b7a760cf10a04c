//! Domain factories for creating identifiers.

use super::{ConnectionId, ItemId, Timestamp};

/// Factory for generating ItemId instances.
///
/// Ids look like `<created_at millis>-<8 hex chars>`, so they sort roughly by
/// creation time while staying unique across processes.
pub struct ItemIdFactory;

impl ItemIdFactory {
    /// Generate a new ItemId for an item created at `created_at`.
    pub fn generate(created_at: Timestamp) -> ItemId {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        // 常に非空なので new() の検証を経由しない
        ItemId(format!("{}-{}", created_at.value(), &suffix[..8]))
    }
}

/// Factory for generating ConnectionId instances (UUID v4).
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId::new(uuid::Uuid::new_v4().to_string())
    }
}
