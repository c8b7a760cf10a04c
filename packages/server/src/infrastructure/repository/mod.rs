//! ItemRepository implementations.
//!
//! - `sqlite`: durable store used by the server binary
//! - `inmemory`: volatile store for tests and throwaway runs

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryItemRepository;
pub use sqlite::SqliteItemRepository;
