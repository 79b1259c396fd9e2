//! Storage backends for notification state
//!
//! Notification state is kept through the `NotificationStateStore` trait.
//! The primary implementation is `SqliteStateStore` for persistent storage;
//! `InMemoryStateStore` serves tests and dry runs.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStateStore;
pub use sqlite::SqliteStateStore;
pub use traits::{NotificationState, NotificationStateStore, OpenStore, StorageError, StorageResult, NOTIFIED_PREFERENCE};
