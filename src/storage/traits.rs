//! Storage trait definitions

use crate::account::UserId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Name of the global preference that backs the notification state
pub const NOTIFIED_PREFERENCE: &str = "twl-notified";

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid stored state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Whether a user has been told about their eligibility
///
/// Only moves forward: `Unset -> No -> Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    /// Never evaluated
    #[default]
    Unset,
    /// Evaluated, not notified yet
    No,
    /// Notification sent
    Yes,
}

impl NotificationState {
    /// The stored preference value; `None` means no record.
    pub fn as_preference(&self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::No => Some("no"),
            Self::Yes => Some("yes"),
        }
    }

    /// Parse a stored preference value.
    pub fn from_preference(value: Option<&str>) -> StorageResult<Self> {
        match value {
            None => Ok(Self::Unset),
            Some("no") => Ok(Self::No),
            Some("yes") => Ok(Self::Yes),
            Some(other) => Err(StorageError::InvalidState(other.to_string())),
        }
    }
}

impl std::fmt::Display for NotificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_preference().unwrap_or("unset"))
    }
}

impl std::str::FromStr for NotificationState {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unset" => Ok(Self::Unset),
            other => Self::from_preference(Some(other)),
        }
    }
}

/// Per-user notification state storage
///
/// Implementations must be thread-safe (Send + Sync) so evaluations for
/// different users can run concurrently. Failures are returned, never
/// retried.
pub trait NotificationStateStore: Send + Sync {
    /// Current state; `Unset` when there is no record
    fn get(&self, user: UserId) -> StorageResult<NotificationState>;

    /// Overwrite the state. Setting `Unset` removes the record.
    fn set(&self, user: UserId, state: NotificationState) -> StorageResult<()>;

    /// Atomically replace `expected` with `new`.
    ///
    /// Returns `false` and writes nothing when the current state differs.
    fn compare_and_set(
        &self,
        user: UserId,
        expected: NotificationState,
        new: NotificationState,
    ) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: NotificationStateStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
