//! SQLite storage backend for notification state

use super::traits::{
    NotificationState, NotificationStateStore, OpenStore, StorageError, StorageResult,
    NOTIFIED_PREFERENCE,
};
use crate::account::UserId;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed notification state
///
/// State lives in a `global_preferences` table, one row per
/// (user, preference name), so the notification flag sits next to any other
/// global preference a deployment keeps. Thread-safe via an internal mutex
/// on the connection; `compare_and_set` runs in an IMMEDIATE transaction so
/// it also holds across processes sharing the file.
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS global_preferences (
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (user_id, name)
            );

            -- Concurrent readers while a writer holds the lock
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        // Another process may hold the write lock during its compare-and-set
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection mutex poisoned".to_string()))
    }

    fn read_state(conn: &Connection, user: UserId) -> StorageResult<NotificationState> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM global_preferences WHERE user_id = ?1 AND name = ?2",
                params![user_key(user)?, NOTIFIED_PREFERENCE],
                |row| row.get(0),
            )
            .optional()?;
        NotificationState::from_preference(value.as_deref())
    }

    fn write_state(conn: &Connection, user: UserId, state: NotificationState) -> StorageResult<()> {
        match state.as_preference() {
            Some(value) => {
                conn.execute(
                    "INSERT INTO global_preferences (user_id, name, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(user_id, name) DO UPDATE SET value = excluded.value",
                    params![user_key(user)?, NOTIFIED_PREFERENCE, value],
                )?;
            }
            None => {
                conn.execute(
                    "DELETE FROM global_preferences WHERE user_id = ?1 AND name = ?2",
                    params![user_key(user)?, NOTIFIED_PREFERENCE],
                )?;
            }
        }
        Ok(())
    }
}

/// SQLite integers are signed
fn user_key(user: UserId) -> StorageResult<i64> {
    i64::try_from(user.get())
        .map_err(|_| StorageError::InvalidState(format!("user id {} out of range", user)))
}

impl OpenStore for SqliteStateStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl NotificationStateStore for SqliteStateStore {
    fn get(&self, user: UserId) -> StorageResult<NotificationState> {
        let conn = self.lock()?;
        Self::read_state(&conn, user)
    }

    fn set(&self, user: UserId, state: NotificationState) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::write_state(&conn, user, state)
    }

    fn compare_and_set(
        &self,
        user: UserId,
        expected: NotificationState,
        new: NotificationState,
    ) -> StorageResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if Self::read_state(&tx, user)? != expected {
            return Ok(false);
        }
        Self::write_state(&tx, user, new)?;
        tx.commit()?;
        Ok(true)
    }
}
