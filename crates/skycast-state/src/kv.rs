//! Persistent key-value storage for preferences and favourites.
//!
//! `SqliteKvStore` is the on-disk store; `MemoryStore` backs tests and can be
//! told to fail reads or writes.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use skycast_core::{PersistenceError, RusqliteErrorExt};

/// Synchronous string key-value storage.
///
/// Every method is fallible; callers decide how to degrade.
pub trait KeyValueStore: Send + Sync {
    /// Read `key`, `Ok(None)` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// SQLite-backed store with a single `kv` table.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or the schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        }
        let conn =
            Connection::open(path).map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    /// Fails if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn =
            Connection::open_in_memory().map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| PersistenceError::OpenFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into_read_error(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
            .map_err(|e| e.into_write_error(key))
    }
}

/// In-memory store with optional fault injection.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    fail_reads: RwLock<bool>,
    fail_writes: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `key` with `value` without going through `set`.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.write().insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.write() = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write() = fail;
    }

    /// Raw stored value, ignoring injected faults.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if *self.fail_reads.read() {
            return Err(PersistenceError::ReadFailed {
                key: key.to_string(),
                message: "injected read failure".to_string(),
            });
        }
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if *self.fail_writes.read() {
            return Err(PersistenceError::WriteFailed {
                key: key.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
