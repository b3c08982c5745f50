/// Database connection handling and schema setup
use std::sync::Mutex;

use anyhow::Result;
use rusqlite::Connection;

use crate::logger::{ self, LogTag };

/// Shared handle to the SQLite database
///
/// rusqlite connections are not Sync, so all access goes through a mutex.
/// Statements are short-lived; the lock is never held across an await.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        logger::info(LogTag::Database, &format!("Opened database at {}", path));
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let database = Self { conn: Mutex::new(conn) };
        database.init_schema()?;
        Ok(database)
    }

    /// Create tables if they don't exist yet
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rooms (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL DEFAULT '',
                vertices    TEXT NOT NULL DEFAULT '[]',
                template_id TEXT
            );
            CREATE TABLE IF NOT EXISTS items (
                seq               INTEGER PRIMARY KEY AUTOINCREMENT,
                id                TEXT NOT NULL,
                room_id           TEXT NOT NULL,
                name              TEXT NOT NULL DEFAULT '',
                quantity          INTEGER NOT NULL DEFAULT 0,
                claimed_by        TEXT NOT NULL DEFAULT '',
                visible_in_editor INTEGER NOT NULL DEFAULT 0,
                width             REAL NOT NULL DEFAULT 0,
                length            REAL NOT NULL DEFAULT 0,
                height            REAL NOT NULL DEFAULT 0,
                pos_x             REAL NOT NULL DEFAULT 0,
                pos_y             REAL NOT NULL DEFAULT 0,
                rotation          REAL NOT NULL DEFAULT 0,
                locked            INTEGER NOT NULL DEFAULT 0,
                z_index           REAL NOT NULL DEFAULT 0,
                UNIQUE(room_id, id)
            );",
        )?;
        Ok(())
    }
}
