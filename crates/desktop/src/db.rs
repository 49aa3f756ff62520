use fishtracker_core::{FishTrackerError, StorageBackend};
use rusqlite::{params, Connection};
use std::path::Path;

/// Open (or create) the database at `path` and make sure tables exist
pub fn open_connection(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    init_tables(&conn)?;
    Ok(conn)
}

fn init_tables(conn: &Connection) -> rusqlite::Result<()> {
    // One row per storage key, values are JSON documents
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn storage_err(e: rusqlite::Error) -> FishTrackerError {
    FishTrackerError::Storage(e.to_string())
}

/// Key/value storage on top of SQLite, mirroring browser local storage
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> fishtracker_core::Result<Self> {
        let conn = open_connection(path).map_err(storage_err)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> fishtracker_core::Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        init_tables(&conn).map_err(storage_err)?;
        Ok(Self { conn })
    }
}

impl StorageBackend for SqliteBackend {
    fn get_item(&self, key: &str) -> fishtracker_core::Result<Option<String>> {
        let result: rusqlite::Result<String> = self.conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> fishtracker_core::Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> fishtracker_core::Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(storage_err)?;
        Ok(())
    }
}
