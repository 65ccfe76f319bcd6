pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

use crate::store::StorageAdapter;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Key-value persistence for the store, one JSON document per collection.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            conn: init_db(path)?,
        })
    }
}

impl StorageAdapter for SqliteStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        queries::get_value(&self.conn, key).with_context(|| format!("failed to load {key}"))
    }

    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        queries::set_value(&self.conn, key, value).with_context(|| format!("failed to save {key}"))
    }
}
