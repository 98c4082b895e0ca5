//! Database connection and namespaced key-value access
//!
//! Each namespace plays the role of a bucket: a wallet lives in
//! `wallet_<name>`, shared metadata in its own namespace.

use crate::{migrations, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) and migrate
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        tracing::debug!("Opened wallet database at {}", path.as_ref().display());
        Self::init(conn)
    }

    /// In-memory database, for tests and ephemeral wallets
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Get connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin transaction
    pub fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

/// Insert or replace a value
pub fn put(conn: &Connection, namespace: &str, key: &str, value: &[u8]) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![namespace, key, value, chrono::Utc::now().timestamp()],
    )?;
    Ok(())
}

/// Read a value
pub fn get(conn: &Connection, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Remove one value, returning whether it existed
pub fn remove(conn: &Connection, namespace: &str, key: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
        params![namespace, key],
    )?;
    Ok(removed > 0)
}

/// Drop a whole namespace, returning the number of values removed
pub fn drop_namespace(conn: &Connection, namespace: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM kv WHERE namespace = ?1", params![namespace])?;
    Ok(removed)
}

/// Namespaces starting with `prefix`, in name order
pub fn list_namespaces(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT namespace FROM kv WHERE substr(namespace, 1, ?2) = ?1 ORDER BY namespace",
    )?;
    let rows = stmt.query_map(params![prefix, prefix.chars().count() as i64], |row| {
        row.get::<_, String>(0)
    })?;

    let mut namespaces = Vec::new();
    for row in rows {
        namespaces.push(row?);
    }
    Ok(namespaces)
}
