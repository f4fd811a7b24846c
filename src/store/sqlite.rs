//! SQLite-backed cache store.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use super::CacheStore;
use crate::entry::CacheEntry;

/// Persistent cache store backed by SQLite.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS partitions (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS entries (
    partition TEXT NOT NULL,
    key TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers BLOB NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (partition, key)
);

CREATE INDEX IF NOT EXISTS idx_entries_partition ON entries(partition);
"#;

impl SqliteStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    Self::open_at(&path)
  }

  /// Open the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open a non-persistent store, useful for tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("edgecache").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

impl CacheStore for SqliteStore {
  fn open(&self, partition: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO partitions (name) VALUES (?)",
        params![partition],
      )
      .map_err(|e| eyre!("Failed to open partition {}: {}", partition, e))?;

    Ok(())
  }

  fn get(&self, partition: &str, key: &str) -> Result<Option<CacheEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT status, headers, body, cached_at FROM entries
         WHERE partition = ? AND key = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(u16, Vec<u8>, Vec<u8>, String)> = stmt
      .query_row(params![partition, key], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .optional()
      .map_err(|e| eyre!("Failed to read entry: {}", e))?;

    match row {
      Some((status, headers, body, cached_at_str)) => {
        let headers = serde_json::from_slice(&headers)
          .map_err(|e| eyre!("Failed to deserialize entry headers: {}", e))?;
        let cached_at = parse_datetime(&cached_at_str)?;

        Ok(Some(CacheEntry {
          status,
          headers,
          body,
          cached_at,
        }))
      }
      None => Ok(None),
    }
  }

  fn put(&self, partition: &str, key: &str, entry: &CacheEntry) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let headers = serde_json::to_vec(&entry.headers)
      .map_err(|e| eyre!("Failed to serialize entry headers: {}", e))?;

    // Partition row and entry row land together or not at all
    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let result = conn
      .execute(
        "INSERT OR IGNORE INTO partitions (name) VALUES (?)",
        params![partition],
      )
      .and_then(|_| {
        conn.execute(
          "INSERT OR REPLACE INTO entries (partition, key, status, headers, body, cached_at)
           VALUES (?, ?, ?, ?, ?, ?)",
          params![
            partition,
            key,
            entry.status,
            headers,
            entry.body,
            entry.cached_at.to_rfc3339()
          ],
        )
      });

    if let Err(e) = result {
      let _ = conn.execute("ROLLBACK", []);
      return Err(eyre!("Failed to store entry: {}", e));
    }

    conn
      .execute("COMMIT", [])
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn delete(&self, partition: &str, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM entries WHERE partition = ? AND key = ?",
        params![partition, key],
      )
      .map_err(|e| eyre!("Failed to delete entry: {}", e))?;

    Ok(())
  }

  fn delete_partition(&self, partition: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let result = conn
      .execute("DELETE FROM entries WHERE partition = ?", params![partition])
      .and_then(|_| {
        conn.execute(
          "DELETE FROM partitions WHERE name = ?",
          params![partition],
        )
      });

    if let Err(e) = result {
      let _ = conn.execute("ROLLBACK", []);
      return Err(eyre!("Failed to delete partition {}: {}", partition, e));
    }

    conn
      .execute("COMMIT", [])
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn list_partitions(&self) -> Result<BTreeSet<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM partitions")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to list partitions: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }
}

/// Parse an RFC 3339 timestamp stored by `put`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
