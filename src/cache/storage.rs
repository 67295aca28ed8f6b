//! Cache storage trait and SQLite implementation.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};

/// Trait for cache storage backends.
///
/// Backends store opaque bytes and are responsible for their own expiry.
#[async_trait]
pub trait CacheStorage: Send + Sync {
  /// Short backend name for log output.
  fn name(&self) -> &'static str;

  /// Whether this backend (or one of its tiers) outlives the process.
  fn is_shared(&self) -> bool {
    false
  }

  /// Get the value stored under `key`, or `None` on a miss or expired entry.
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

  /// Store `value` under `key`, overwriting any previous value.
  async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// Format used for timestamps, matching SQLite's `datetime('now')`.
const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-based cache storage. Acts as the durable shared tier.
pub struct SqliteStorage {
  conn: Arc<Mutex<Connection>>,
  ttl: Option<Duration>,
}

impl SqliteStorage {
  /// Open (or create) a cache database at `path`.
  pub fn open(path: &Path, ttl: Option<Duration>) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        Error::CacheUnavailable(format!("Failed to create cache directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      Error::CacheUnavailable(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn, ttl)
  }

  /// Open a private in-memory database.
  #[allow(dead_code)]
  pub fn open_in_memory(ttl: Option<Duration>) -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| Error::CacheUnavailable(format!("Failed to open in-memory cache: {}", e)))?;
    Self::from_connection(conn, ttl)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("pokecache").join("cache.db"))
  }

  fn from_connection(conn: Connection, ttl: Option<Duration>) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| Error::CacheUnavailable(format!("Failed to run cache migrations: {}", e)))?;

    let purged = conn
      .execute(PURGE_EXPIRED, [])
      .map_err(|e| Error::CacheUnavailable(format!("Failed to purge expired entries: {}", e)))?;
    if purged > 0 {
      tracing::debug!(purged, "Purged expired cache entries");
    }

    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
      ttl,
    })
  }

  /// Run a closure against the connection on the blocking thread pool.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || {
      let conn = conn
        .lock()
        .map_err(|e| Error::CacheUnavailable(format!("Lock poisoned: {}", e)))?;
      f(&conn).map_err(|e| Error::CacheUnavailable(e.to_string()))
    })
    .await
    .map_err(|e| Error::CacheUnavailable(format!("Cache task failed: {}", e)))?
  }

  fn expires_at(&self) -> Option<String> {
    let ttl = chrono::Duration::from_std(self.ttl?).ok()?;
    Utc::now()
      .checked_add_signed(ttl)
      .map(|at| at.format(SQLITE_DATETIME).to_string())
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    expires_at TEXT,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_expires
    ON cache_entries(expires_at);
"#;

const PURGE_EXPIRED: &str =
  "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= datetime('now')";

#[async_trait]
impl CacheStorage for SqliteStorage {
  fn name(&self) -> &'static str {
    "sqlite"
  }

  fn is_shared(&self) -> bool {
    true
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let key = key.to_string();
    self
      .with_conn(move |conn| {
        let value: Option<Vec<u8>> = conn
          .query_row(
            "SELECT value FROM cache_entries
             WHERE key = ? AND (expires_at IS NULL OR expires_at > datetime('now'))",
            params![key],
            |row| row.get(0),
          )
          .optional()?;

        if value.is_none() {
          // Drop the row if it is only there because it expired
          conn.execute(
            "DELETE FROM cache_entries
             WHERE key = ? AND expires_at IS NOT NULL AND expires_at <= datetime('now')",
            params![key],
          )?;
        }

        Ok(value)
      })
      .await
  }

  async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
    let key = key.to_string();
    let expires_at = self.expires_at();
    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO cache_entries (key, value, expires_at, cached_at)
           VALUES (?, ?, ?, datetime('now'))",
          params![key, value, expires_at],
        )?;
        Ok(())
      })
      .await
  }
}
