//! SQLite annotation backend
//!
//! Durable key-value storage behind the annotation store. One backend file is
//! shared by every document instance on the machine; isolation comes entirely
//! from the namespace prefix baked into each storage key.

use rusqlite::Connection;

use crate::config::Config;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema;

/// Durable backend for annotation entries
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (and if necessary initialize) the backend at the configured path
    ///
    /// Initialization is idempotent: an already-initialized database is
    /// opened as-is.
    pub fn open(config: &Config) -> StoreResult<Self> {
        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir).map_err(|source| {
                StoreError::CreateDirectory {
                    path: config.data_dir.clone(),
                    source,
                }
            })?;
        }

        let conn = Connection::open(config.sqlite_path())?;
        if schema::needs_init(&conn) {
            schema::init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory backend (useful for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert or replace one entry
    pub fn put(&self, storage_key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO annotations (storage_key, value) VALUES (?1, ?2)",
            [storage_key, value],
        )?;
        Ok(())
    }

    /// Read one entry
    pub fn get(&self, storage_key: &str) -> StoreResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM annotations WHERE storage_key = ?1")?;
        match stmt.query_row([storage_key], |row| row.get(0)) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete one entry (deleting a missing key is a no-op)
    pub fn delete(&self, storage_key: &str) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM annotations WHERE storage_key = ?1",
            [storage_key],
        )?;
        Ok(())
    }

    /// Scan every entry whose storage key starts with `prefix`
    ///
    /// Row order is whatever SQLite yields; callers must not depend on it.
    pub fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT storage_key, value FROM annotations WHERE storage_key LIKE ?1 ESCAPE '\\'")?;
        let rows = stmt.query_map([like_prefix(prefix)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Delete every entry whose storage key starts with `prefix`
    ///
    /// Enumerates the matching keys first, then deletes them one at a time.
    /// Best-effort batch delete, not a transactional guarantee: a failure
    /// partway through leaves the earlier deletes applied.
    pub fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let keys: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT storage_key FROM annotations WHERE storage_key LIKE ?1 ESCAPE '\\'")?;
            let rows = stmt.query_map([like_prefix(prefix)], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut deleted = 0;
        for key in &keys {
            self.conn
                .execute("DELETE FROM annotations WHERE storage_key = ?1", [key])?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// Build a LIKE pattern matching keys that start with `prefix`
///
/// LIKE metacharacters in the prefix are escaped so a namespace containing
/// `%` or `_` cannot widen the match.
fn like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if c == '%' || c == '_' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
