use crate::app_dirs::AppDirs;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The injected persistence collaborator: a small string key-value store.
/// The engine never touches disk directly; settings blobs, histories, the
/// best-record tables, and the letter-pair master all live behind this trait.
pub trait KvStore {
    /// Missing or unreadable keys read as `None`; callers recover with
    /// documented defaults rather than failing the session flow.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Vec<String>;
}

/// In-memory store for tests and `--ephemeral` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    map: BTreeMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }
}

/// Durable store backed by a single sqlite table.
#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (or create) the store at the default state-dir location.
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::store_path().unwrap_or_else(|| PathBuf::from("mnemo_store.db"));
        Self::open(&path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .ok()
            .flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut stmt = match self.conn.prepare("SELECT key FROM kv ORDER BY key") {
            Ok(stmt) => stmt,
            Err(_) => return Vec::new(),
        };
        let rows = stmt.query_map([], |row| row.get::<_, String>(0));
        match rows {
            Ok(iter) => iter.flatten().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &mut dyn KvStore) {
        assert_eq!(store.get("missing"), None);

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.set("a", "overwritten").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("overwritten"));

        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.keys(), vec!["b".to_string()]);

        // Removing an absent key is not an error
        store.remove("a").unwrap();
    }

    #[test]
    fn memory_store_contract() {
        let mut store = MemoryKvStore::new();
        exercise(&mut store);
    }

    #[test]
    fn sqlite_store_contract() {
        let mut store = SqliteKvStore::open_in_memory().unwrap();
        exercise(&mut store);
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let mut store = SqliteKvStore::open(&path).unwrap();
            store.set("global_settings", "{\"lang\":\"ja\"}").unwrap();
        }

        let store = SqliteKvStore::open(&path).unwrap();
        assert_eq!(
            store.get("global_settings").as_deref(),
            Some("{\"lang\":\"ja\"}")
        );
    }
}
