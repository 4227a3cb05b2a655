//! SQLite implementation of the SlotStore trait.
//!
//! This is the primary storage backend for neVPN accounts. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{now_millis, Slot, SlotStore, WriteResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn current_revision(tx: &Transaction<'_>, name: &str) -> Result<Option<u64>> {
    let revision: Option<i64> = tx
        .query_row(
            "SELECT revision FROM slots WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    revision
        .map(|r| {
            u64::try_from(r)
                .map_err(|_| StoreError::InvalidData(format!("negative revision {} for slot {}", r, name)))
        })
        .transpose()
}

/// Next revision for `name`, past anything issued before, removed slots included.
fn next_revision(tx: &Transaction<'_>, name: &str) -> Result<u64> {
    let last: i64 = tx.query_row(
        "SELECT COALESCE(MAX(revision), 0) FROM (
            SELECT revision FROM slot_revisions WHERE name = ?1
            UNION ALL
            SELECT revision FROM slots WHERE name = ?1
         )",
        params![name],
        |row| row.get(0),
    )?;

    u64::try_from(last)
        .map(|r| r + 1)
        .map_err(|_| StoreError::InvalidData(format!("negative revision {} for slot {}", last, name)))
}

fn upsert(tx: &Transaction<'_>, name: &str, data: &str, revision: u64) -> Result<()> {
    tx.execute(
        "INSERT INTO slot_revisions (name, revision) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET revision = excluded.revision",
        params![name, revision as i64],
    )?;
    tx.execute(
        "INSERT INTO slots (name, data, revision, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(name) DO UPDATE SET
            data = excluded.data,
            revision = excluded.revision,
            updated_at = excluded.updated_at",
        params![name, data, revision as i64, now_millis()],
    )?;
    Ok(())
}

#[async_trait]
impl SlotStore for SqliteStore {
    async fn read(&self, name: &str) -> Result<Option<Slot>> {
        let name = name.to_string();

        self.run(move |conn| {
            let row: Option<(String, i64, i64)> = conn
                .query_row(
                    "SELECT data, revision, updated_at FROM slots WHERE name = ?1",
                    params![name],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            row.map(|(data, revision, updated_at)| {
                let revision = u64::try_from(revision).map_err(|_| {
                    StoreError::InvalidData(format!("negative revision {} for slot {}", revision, name))
                })?;
                Ok(Slot {
                    data,
                    revision,
                    updated_at,
                })
            })
            .transpose()
        })
        .await
    }

    async fn write(
        &self,
        name: &str,
        data: &str,
        expected_revision: Option<u64>,
    ) -> Result<WriteResult> {
        let name = name.to_string();
        let data = data.to_string();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let current = current_revision(&tx, &name)?;
            if current != expected_revision {
                tracing::debug!(slot = %name, ?current, ?expected_revision, "rejected stale slot write");
                return Ok(WriteResult::Stale { current });
            }

            let revision = next_revision(&tx, &name)?;
            upsert(&tx, &name, &data, revision)?;
            tx.commit()?;

            Ok(WriteResult::Written { revision })
        })
        .await
    }

    async fn overwrite(&self, name: &str, data: &str) -> Result<u64> {
        let name = name.to_string();
        let data = data.to_string();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let revision = next_revision(&tx, &name)?;
            upsert(&tx, &name, &data, revision)?;
            tx.commit()?;
            Ok(revision)
        })
        .await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let name = name.to_string();

        self.run(move |conn| {
            conn.execute("DELETE FROM slots WHERE name = ?1", params![name])?;
            Ok(())
        })
        .await
    }

    async fn slot_names(&self) -> Result<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM slots ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let store = SqliteStore::open_memory().unwrap();

        let result = store.write("users", r#"{"version":1}"#, None).await.unwrap();
        assert_eq!(result, WriteResult::Written { revision: 1 });

        let slot = store.read("users").await.unwrap().unwrap();
        assert_eq!(slot.data, r#"{"version":1}"#);
        assert_eq!(slot.revision, 1);
        assert!(slot.updated_at > 0);
    }

    #[tokio::test]
    async fn test_conditional_write_detects_stale_revision() {
        let store = SqliteStore::open_memory().unwrap();
        store.write("users", "a", None).await.unwrap();

        let r1 = store.write("users", "b", Some(1)).await.unwrap();
        assert_eq!(r1, WriteResult::Written { revision: 2 });

        let r2 = store.write("users", "c", Some(1)).await.unwrap();
        assert_eq!(r2, WriteResult::Stale { current: Some(2) });

        let r3 = store.write("users", "d", None).await.unwrap();
        assert_eq!(r3, WriteResult::Stale { current: Some(2) });

        assert_eq!(store.read("users").await.unwrap().unwrap().data, "b");
    }

    #[tokio::test]
    async fn test_overwrite_and_remove() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.overwrite("session", "a").await.unwrap(), 1);
        assert_eq!(store.overwrite("session", "b").await.unwrap(), 2);

        store.remove("session").await.unwrap();
        assert!(store.read("session").await.unwrap().is_none());

        // Removing twice is fine
        store.remove("session").await.unwrap();
        assert_eq!(store.overwrite("session", "c").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_removed_slot_keeps_revision_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.write("users", "ann", None).await.unwrap();
            store.remove("users").await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.read("users").await.unwrap().is_none());
        assert!(store.slot_names().await.unwrap().is_empty());

        let r1 = store.write("users", "bob", None).await.unwrap();
        assert_eq!(r1, WriteResult::Written { revision: 2 });
        let r2 = store.write("users", "ann-again", Some(1)).await.unwrap();
        assert_eq!(r2, WriteResult::Stale { current: Some(2) });
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.write("users", "persisted", None).await.unwrap();
            store.overwrite("session", "s").await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let slot = store.read("users").await.unwrap().unwrap();
        assert_eq!(slot.data, "persisted");
        assert_eq!(slot.revision, 1);
        assert_eq!(
            store.slot_names().await.unwrap(),
            vec!["session".to_string(), "users".to_string()]
        );
    }
}
