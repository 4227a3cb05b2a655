//! In-memory implementation of the SlotStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::traits::{now_millis, Slot, SlotStore, WriteResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    /// Highest revision ever issued per name. Survives `remove`.
    revisions: HashMap<String, u64>,
}

impl Inner {
    fn put(&mut self, name: &str, data: &str) -> u64 {
        let last = self.revisions.entry(name.to_string()).or_insert(0);
        *last += 1;
        let revision = *last;
        self.slots.insert(
            name.to_string(),
            Slot {
                data: data.to_string(),
                revision,
                updated_at: now_millis(),
            },
        );
        revision
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn read(&self, name: &str) -> Result<Option<Slot>> {
        Ok(self.read_lock()?.slots.get(name).cloned())
    }

    async fn write(
        &self,
        name: &str,
        data: &str,
        expected_revision: Option<u64>,
    ) -> Result<WriteResult> {
        let mut inner = self.write_lock()?;

        let current = inner.slots.get(name).map(|s| s.revision);
        if current != expected_revision {
            return Ok(WriteResult::Stale { current });
        }

        let revision = inner.put(name, data);
        Ok(WriteResult::Written { revision })
    }

    async fn overwrite(&self, name: &str, data: &str) -> Result<u64> {
        Ok(self.write_lock()?.put(name, data))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.write_lock()?.slots.remove(name);
        Ok(())
    }

    async fn slot_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.read_lock()?.slots.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
