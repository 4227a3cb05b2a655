//! SlotStore trait: the abstract interface for slot persistence.
//!
//! This trait allows the account layer to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use crate::error::Result;

/// Data stored under a slot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Opaque UTF-8 payload.
    pub data: String,
    /// Starts at 1, increments on every successful write. Never reused.
    pub revision: u64,
    /// When the slot was last written (Unix ms).
    pub updated_at: i64,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// Data was written; the slot is now at `revision`.
    Written { revision: u64 },
    /// The caller's expected revision no longer matches. Nothing was written.
    Stale {
        /// Revision actually stored, `None` if the slot is absent.
        current: Option<u64>,
    },
}

/// The SlotStore trait: async interface for named-slot persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Whole-value writes**: there is no partial update. Callers read, modify
///   and write back the full payload.
/// - **Optimistic concurrency**: `write` succeeds only if the stored revision
///   equals `expected_revision` (`None` = slot must be absent). Two writers
///   racing from the same base revision cannot both succeed.
/// - **Removal**: a removed slot reads as absent and a later write must
///   expect `None`, but its revision counter is kept. Revisions for a name
///   only ever increase, so a snapshot taken before the removal stays stale.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a slot. Returns `None` if absent.
    async fn read(&self, name: &str) -> Result<Option<Slot>>;

    /// Write a slot if its stored revision equals `expected_revision`.
    async fn write(
        &self,
        name: &str,
        data: &str,
        expected_revision: Option<u64>,
    ) -> Result<WriteResult>;

    /// Write a slot regardless of its revision. Returns the new revision.
    async fn overwrite(&self, name: &str, data: &str) -> Result<u64>;

    /// Remove a slot. Removing an absent slot is not an error.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Names of all stored slots, sorted.
    async fn slot_names(&self) -> Result<Vec<String>>;
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
