//! Identity repository: typed access to the users and session slots.
//!
//! The [`IdentityService`](crate::IdentityService) never touches raw slots.
//! It goes through [`IdentityRepository`], which owns the persisted format
//! and the "corrupt means empty" rule.

use std::sync::Arc;

use async_trait::async_trait;
use nevpn_account_core::{
    decode_session, decode_users, encode_session, encode_users, Email, SessionPointer, UserTable,
};
use nevpn_account_store::{SlotStore, WriteResult};

use crate::config::IdentityConfig;
use crate::error::Result;

/// A loaded value together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub value: T,
    /// Revision of the backing slot, `None` if the slot was absent.
    pub revision: Option<u64>,
}

/// Result of saving the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { revision: u64 },
    /// Someone else wrote the table since the snapshot was taken.
    Stale,
}

/// Persistence boundary for the identity service.
///
/// Implementations must treat unreadable persisted data as empty (users) or
/// absent (session), never as an error.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Load the full user table.
    async fn load_users(&self) -> Result<Snapshot<UserTable>>;

    /// Replace the full user table, if nobody wrote it since `base_revision`.
    async fn save_users(&self, table: &UserTable, base_revision: Option<u64>)
        -> Result<SaveOutcome>;

    /// Load the session pointer.
    async fn load_session(&self) -> Result<Option<SessionPointer>>;

    /// Point the session at `email`.
    async fn set_session(&self, email: &Email) -> Result<()>;

    /// Clear the session pointer. Idempotent.
    async fn clear_session(&self) -> Result<()>;
}

/// [`IdentityRepository`] over two named slots of a [`SlotStore`].
pub struct SlotRepository<S: SlotStore> {
    store: Arc<S>,
    users_slot: String,
    session_slot: String,
}

impl<S: SlotStore> SlotRepository<S> {
    /// Create a repository using the slot names from `config`.
    pub fn new(store: S, config: &IdentityConfig) -> Self {
        Self::with_shared(Arc::new(store), config)
    }

    /// Create a repository over a store that is also used elsewhere.
    pub fn with_shared(store: Arc<S>, config: &IdentityConfig) -> Self {
        Self {
            store,
            users_slot: config.users_slot.clone(),
            session_slot: config.session_slot.clone(),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn users_slot(&self) -> &str {
        &self.users_slot
    }

    pub fn session_slot(&self) -> &str {
        &self.session_slot
    }
}

#[async_trait]
impl<S: SlotStore> IdentityRepository for SlotRepository<S> {
    async fn load_users(&self) -> Result<Snapshot<UserTable>> {
        let Some(slot) = self.store.read(&self.users_slot).await? else {
            return Ok(Snapshot {
                value: UserTable::new(),
                revision: None,
            });
        };

        let value = match decode_users(&slot.data) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    slot = %self.users_slot,
                    revision = slot.revision,
                    error = %e,
                    "unreadable user table, treating as empty"
                );
                UserTable::new()
            }
        };

        // Keep the revision even when the content was unreadable, so the next
        // save replaces it instead of being rejected as stale.
        Ok(Snapshot {
            value,
            revision: Some(slot.revision),
        })
    }

    async fn save_users(
        &self,
        table: &UserTable,
        base_revision: Option<u64>,
    ) -> Result<SaveOutcome> {
        let data = encode_users(table)?;

        match self.store.write(&self.users_slot, &data, base_revision).await? {
            WriteResult::Written { revision } => {
                tracing::debug!(slot = %self.users_slot, revision, users = table.len(), "saved user table");
                Ok(SaveOutcome::Saved { revision })
            }
            WriteResult::Stale { current } => {
                tracing::warn!(
                    slot = %self.users_slot,
                    ?base_revision,
                    ?current,
                    "user table changed underneath us"
                );
                Ok(SaveOutcome::Stale)
            }
        }
    }

    async fn load_session(&self) -> Result<Option<SessionPointer>> {
        let Some(slot) = self.store.read(&self.session_slot).await? else {
            return Ok(None);
        };

        match decode_session(&slot.data) {
            Ok(pointer) => Ok(Some(pointer)),
            Err(e) => {
                tracing::warn!(
                    slot = %self.session_slot,
                    error = %e,
                    "unreadable session pointer, treating as anonymous"
                );
                Ok(None)
            }
        }
    }

    async fn set_session(&self, email: &Email) -> Result<()> {
        let data = encode_session(&SessionPointer::new(email.clone()))?;
        self.store.overwrite(&self.session_slot, &data).await?;
        Ok(())
    }

    async fn clear_session(&self) -> Result<()> {
        self.store.remove(&self.session_slot).await?;
        Ok(())
    }
}
