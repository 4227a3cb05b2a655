//! User records and the user table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::digest::PasswordDigest;
use crate::email::Email;
use crate::list::UniqueList;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Normalized email, also the table key.
    pub email: Email,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Digest of the password. The password itself is never stored.
    pub password_digest: PasswordDigest,
    /// Article ids, in first-insertion order.
    #[serde(default)]
    pub favorites: UniqueList,
    /// Contact ids, in first-insertion order.
    #[serde(default)]
    pub subscriptions: UniqueList,
}

impl UserRecord {
    /// Create a record with empty favorites and subscriptions.
    ///
    /// A blank name is stored as `None`.
    pub fn new(email: Email, name: Option<&str>, password_digest: PasswordDigest) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Self {
            email,
            name,
            password_digest,
            favorites: UniqueList::new(),
            subscriptions: UniqueList::new(),
        }
    }

    /// Label shown in the site header: display name, falling back to email.
    pub fn display_label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.email.as_str())
    }
}

/// Result of inserting a record into a [`UserTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record with this email already exists; nothing changed.
    AlreadyExists,
}

/// Mutable view of one record's lists.
///
/// Handed out by [`UserTable::lists_mut`] so that the email, which doubles
/// as the table key, stays untouched.
#[derive(Debug)]
pub struct RecordLists<'a> {
    pub favorites: &'a mut UniqueList,
    pub subscriptions: &'a mut UniqueList,
}

/// Mapping from normalized email to user record.
///
/// The key of every entry equals its record's `email`. Inserting an existing
/// key is rejected rather than overwriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTable {
    users: BTreeMap<Email, UserRecord>,
}

impl UserTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record keyed by its email.
    pub fn insert(&mut self, record: UserRecord) -> InsertResult {
        if self.users.contains_key(&record.email) {
            return InsertResult::AlreadyExists;
        }
        self.users.insert(record.email.clone(), record);
        InsertResult::Inserted
    }

    pub fn get(&self, email: &Email) -> Option<&UserRecord> {
        self.users.get(email)
    }

    /// Mutable access to a record's favorites and subscriptions.
    pub fn lists_mut(&mut self, email: &Email) -> Option<RecordLists<'_>> {
        self.users.get_mut(email).map(|record| RecordLists {
            favorites: &mut record.favorites,
            subscriptions: &mut record.subscriptions,
        })
    }

    pub fn contains(&self, email: &Email) -> bool {
        self.users.contains_key(email)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Email, &UserRecord)> {
        self.users.iter()
    }

    pub(crate) fn from_map(users: BTreeMap<Email, UserRecord>) -> Self {
        Self { users }
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<Email, UserRecord> {
        &self.users
    }
}
