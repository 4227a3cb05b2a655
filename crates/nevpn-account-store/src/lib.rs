//! # neVPN Account Store
//!
//! Storage abstraction for neVPN accounts. Persists named text slots, the
//! way a browser profile keeps values under `localStorage` keys.
//!
//! ## Overview
//!
//! The account layer keeps exactly two slots: the serialized user table and
//! the serialized session pointer. This crate knows nothing about their
//! contents; it stores opaque UTF-8 strings behind the [`SlotStore`] trait.
//! The primary implementation is [`SqliteStore`], with [`MemoryStore`] for
//! testing.
//!
//! ## Key Types
//!
//! - [`SlotStore`] - The async trait for all slot operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Slot`] - Stored data with its revision
//! - [`WriteResult`] - Result of a conditional write
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nevpn_account_store::{SqliteStore, SlotStore, WriteResult};
//!
//! async fn example() {
//!     let store = SqliteStore::open("account.db").unwrap();
//!
//!     // First write expects the slot to be absent
//!     let result = store.write("nevpn-users", "{}", None).await.unwrap();
//!     assert_eq!(result, WriteResult::Written { revision: 1 });
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Revisions**: every successful write bumps the slot revision by one
//! - **Conditional writes**: a write naming a stale revision returns `Stale`
//!   instead of clobbering a concurrent writer
//! - **Forced writes**: `overwrite` ignores revisions, for last-writer-wins slots

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Slot, SlotStore, WriteResult};
