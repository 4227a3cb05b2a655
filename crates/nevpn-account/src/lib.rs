//! # neVPN Account
//!
//! The local identity and session store behind the neVPN account page.
//!
//! ## Overview
//!
//! Accounts live entirely on the client. This crate provides:
//!
//! - **Registration and login**: passwords are digested before they are stored
//!   or compared; the plaintext never reaches storage
//! - **Sessions**: a single persisted pointer names the signed-in user
//! - **Favorites and subscriptions**: ordered, duplicate-free per-user lists
//! - **Auth-attempt notifications**: a notifier seam that never sees passwords
//!
//! ## Key Concepts
//!
//! - **User table**: one slot holding every account, keyed by lowercase email.
//!   Registering a taken email is rejected, never overwritten.
//! - **Session pointer**: a second slot with its own lifecycle. A pointer to a
//!   missing account reads as anonymous.
//! - **Corrupt data**: unreadable slots degrade to "no users" / "no session".
//! - **Concurrent writers**: user-table writes are conditional on the revision
//!   they were based on, and retried from a fresh read when stale.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nevpn_account::{IdentityConfig, IdentityService, SlotRepository};
//! use nevpn_account::store::SqliteStore;
//!
//! async fn example() {
//!     let config = IdentityConfig::default();
//!     let store = SqliteStore::open("account.db").unwrap();
//!     let service = IdentityService::new(SlotRepository::new(store, &config), config);
//!
//!     let user = service.register("Ann", "Ann@X.com", "p1").await.unwrap();
//!     assert_eq!(user.email.as_str(), "ann@x.com");
//!
//!     service.add_favorite("art-1").await.unwrap();
//!     service.logout().await.unwrap();
//!     assert!(service.current_user().await.unwrap().is_none());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `nevpn_account::core` - Core primitives (UserRecord, Email, digests)
//! - `nevpn_account::store` - Slot storage and SQLite

pub mod config;
pub mod error;
pub mod notify;
pub mod repository;
pub mod service;

// Re-export component crates
pub use nevpn_account_core as core;
pub use nevpn_account_store as store;

// Re-export main types for convenience
pub use config::IdentityConfig;
pub use error::{IdentityError, NotifyError, NotifyResult, Result};
pub use notify::{
    AuthEvent, AuthEventKind, AuthNotifier, AuthOutcome, ClientMeta, FailureReason, NoopNotifier,
    RecordingNotifier, TracingNotifier,
};
pub use repository::{IdentityRepository, SaveOutcome, SlotRepository, Snapshot};
pub use service::IdentityService;

// Re-export commonly used core types
pub use nevpn_account_core::{digest, Email, PasswordDigest, SessionPointer, SessionState, UserRecord};
