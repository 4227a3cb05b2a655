//! # neVPN Account Core
//!
//! Pure primitives for the local account store: password digests, normalized
//! emails, user records, and the versioned persisted schema.
//!
//! This crate contains no I/O and no storage. Everything here is plain
//! computation over values that the store and the identity service move around.
//!
//! ## Key Types
//!
//! - [`PasswordDigest`] - SHA-256 fingerprint of a password, stored instead of the secret
//! - [`Email`] - Lowercase-normalized email, the primary key of the user table
//! - [`UserRecord`] - A registered account with its favorites and subscriptions
//! - [`UserTable`] - The full email -> record mapping
//! - [`SessionPointer`] - Names the currently authenticated user
//!
//! ## Persisted Format
//!
//! Both persisted slots are UTF-8 JSON with an explicit schema version.
//! See the [`schema`] module.

pub mod digest;
pub mod email;
pub mod error;
pub mod list;
pub mod record;
pub mod schema;
pub mod session;

pub use digest::{digest, PasswordDigest};
pub use email::Email;
pub use error::{CoreError, Result};
pub use list::UniqueList;
pub use record::{InsertResult, RecordLists, UserRecord, UserTable};
pub use schema::{decode_session, decode_users, encode_session, encode_users, SCHEMA_VERSION};
pub use session::{SessionPointer, SessionState};
